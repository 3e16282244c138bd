use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcModelError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{source_name}:{line}: {message}")]
    Format {
        source_name: String,
        line: usize,
        message: String,
    },
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{count} HMMs are named '{name}'")]
    Ambiguous { name: String, count: usize },
    #[error("an HMM named '{name}' already exists")]
    DuplicateName { name: String },
    #[error("HMM '{name}' is incomplete: {missing}")]
    Incomplete { name: String, missing: &'static str },
    #[error("acoustic feature mismatch: {field} is {ours} here but {theirs} in the other model")]
    TypeMismatch {
        field: &'static str,
        ours: String,
        theirs: String,
    },
    #[error("unresolved {kind} macro '{name}'")]
    UnresolvedMacro { kind: &'static str, name: String },
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
}

impl AcModelError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn format(
        source_name: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Format {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn unresolved(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnresolvedMacro {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn dimension(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }
}
