use serde::Serialize;

/// One Gaussian component of a stream (diagonal covariance).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mixture {
    /// `None` when the stream holds a single unweighted pdf.
    pub weight: Option<f64>,
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub gconst: f64,
}

impl Mixture {
    /// Builds an unweighted pdf and precomputes its gconst.
    pub fn gaussian(mean: Vec<f64>, variance: Vec<f64>) -> Self {
        let gconst = gconst(&variance);
        Self {
            weight: None,
            mean,
            variance,
            gconst,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

/// `n * ln(2π) + Σ ln(σ²_i)`, the log normalisation term HTK stores as `<GCONST>`.
pub fn gconst(variance: &[f64]) -> f64 {
    let log_two_pi = (2.0 * std::f64::consts::PI).ln();
    variance.len() as f64 * log_two_pi + variance.iter().map(|v| v.ln()).sum::<f64>()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Stream {
    pub mixtures: Vec<Mixture>,
}

impl Stream {
    pub fn new(mixtures: Vec<Mixture>) -> Self {
        Self { mixtures }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct State {
    pub streams: Vec<Stream>,
    /// Stream weights (`<SWEIGHTS>`), one entry per stream.
    pub weights: Option<Vec<f64>>,
}

impl State {
    pub fn single_stream(mixtures: Vec<Mixture>) -> Self {
        Self {
            streams: vec![Stream::new(mixtures)],
            weights: None,
        }
    }
}

/// A state either defined inline or shared through a named `~s` macro.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StateRef {
    Inline(State),
    Macro(String),
}

impl StateRef {
    pub fn as_inline(&self) -> Option<&State> {
        match self {
            Self::Inline(state) => Some(state),
            Self::Macro(_) => None,
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Self::Macro(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HmmState {
    /// HTK ordinal; emitting states start at 2.
    pub index: usize,
    pub state: StateRef,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Transition {
    pub matrix: Vec<Vec<f64>>,
}

impl Transition {
    pub fn new(matrix: Vec<Vec<f64>>) -> Self {
        Self { matrix }
    }

    pub fn dim(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_square(&self) -> bool {
        self.matrix.iter().all(|row| row.len() == self.matrix.len())
    }

    /// Every row but the absorbing last one sums to 1 within `tolerance`.
    pub fn is_row_stochastic(&self, tolerance: f64) -> bool {
        let last = self.matrix.len().saturating_sub(1);
        self.matrix[..last]
            .iter()
            .all(|row| (row.iter().sum::<f64>() - 1.0).abs() <= tolerance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransitionRef {
    Inline(Transition),
    Macro(String),
}

impl TransitionRef {
    pub fn as_inline(&self) -> Option<&Transition> {
        match self {
            Self::Inline(transition) => Some(transition),
            Self::Macro(_) => None,
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Self::Macro(_))
    }
}

/// Global `~o` options shared by every HMM of a model.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GlobalOptions {
    pub stream_info: Option<Vec<usize>>,
    pub vec_size: Option<usize>,
    /// Acoustic feature kind, e.g. `MFCC_0_D_A`.
    pub parameter_kind: Option<String>,
    /// e.g. `DIAGC`.
    pub covariance_kind: Option<String>,
    /// e.g. `NULLD`.
    pub duration_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Macro {
    Options(GlobalOptions),
    State { name: String, definition: State },
    Transition { name: String, definition: Transition },
    /// Variance vector macro (`~v`), e.g. `varFloor1`.
    Variance { name: String, values: Vec<f64> },
}

impl Macro {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Options(_) => None,
            Self::State { name, .. }
            | Self::Transition { name, .. }
            | Self::Variance { name, .. } => Some(name),
        }
    }

    /// State and transition macros are the only ones HMMs reference by name.
    pub fn is_resolvable(&self) -> bool {
        matches!(self, Self::State { .. } | Self::Transition { .. })
    }
}

/// Counters returned by `AcModel::merge_model`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MergeReport {
    /// HMMs only present in the other model.
    pub appended: usize,
    /// Shared HMMs combined with `gamma`.
    pub interpolated: usize,
    /// Original HMMs left as they were.
    pub kept: usize,
    /// Shared HMMs replaced by the other model's version.
    pub changed: usize,
    /// Shared HMMs whose interpolation failed, with the reason. Each is also counted in `kept`.
    pub failures: Vec<MergeFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeFailure {
    pub hmm: String,
    pub reason: String,
}
