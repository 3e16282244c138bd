mod lexer;
mod reader;
pub mod traits;
mod writer;

use std::path::PathBuf;

use crate::acm::hmm::Hmm;
use crate::error::AcModelError;
use crate::types::Macro;

pub use traits::{ModelCodec, ParsedModel};

/// HTK-ASCII master macro files (`macros`, `hmmdefs`, single-HMM protos).
#[derive(Debug, Clone, Copy, Default)]
pub struct HtkAsciiCodec;

impl HtkAsciiCodec {
    /// Parses in-memory text; `source_name` only shows up in error messages.
    pub fn parse_str(&self, text: &str, source_name: &str) -> Result<ParsedModel, AcModelError> {
        reader::parse_document(text, source_name)
    }
}

impl ModelCodec for HtkAsciiCodec {
    fn parse(&self, paths: &[PathBuf]) -> Result<ParsedModel, AcModelError> {
        let mut model = ParsedModel::default();
        for path in paths {
            let text = std::fs::read_to_string(path)
                .map_err(|e| AcModelError::io("read model file", e))?;
            let parsed = self.parse_str(&text, &path.display().to_string())?;
            for m in parsed.macros {
                // `macros` and `hmmdefs` usually both repeat the same ~o header.
                if matches!(m, Macro::Options(_)) && model.macros.contains(&m) {
                    continue;
                }
                model.macros.push(m);
            }
            model.hmms.extend(parsed.hmms);
        }
        Ok(model)
    }

    fn serialize(&self, macros: &[Macro], hmms: &[Hmm]) -> String {
        writer::HtkDocument { macros, hmms }.to_string()
    }
}
