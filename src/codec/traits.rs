use std::path::PathBuf;

use crate::acm::hmm::Hmm;
use crate::error::AcModelError;
use crate::types::Macro;

/// Raw content of one or more model files, before macro resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedModel {
    pub macros: Vec<Macro>,
    pub hmms: Vec<Hmm>,
}

/// Reads and writes the textual model format.
pub trait ModelCodec: Send + Sync {
    fn parse(&self, paths: &[PathBuf]) -> Result<ParsedModel, AcModelError>;

    /// Must accept fully inlined HMMs with no macro references left.
    fn serialize(&self, macros: &[Macro], hmms: &[Hmm]) -> String;
}
