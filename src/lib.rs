pub mod acm;
pub mod codec;
pub mod config;
pub mod error;
pub mod interpolation;
pub mod types;

pub use acm::{AcModel, Hmm, PhoneMap};
pub use codec::{HtkAsciiCodec, ModelCodec, ParsedModel};
pub use config::ProtoConfig;
pub use error::AcModelError;
pub use types::{
    GlobalOptions, HmmState, Macro, MergeFailure, MergeReport, Mixture, State, StateRef, Stream,
    Transition, TransitionRef,
};
