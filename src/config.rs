use std::path::Path;

use crate::error::AcModelError;
use crate::types::GlobalOptions;

/// Defaults used to build proto and short-pause models.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ProtoConfig {
    pub vec_size: usize,
    #[serde(default = "default_mixture_count")]
    pub mixture_count: usize,
    #[serde(default = "default_stay_probabilities")]
    pub stay_probabilities: Vec<f64>,
    #[serde(default = "default_sp_stay_probability")]
    pub sp_stay_probability: f64,
    #[serde(default = "default_silence_state_macro")]
    pub silence_state_macro: String,
    /// Feature kind written in the proto's `~o` header.
    #[serde(default = "default_parameter_kind")]
    pub parameter_kind: String,
}

impl ProtoConfig {
    pub const DEFAULT_VEC_SIZE: usize = 25;

    pub fn load(path: &Path) -> Result<Self, AcModelError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AcModelError::io("read proto config", e))?;
        serde_json::from_str(&data).map_err(|e| AcModelError::json("parse proto config", e))
    }

    pub fn with_vec_size(vec_size: usize) -> Self {
        Self {
            vec_size,
            ..Self::default()
        }
    }

    /// Single-stream diagonal-covariance header matching the proto shape.
    pub fn options(&self) -> GlobalOptions {
        GlobalOptions {
            stream_info: Some(vec![self.vec_size]),
            vec_size: Some(self.vec_size),
            parameter_kind: Some(self.parameter_kind.clone()),
            covariance_kind: Some("DIAGC".to_string()),
            duration_kind: Some("NULLD".to_string()),
        }
    }
}

impl Default for ProtoConfig {
    fn default() -> Self {
        Self {
            vec_size: Self::DEFAULT_VEC_SIZE,
            mixture_count: default_mixture_count(),
            stay_probabilities: default_stay_probabilities(),
            sp_stay_probability: default_sp_stay_probability(),
            silence_state_macro: default_silence_state_macro(),
            parameter_kind: default_parameter_kind(),
        }
    }
}

fn default_mixture_count() -> usize {
    1
}
fn default_stay_probabilities() -> Vec<f64> {
    vec![0.6, 0.6, 0.7]
}
fn default_sp_stay_probability() -> f64 {
    0.9
}
fn default_silence_state_macro() -> String {
    "silst".to_string()
}
fn default_parameter_kind() -> String {
    "MFCC_0_D_A".to_string()
}
