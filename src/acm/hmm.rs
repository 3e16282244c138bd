use std::path::Path;

use serde::Serialize;

use crate::codec::{HtkAsciiCodec, ModelCodec};
use crate::config::ProtoConfig;
use crate::error::AcModelError;
use crate::interpolation::{linear_states, linear_transitions};
use crate::types::{
    GlobalOptions, HmmState, Macro, Mixture, State, StateRef, Transition, TransitionRef,
};

/// Index of the first emitting state; 1 and N are the non-emitting entry/exit.
pub const FIRST_EMITTING_STATE: usize = 2;

/// One phoneme's model: emitting states and the transition matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hmm {
    pub name: String,
    pub states: Vec<HmmState>,
    pub transition: TransitionRef,
}

impl Hmm {
    /// Numbers `states` from 2 and checks an inline transition covers them
    /// plus the entry/exit states.
    pub fn create(
        name: impl Into<String>,
        states: Vec<StateRef>,
        transition: TransitionRef,
    ) -> Result<Self, AcModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AcModelError::invalid_argument("an HMM needs a name"));
        }
        let states: Vec<HmmState> = states
            .into_iter()
            .enumerate()
            .map(|(i, state)| HmmState {
                index: i + FIRST_EMITTING_STATE,
                state,
            })
            .collect();
        let hmm = Self {
            name,
            states,
            transition,
        };
        if let TransitionRef::Inline(t) = &hmm.transition {
            if t.dim() != hmm.state_count() {
                return Err(AcModelError::dimension(
                    "HMM transition",
                    hmm.state_count(),
                    t.dim(),
                ));
            }
        }
        Ok(hmm)
    }

    /// Untrained 5-state model: zero means, unit variances.
    pub fn create_proto(vec_size: usize, nbmix: usize) -> Result<Self, AcModelError> {
        Self::create_proto_with(&ProtoConfig {
            vec_size,
            mixture_count: nbmix,
            ..ProtoConfig::default()
        })
    }

    pub fn create_proto_with(config: &ProtoConfig) -> Result<Self, AcModelError> {
        if config.vec_size == 0 {
            return Err(AcModelError::invalid_argument("proto vector size must be > 0"));
        }
        if config.mixture_count == 0 {
            return Err(AcModelError::invalid_argument("proto needs at least one mixture"));
        }

        let nbmix = config.mixture_count;
        let mixture = Mixture::gaussian(vec![0.0; config.vec_size], vec![1.0; config.vec_size]);
        let mixture = if nbmix > 1 {
            mixture.with_weight(1.0 / nbmix as f64)
        } else {
            mixture
        };
        let states = config
            .stay_probabilities
            .iter()
            .map(|_| StateRef::Inline(State::single_stream(vec![mixture.clone(); nbmix])))
            .collect();
        let transition = Self::create_transition(&config.stay_probabilities)?;

        Self::create("proto", states, TransitionRef::Inline(transition))
    }

    /// Short pause: one state shared with silence through the `silst` macro.
    pub fn create_sp() -> Self {
        Self::sp(&ProtoConfig::default())
    }

    /// Short pause built from `config.silence_state_macro` and
    /// `config.sp_stay_probability`.
    pub fn create_sp_with(config: &ProtoConfig) -> Result<Self, AcModelError> {
        if config.silence_state_macro.is_empty() {
            return Err(AcModelError::invalid_argument(
                "short pause needs a silence state macro name",
            ));
        }
        Self::create_transition(&[config.sp_stay_probability])?;
        Ok(Self::sp(config))
    }

    fn sp(config: &ProtoConfig) -> Self {
        let stay = config.sp_stay_probability;
        Self {
            name: "sp".to_string(),
            states: vec![HmmState {
                index: FIRST_EMITTING_STATE,
                state: StateRef::Macro(config.silence_state_macro.clone()),
            }],
            transition: TransitionRef::Inline(Transition::new(vec![
                vec![0.0, 1.0, 0.0],
                vec![0.0, stay, 1.0 - stay],
                vec![0.0, 0.0, 0.0],
            ])),
        }
    }

    /// Left-to-right matrix: forced entry into the first emitting state, then
    /// for each state `p` to stay and `1 - p` to move on.
    pub fn create_transition(stay_probabilities: &[f64]) -> Result<Transition, AcModelError> {
        if let Some(p) = stay_probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(AcModelError::invalid_argument(format!(
                "stay probability {p} is outside [0, 1]"
            )));
        }
        let dim = stay_probabilities.len() + 2;
        let mut matrix = vec![vec![0.0; dim]; dim];
        matrix[0][1] = 1.0;
        for (i, p) in stay_probabilities.iter().enumerate() {
            let row = i + 1;
            matrix[row][row] = *p;
            matrix[row][row + 1] = 1.0 - p;
        }
        Ok(Transition::new(matrix))
    }

    pub fn load(path: &Path) -> Result<Self, AcModelError> {
        Self::load_with(&HtkAsciiCodec, path)
    }

    /// Reads a single-HMM file; any further HMM in the file is ignored.
    pub fn load_with(codec: &dyn ModelCodec, path: &Path) -> Result<Self, AcModelError> {
        let parsed = codec.parse(&[path.to_path_buf()])?;
        let count = parsed.hmms.len();
        let hmm = parsed
            .hmms
            .into_iter()
            .next()
            .ok_or_else(|| AcModelError::not_found("HMM in file", path.display().to_string()))?;
        if count > 1 {
            tracing::warn!(
                path = %path.display(),
                count,
                kept = hmm.name.as_str(),
                "hmm: file holds several HMMs, keeping the first"
            );
        }
        Ok(hmm)
    }

    pub fn save(&self, path: &Path) -> Result<(), AcModelError> {
        self.save_with(&HtkAsciiCodec, path)
    }

    pub fn save_with(&self, codec: &dyn ModelCodec, path: &Path) -> Result<(), AcModelError> {
        let text = codec.serialize(&[], std::slice::from_ref(self));
        std::fs::write(path, text).map_err(|e| AcModelError::io("write HMM file", e))
    }

    /// Writes the HMM behind a `~o` header, as HTK tools expect of a proto.
    pub fn save_with_options(
        &self,
        path: &Path,
        options: &GlobalOptions,
    ) -> Result<(), AcModelError> {
        let header = [Macro::Options(options.clone())];
        let text = HtkAsciiCodec.serialize(&header, std::slice::from_ref(self));
        std::fs::write(path, text).map_err(|e| AcModelError::io("write HMM file", e))
    }

    /// Emitting states plus the entry and exit states.
    pub fn state_count(&self) -> usize {
        self.states.len() + 2
    }

    pub fn get_state(&self, index: usize) -> Option<&StateRef> {
        self.states
            .iter()
            .find(|s| s.index == index)
            .map(|s| &s.state)
    }

    /// Replaces states and transition with `gamma * self + (1 - gamma) * other`.
    ///
    /// Both HMMs must be fully resolved and share their topology. On error
    /// `self` is left untouched.
    pub fn static_linear_interpolation(
        &mut self,
        other: &Hmm,
        gamma: f64,
    ) -> Result<(), AcModelError> {
        let weights = [gamma, 1.0 - gamma];
        let states = linear_states(&[self.states.as_slice(), other.states.as_slice()], &weights)?;
        let transition = linear_transitions(&[&self.transition, &other.transition], &weights)?;

        self.states = states;
        self.transition = TransitionRef::Inline(transition);
        Ok(())
    }

    /// `true` when no state or transition is a macro reference.
    pub fn is_resolved(&self) -> bool {
        !self.transition.is_macro() && self.states.iter().all(|s| !s.state.is_macro())
    }
}
