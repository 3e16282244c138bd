//! Linear interpolation of HMM components.
//!
//! Every combinator walks its operands position by position and bottoms out
//! in the weighted sums of `vector_math`: transition → states → streams →
//! mixtures → mean/variance/gconst/weight.

use crate::error::AcModelError;
use crate::interpolation::vector_math::{
    interpolate_matrix, interpolate_values, interpolate_vectors,
};
use crate::types::{HmmState, Mixture, State, StateRef, Stream, Transition, TransitionRef};

/// Weighted combination of resolved transition matrices.
///
/// A single operand is returned as is and its weight ignored.
pub fn linear_transitions(
    transitions: &[&TransitionRef],
    weights: &[f64],
) -> Result<Transition, AcModelError> {
    let inline = transitions
        .iter()
        .map(|t| match t {
            TransitionRef::Inline(transition) => Ok(transition),
            TransitionRef::Macro(name) => Err(AcModelError::unresolved("transition", name)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first = match inline.as_slice() {
        [] => return Err(AcModelError::invalid_argument("no transitions to interpolate")),
        [only] => return Ok((*only).clone()),
        [first, ..] => *first,
    };
    check_operand_count("transitions", inline.len(), weights.len())?;

    let dim = first.dim();
    for t in &inline {
        if t.dim() != dim {
            return Err(AcModelError::dimension("transition matrix", dim, t.dim()));
        }
        if !t.is_square() {
            return Err(AcModelError::invalid_argument(format!(
                "transition matrix of dimension {} is not square",
                t.dim()
            )));
        }
    }

    let matrices: Vec<&[Vec<f64>]> = inline.iter().map(|t| t.matrix.as_slice()).collect();
    Ok(Transition::new(interpolate_matrix(&matrices, weights)?))
}

/// Weighted combination of per-model state lists, position by position.
///
/// All lists must hold the same number of states; the HTK index of each
/// result comes from the first list.
pub fn linear_states(
    state_lists: &[&[HmmState]],
    weights: &[f64],
) -> Result<Vec<HmmState>, AcModelError> {
    let first = match state_lists {
        [] => return Err(AcModelError::invalid_argument("no state lists to interpolate")),
        [first, ..] => *first,
    };
    for list in state_lists {
        if list.len() != first.len() {
            return Err(AcModelError::dimension("state list", first.len(), list.len()));
        }
        if let Some(StateRef::Macro(name)) = list.iter().map(|s| &s.state).find(|s| s.is_macro()) {
            return Err(AcModelError::unresolved("state", name));
        }
    }
    if state_lists.len() == 1 {
        return Ok(first.to_vec());
    }
    check_operand_count("state lists", state_lists.len(), weights.len())?;

    let mut combined = Vec::with_capacity(first.len());
    let mut operands: Vec<&State> = Vec::with_capacity(state_lists.len());
    for (pos, head) in first.iter().enumerate() {
        operands.clear();
        operands.extend(
            state_lists
                .iter()
                .filter_map(|list| list[pos].state.as_inline()),
        );
        combined.push(HmmState {
            index: head.index,
            state: StateRef::Inline(linear_state(&operands, weights)?),
        });
    }
    Ok(combined)
}

/// Combines one state across operands, stream by stream.
pub fn linear_state(states: &[&State], weights: &[f64]) -> Result<State, AcModelError> {
    let first = states
        .first()
        .ok_or_else(|| AcModelError::invalid_argument("no states to interpolate"))?;
    let stream_count = first.streams.len();
    if let Some(bad) = states.iter().find(|s| s.streams.len() != stream_count) {
        return Err(AcModelError::dimension(
            "state streams",
            stream_count,
            bad.streams.len(),
        ));
    }

    let streams = (0..stream_count)
        .map(|pos| {
            let operands: Vec<&Stream> = states.iter().map(|s| &s.streams[pos]).collect();
            linear_stream(&operands, weights)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let weights_of: Option<Vec<&[f64]>> = states.iter().map(|s| s.weights.as_deref()).collect();
    let stream_weights = match weights_of {
        Some(vectors) => Some(interpolate_vectors(&vectors, weights)?),
        None => None,
    };

    Ok(State {
        streams,
        weights: stream_weights,
    })
}

/// Combines one stream across operands, mixture by mixture.
pub fn linear_stream(streams: &[&Stream], weights: &[f64]) -> Result<Stream, AcModelError> {
    let first = streams
        .first()
        .ok_or_else(|| AcModelError::invalid_argument("no streams to interpolate"))?;
    let mixture_count = first.mixtures.len();
    if let Some(bad) = streams.iter().find(|s| s.mixtures.len() != mixture_count) {
        return Err(AcModelError::dimension(
            "stream mixtures",
            mixture_count,
            bad.mixtures.len(),
        ));
    }

    let mixtures = (0..mixture_count)
        .map(|pos| {
            let operands: Vec<&Mixture> = streams.iter().map(|s| &s.mixtures[pos]).collect();
            linear_mixture(&operands, weights)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stream { mixtures })
}

/// Combines one Gaussian pdf across operands.
///
/// The weight is only interpolated when every operand carries one.
pub fn linear_mixture(mixtures: &[&Mixture], weights: &[f64]) -> Result<Mixture, AcModelError> {
    let first = mixtures
        .first()
        .ok_or_else(|| AcModelError::invalid_argument("no mixtures to interpolate"))?;
    let mean_dim = first.mean.len();
    let var_dim = first.variance.len();
    for mix in mixtures {
        if mix.mean.len() != mean_dim {
            return Err(AcModelError::dimension("mixture mean", mean_dim, mix.mean.len()));
        }
        if mix.variance.len() != var_dim {
            return Err(AcModelError::dimension(
                "mixture variance",
                var_dim,
                mix.variance.len(),
            ));
        }
    }

    let means: Vec<&[f64]> = mixtures.iter().map(|m| m.mean.as_slice()).collect();
    let variances: Vec<&[f64]> = mixtures.iter().map(|m| m.variance.as_slice()).collect();
    let gconsts: Vec<f64> = mixtures.iter().map(|m| m.gconst).collect();
    let weight = match mixtures.iter().map(|m| m.weight).collect::<Option<Vec<f64>>>() {
        Some(values) => Some(interpolate_values(&values, weights)?),
        None => None,
    };

    Ok(Mixture {
        weight,
        mean: interpolate_vectors(&means, weights)?,
        variance: interpolate_vectors(&variances, weights)?,
        gconst: interpolate_values(&gconsts, weights)?,
    })
}

fn check_operand_count(
    context: &'static str,
    operands: usize,
    weights: usize,
) -> Result<(), AcModelError> {
    if operands != weights {
        return Err(AcModelError::invalid_argument(format!(
            "{operands} {context} but {weights} weights"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn t1() -> TransitionRef {
        TransitionRef::Inline(Transition::new(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.6, 0.4, 0.0],
            vec![0.0, 0.0, 0.7, 0.3],
            vec![0.0, 0.0, 0.0, 0.0],
        ]))
    }

    fn t2() -> TransitionRef {
        TransitionRef::Inline(Transition::new(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.2, 0.8, 0.0],
            vec![0.0, 0.0, 0.5, 0.5],
            vec![0.0, 0.0, 0.0, 0.0],
        ]))
    }

    fn mixture(mean: f64, var: f64, weight: Option<f64>) -> Mixture {
        let mut mix = Mixture::gaussian(vec![mean; 3], vec![var; 3]);
        mix.weight = weight;
        mix
    }

    fn states(mean: f64) -> Vec<HmmState> {
        (2..=3)
            .map(|index| HmmState {
                index,
                state: StateRef::Inline(State::single_stream(vec![
                    mixture(mean, 1.0, Some(0.5)),
                    mixture(mean + 1.0, 2.0, Some(0.5)),
                ])),
            })
            .collect()
    }

    fn random_stochastic(rng: &mut StdRng, dim: usize) -> Transition {
        let mut matrix = Vec::with_capacity(dim);
        for _ in 0..dim - 1 {
            let row: Vec<f64> = (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect();
            let sum: f64 = row.iter().sum();
            matrix.push(row.into_iter().map(|v| v / sum).collect());
        }
        matrix.push(vec![0.0; dim]);
        Transition::new(matrix)
    }

    #[test]
    fn transitions_at_full_weight_return_that_operand() {
        let (a, b) = (t1(), t2());
        let got = linear_transitions(&[&a, &b], &[1.0, 0.0]).unwrap();
        assert_eq!(&got, a.as_inline().unwrap());
        let got = linear_transitions(&[&a, &b], &[0.0, 1.0]).unwrap();
        assert_eq!(&got, b.as_inline().unwrap());
    }

    #[test]
    fn transitions_halfway() {
        let (a, b) = (t1(), t2());
        let got = linear_transitions(&[&a, &b], &[0.5, 0.5]).unwrap();
        assert_eq!(got.dim(), 4);
        assert!((got.matrix[1][1] - 0.4).abs() < 1e-12);
        assert!((got.matrix[1][2] - 0.6).abs() < 1e-12);
        assert!(got.is_row_stochastic(1e-9));
    }

    #[test]
    fn single_transition_is_returned_unchanged() {
        let a = t1();
        let got = linear_transitions(&[&a], &[0.3]).unwrap();
        assert_eq!(&got, a.as_inline().unwrap());
    }

    #[test]
    fn no_transition_is_an_error() {
        let err = linear_transitions(&[], &[]).unwrap_err();
        assert!(matches!(err, AcModelError::InvalidArgument { .. }));
    }

    #[test]
    fn macro_transition_is_rejected() {
        let a = t1();
        let m = TransitionRef::Macro("T_sil".to_string());
        let err = linear_transitions(&[&a, &m], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, AcModelError::UnresolvedMacro { .. }));
    }

    #[test]
    fn transitions_of_different_dims_fail() {
        let a = t1();
        let small = TransitionRef::Inline(Transition::new(vec![
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.9, 0.1],
            vec![0.0, 0.0, 0.0],
        ]));
        let err = linear_transitions(&[&a, &small], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(
            err,
            AcModelError::DimensionMismatch {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn weight_count_must_match_transitions() {
        let (a, b) = (t1(), t2());
        let err = linear_transitions(&[&a, &b], &[1.0]).unwrap_err();
        assert!(matches!(err, AcModelError::InvalidArgument { .. }));
    }

    #[test]
    fn row_stochastic_is_preserved_for_random_convex_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let dim = rng.gen_range(3..8);
            let a = TransitionRef::Inline(random_stochastic(&mut rng, dim));
            let b = TransitionRef::Inline(random_stochastic(&mut rng, dim));
            let gamma: f64 = rng.gen_range(0.0..=1.0);
            let got = linear_transitions(&[&a, &b], &[gamma, 1.0 - gamma]).unwrap();
            assert!(got.is_row_stochastic(1e-4), "gamma={gamma} matrix={got:?}");
        }
    }

    #[test]
    fn states_at_full_weight_return_that_operand() {
        let (a, b) = (states(0.0), states(4.0));
        let got = linear_states(&[&a, &b], &[1.0, 0.0]).unwrap();
        assert_eq!(got, a);
        let got = linear_states(&[&a, &b], &[0.0, 1.0]).unwrap();
        assert_eq!(got, b);
    }

    #[test]
    fn states_interpolate_every_mixture() {
        let (a, b) = (states(0.0), states(4.0));
        let got = linear_states(&[&a, &b], &[0.25, 0.75]).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].index, 2);
        assert_eq!(got[1].index, 3);
        let state = got[1].state.as_inline().unwrap();
        let mixes = &state.streams[0].mixtures;
        assert_eq!(mixes[0].mean, vec![3.0; 3]);
        assert_eq!(mixes[1].mean, vec![4.0; 3]);
        assert_eq!(mixes[0].weight, Some(0.5));
    }

    #[test]
    fn state_lists_of_different_lengths_fail() {
        let a = states(0.0);
        let b = states(1.0);
        let err = linear_states(&[&a, &b[..1]], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, AcModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn macro_state_is_rejected() {
        let a = states(0.0);
        let mut b = states(1.0);
        b[1].state = StateRef::Macro("silst".to_string());
        let err = linear_states(&[&a, &b], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(
            err,
            AcModelError::UnresolvedMacro { ref name, .. } if name == "silst"
        ));
    }

    #[test]
    fn mixture_weight_needs_every_operand() {
        let a = mixture(0.0, 1.0, Some(0.3));
        let b = mixture(1.0, 1.0, None);
        let got = linear_mixture(&[&a, &b], &[0.5, 0.5]).unwrap();
        assert_eq!(got.weight, None);
        assert_eq!(got.mean, vec![0.5; 3]);

        let c = mixture(1.0, 1.0, Some(0.7));
        let got = linear_mixture(&[&a, &c], &[0.5, 0.5]).unwrap();
        assert!((got.weight.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mixture_dimension_guard() {
        let a = Mixture::gaussian(vec![0.0; 3], vec![1.0; 3]);
        let b = Mixture::gaussian(vec![0.0; 4], vec![1.0; 4]);
        let err = linear_mixture(&[&a, &b], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(
            err,
            AcModelError::DimensionMismatch {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn mixture_gconst_is_interpolated_linearly() {
        let a = mixture(0.0, 1.0, None);
        let b = mixture(0.0, 2.0, None);
        let got = linear_mixture(&[&a, &b], &[0.5, 0.5]).unwrap();
        assert!((got.gconst - (a.gconst + b.gconst) / 2.0).abs() < 1e-12);
        assert_eq!(got.variance, vec![1.5; 3]);
    }

    #[test]
    fn stream_weights_need_every_operand() {
        let mut a = State::single_stream(vec![mixture(0.0, 1.0, None)]);
        let mut b = State::single_stream(vec![mixture(2.0, 1.0, None)]);
        a.weights = Some(vec![1.0]);
        let got = linear_state(&[&a, &b], &[0.5, 0.5]).unwrap();
        assert_eq!(got.weights, None);

        b.weights = Some(vec![0.5]);
        let got = linear_state(&[&a, &b], &[0.5, 0.5]).unwrap();
        assert_eq!(got.weights, Some(vec![0.75]));
    }

    #[test]
    fn stream_and_mixture_counts_must_match() {
        let a = State::single_stream(vec![mixture(0.0, 1.0, None)]);
        let b = State {
            streams: vec![Stream::default(), Stream::default()],
            weights: None,
        };
        assert!(linear_state(&[&a, &b], &[0.5, 0.5]).is_err());

        let one = Stream::new(vec![mixture(0.0, 1.0, None)]);
        let two = Stream::new(vec![mixture(0.0, 1.0, None), mixture(0.0, 1.0, None)]);
        let err = linear_stream(&[&one, &two], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, AcModelError::DimensionMismatch { .. }));
    }
}
