pub mod linear;
pub mod vector_math;

pub use linear::{
    linear_mixture, linear_state, linear_states, linear_stream, linear_transitions,
};
pub use vector_math::{interpolate_matrix, interpolate_values, interpolate_vectors};
