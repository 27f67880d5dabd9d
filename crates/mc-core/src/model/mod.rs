//! Matrix model of the stroke cohort: validated probability and generator
//! matrices, the baseline builder, and discrete ⇄ continuous conversion.

pub mod builder;
pub mod conversion;
pub mod matrix;

pub use builder::TransitionMatrixBuilder;
pub use conversion::{
    regularize, to_generator, to_probability, Discretization, Embedding, Regularization,
};
pub use matrix::{
    GeneratorMatrix, StateArray, TransitionProbabilityMatrix, ValidationError,
    GENERATOR_ROW_TOLERANCE, ROW_SUM_TOLERANCE,
};
