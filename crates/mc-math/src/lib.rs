//! Markov calibration math utilities.

pub mod math;

pub use math::hazard::*;
pub use math::matrix::{expm, logm_real, NumericalError, RealLogarithm};
