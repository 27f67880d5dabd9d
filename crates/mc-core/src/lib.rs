//! Calibration engine for a five-state stroke Markov cohort model.
//!
//! Turns clinical inputs (event probabilities, a baseline annual transition
//! matrix, therapy relative risks and cost/utility tables) into per-arm
//! parameter sets at the simulation time step.

pub mod calibrate;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod model;

pub use calibrate::{build_all, build_parameter_set, calibrate, CalibrationReport, ParameterSet};
pub use exit_codes::ExitCode;
