//! Clinical input configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for clinical.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation (probability ranges, table shapes, relative risks)
//! - Config snapshots for calibration reports

pub mod inputs;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use inputs::{
    BackgroundMortality, BaselineInputs, BaselineSource, ClinicalInputs, CohortSettings,
    HazardInputs, OutcomeTables, TherapyInputs,
};
pub use resolve::{resolve_inputs, ConfigSource, InputsPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_inputs, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
