//! Markov calibration common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Health states and therapy arms of the cohort model
//! - Common error types with stable codes
//! - Output formats

pub mod error;
pub mod output;
pub mod state;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
pub use state::{HealthState, Therapy, NUM_STATES};

/// Schema version of JSON payloads written to stdout.
pub const SCHEMA_VERSION: &str = "1.0.0";
