//! Error types for Markov calibration.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! Calibration failures are configuration defects, not transient conditions,
//! so nothing in the calibration categories is reported as recoverable.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Numerical Error
//!   Reason: numerical error: eigenvalue 0.5+0.3i has a non-negligible imaginary part
//!   Fix: The baseline matrix has no real generator. Revisit the clinical inputs.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 32,
//!   "category": "calibration",
//!   "message": "numerical error: ...",
//!   "recoverable": false,
//!   "context": { "therapy": "anticoagulation" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for calibration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors (inputs, schema).
    Config,
    /// Hazard derivation, matrix validation and conversion errors.
    Calibration,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Calibration => write!(f, "calibration"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the calibration workspace.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid clinical inputs: {0}")]
    InvalidInputs(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Calibration errors (30-39)
    #[error("domain error: {0}")]
    Domain(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("numerical error: {0}")]
    Numerical(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 30-39: Calibration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidInputs(_) => 11,
            Error::SchemaValidation(_) => 12,
            Error::Domain(_) => 30,
            Error::Validation(_) => 31,
            Error::Numerical(_) => 32,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidInputs(_) | Error::SchemaValidation(_) => {
                ErrorCategory::Config
            }
            Error::Domain(_) | Error::Validation(_) | Error::Numerical(_) => {
                ErrorCategory::Calibration
            }
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether retrying the same operation could succeed.
    ///
    /// Inputs are deterministic constants, so only I/O failures qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'mc-core check' to validate the inputs file, or remove it to use built-in defaults."
            }
            Error::InvalidInputs(_) => {
                "Fix the reported field in clinical.json. Run 'mc-core schema' for the expected shape."
            }
            Error::SchemaValidation(_) => {
                "Ensure the inputs file declares the current schema_version."
            }
            Error::Domain(_) => {
                "An input probability is outside [0, 1). Check the hazards section of the inputs."
            }
            Error::Validation(_) => {
                "A transition matrix row does not sum to 1 or has negative entries. Check baseline.transition_matrix."
            }
            Error::Numerical(_) => {
                "The baseline matrix could not be converted to a valid generator. Revisit the clinical inputs."
            }
            Error::Io(_) => "Check that the inputs path exists and is readable, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidInputs(_) => "Invalid Clinical Inputs",
            Error::SchemaValidation(_) => "Schema Validation Failed",
            Error::Domain(_) => "Domain Error",
            Error::Validation(_) => "Matrix Validation Error",
            Error::Numerical(_) => "Numerical Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., therapy arm, file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context: HashMap::new(),
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation(),
    )
}
