//! Clinical inputs loading for mc-core.
//!
//! This module handles:
//! - Resolving clinical.json (CLI > env > XDG > defaults)
//! - Shape/type checking via serde
//! - Semantic validation (ranges, table lengths, schema version)
//! - Config snapshot generation for calibration reports

pub use mc_config::resolve::{ConfigSource, InputsPath};
pub use mc_config::validate::ValidationError;
pub use mc_config::{ClinicalInputs, ConfigSnapshot};

use mc_config::resolve::resolve_inputs;
use mc_config::validate::validate_inputs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Inputs file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid inputs file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to snapshot inputs: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl From<ConfigError> for mc_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::IoError { source, .. } => mc_common::Error::Io(source),
            ConfigError::Snapshot(e) => mc_common::Error::Json(e),
            e @ ConfigError::ParseError { .. } => mc_common::Error::SchemaValidation(e.to_string()),
            e @ ConfigError::ValidationError(_) => mc_common::Error::InvalidInputs(e.to_string()),
            e @ ConfigError::NotFound { .. } => mc_common::Error::Config(e.to_string()),
        }
    }
}

/// Inputs resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit clinical.json path (highest priority).
    pub inputs_path: Option<PathBuf>,
    /// Explicit config directory.
    pub config_dir: Option<PathBuf>,
}

/// Validated inputs with provenance.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub inputs: ClinicalInputs,
    pub resolved: InputsPath,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, parse and validate the clinical inputs.
///
/// Falls back to built-in defaults when no file is found anywhere.
pub fn load_inputs(options: &ConfigOptions) -> Result<LoadedInputs, ConfigError> {
    let resolved = resolve_inputs(options.inputs_path.as_deref(), options.config_dir.as_deref());

    let (inputs, raw) = match &resolved.path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ConfigError::NotFound { path: path.clone() }
                } else {
                    ConfigError::IoError {
                        path: path.clone(),
                        source,
                    }
                }
            })?;
            let inputs = ClinicalInputs::from_json(&content).map_err(|e| match e {
                ValidationError::ParseError(message) => ConfigError::ParseError {
                    path: path.clone(),
                    message,
                },
                other => ConfigError::ValidationError(other),
            })?;
            (inputs, Some(content))
        }
        None => (ClinicalInputs::default(), None),
    };

    validate_inputs(&inputs)?;
    let snapshot = ConfigSnapshot::new(&inputs, &resolved, raw.as_deref())?;
    debug!(
        source = %resolved.source,
        path = ?resolved.path,
        snapshot = snapshot.short_id(),
        "clinical inputs loaded"
    );

    Ok(LoadedInputs {
        inputs,
        resolved,
        snapshot,
    })
}
