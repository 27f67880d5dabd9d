//! Configuration snapshots for calibration reports.
//!
//! A snapshot captures the exact clinical inputs a calibration ran with, so a
//! report can be traced back to its configuration and compared with others.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::inputs::{BaselineSource, ClinicalInputs};
use crate::resolve::InputsPath;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the inputs were loaded from.
    #[serde(default)]
    pub inputs_path: Option<String>,

    /// Source of the inputs.
    pub inputs_source: String,

    /// SHA-256 hash of the raw file content, when a file was read.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// SHA-256 hash of the effective (defaults applied) inputs.
    pub effective_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub delta_t: f64,
    pub discount_rate: f64,
    pub baseline_source: BaselineSource,
    pub rr_stroke: f64,
    pub rr_bleeding: f64,
    pub background_mortality_enabled: bool,
    pub background_mortality_probability: f64,
}

impl ConfigSummary {
    fn from_inputs(inputs: &ClinicalInputs) -> Self {
        ConfigSummary {
            delta_t: inputs.cohort.delta_t,
            discount_rate: inputs.cohort.discount_rate,
            baseline_source: inputs.baseline.source,
            rr_stroke: inputs.therapy.rr_stroke,
            rr_bleeding: inputs.therapy.rr_bleeding,
            background_mortality_enabled: inputs.background_mortality.enabled,
            background_mortality_probability: inputs.background_mortality.annual_probability,
        }
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot from loaded inputs.
    ///
    /// `raw_json` is the file content the inputs were parsed from, if any.
    pub fn new(
        inputs: &ClinicalInputs,
        resolved: &InputsPath,
        raw_json: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        let effective = serde_json::to_string(inputs)?;

        Ok(ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: inputs.schema_version.clone(),
            inputs_path: resolved.path.as_ref().map(|p| p.display().to_string()),
            inputs_source: resolved.source.to_string(),
            file_hash: raw_json.map(hash_content),
            effective_hash: hash_content(&effective),
            summary: ConfigSummary::from_inputs(inputs),
        })
    }

    /// Create a snapshot of the built-in defaults.
    pub fn defaults_only() -> Result<Self, serde_json::Error> {
        Self::new(&ClinicalInputs::default(), &InputsPath::default(), None)
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same effective inputs).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

/// Compute SHA-256 hash of content.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
