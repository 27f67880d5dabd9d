//! Clinical input configuration types.
//!
//! These types describe clinical.json. Every section has a `Default` carrying
//! the reference cohort's constants, so a partial file only overrides what it
//! names.

use mc_common::{HealthState, NUM_STATES};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Complete clinical inputs for one calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClinicalInputs {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub cohort: CohortSettings,

    #[serde(default)]
    pub baseline: BaselineInputs,

    #[serde(default)]
    pub hazards: HazardInputs,

    #[serde(default)]
    pub therapy: TherapyInputs,

    #[serde(default)]
    pub outcomes: OutcomeTables,

    #[serde(default)]
    pub background_mortality: BackgroundMortality,
}

impl Default for ClinicalInputs {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            cohort: CohortSettings::default(),
            baseline: BaselineInputs::default(),
            hazards: HazardInputs::default(),
            therapy: TherapyInputs::default(),
            outcomes: OutcomeTables::default(),
            background_mortality: BackgroundMortality::default(),
        }
    }
}

impl ClinicalInputs {
    /// Load inputs from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse inputs from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// JSON Schema describing clinical.json.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ClinicalInputs)
    }
}

/// Cohort and simulation settings handed through to the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CohortSettings {
    /// Number of simulated patients.
    pub population_size: u32,
    /// Simulation horizon in years.
    pub simulation_years: f64,
    /// Significance level for downstream confidence intervals.
    pub significance_level: f64,
    /// Clinical time step in years.
    pub delta_t: f64,
    /// Annual discount rate.
    pub discount_rate: f64,
}

impl Default for CohortSettings {
    fn default() -> Self {
        Self {
            population_size: 2000,
            simulation_years: 15.0,
            significance_level: 0.05,
            delta_t: 1.0 / 12.0,
            discount_rate: 0.03,
        }
    }
}

/// Where the baseline annual matrix comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Use `transition_matrix` as observed.
    #[default]
    Matrix,
    /// Exponentiate the generator built from the hazard table.
    Hazards,
}

impl std::fmt::Display for BaselineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineSource::Matrix => write!(f, "matrix"),
            BaselineSource::Hazards => write!(f, "hazards"),
        }
    }
}

/// Baseline annual transition probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BaselineInputs {
    pub source: BaselineSource,
    /// One row per health state, in [`HealthState::ALL`] order.
    pub transition_matrix: Vec<Vec<f64>>,
}

impl Default for BaselineInputs {
    fn default() -> Self {
        Self {
            source: BaselineSource::Matrix,
            transition_matrix: vec![
                vec![0.75, 0.15, 0.0, 0.1, 0.0],  // Well
                vec![0.0, 0.0, 1.0, 0.0, 0.0],    // Stroke
                vec![0.0, 0.25, 0.55, 0.2, 0.0],  // PostStroke
                vec![0.0, 0.0, 0.0, 1.0, 0.0],    // Death
                vec![0.0, 0.0, 0.0, 0.0, 1.0],    // BackgroundDeath
            ],
        }
    }
}

/// Raw clinical statistics for hazard derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HazardInputs {
    /// Crude all-cause deaths per 1000 population.
    pub crude_deaths_per_1000: f64,
    /// Multiplier taking the crude rate to the reference population's count.
    pub crude_scale: f64,
    /// Stroke-attributable deaths in the reference population.
    pub stroke_deaths: f64,
    /// Reference population size.
    pub population: f64,
    /// Annual probability of a first stroke.
    pub first_stroke_probability: f64,
    /// Share of first strokes that are survived.
    pub stroke_survival_share: f64,
    /// Cumulative recurrence incidence over `follow_up_years`.
    pub recurrence_cumulative_incidence: f64,
    /// Share of recurrences attributed to the modelled cause.
    pub attributable_fraction: f64,
    pub follow_up_years: f64,
    /// Share of recurrences that lead back to the Stroke state.
    pub recurrence_stroke_share: f64,
    /// Time spent in the acute Stroke state, in years.
    pub stroke_duration: f64,
}

impl Default for HazardInputs {
    fn default() -> Self {
        Self {
            crude_deaths_per_1000: 18.0,
            crude_scale: 100.0,
            stroke_deaths: 36.2,
            population: 100_000.0,
            first_stroke_probability: 15.0 / 1000.0,
            stroke_survival_share: 0.9,
            recurrence_cumulative_incidence: 1.0 - 0.83,
            attributable_fraction: 0.17,
            follow_up_years: 5.0,
            recurrence_stroke_share: 0.8,
            stroke_duration: 1.0 / 52.0,
        }
    }
}

/// Treatment-arm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TherapyInputs {
    /// Relative risk applied to PostStroke→Stroke.
    pub rr_stroke: f64,
    /// Relative risk applied to PostStroke→BackgroundDeath.
    pub rr_bleeding: f64,
    pub annual_drug_cost: f64,
}

impl Default for TherapyInputs {
    fn default() -> Self {
        Self {
            rr_stroke: 0.65,
            rr_bleeding: 1.05,
            annual_drug_cost: 2000.0,
        }
    }
}

/// Per-state cost and utility tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutcomeTables {
    pub annual_state_costs: Vec<f64>,
    /// One-off cost of a stroke event.
    pub stroke_event_cost: f64,
    pub annual_state_utilities: Vec<f64>,
}

impl Default for OutcomeTables {
    fn default() -> Self {
        Self {
            annual_state_costs: vec![0.0, 0.0, 200.0, 0.0, 0.0],
            stroke_event_cost: 5000.0,
            annual_state_utilities: vec![1.0, 0.2, 0.9, 0.0, 0.0],
        }
    }
}

impl OutcomeTables {
    /// Annual cost of `state`, or `None` if the table is short.
    pub fn cost(&self, state: HealthState) -> Option<f64> {
        self.annual_state_costs.get(state.to_index()).copied()
    }

    /// Annual utility of `state`, or `None` if the table is short.
    pub fn utility(&self, state: HealthState) -> Option<f64> {
        self.annual_state_utilities.get(state.to_index()).copied()
    }
}

/// Competing all-cause mortality overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BackgroundMortality {
    pub annual_probability: f64,
    pub enabled: bool,
}

impl Default for BackgroundMortality {
    fn default() -> Self {
        Self {
            annual_probability: 18.0 / 1000.0,
            enabled: true,
        }
    }
}

/// Expected length of every per-state table.
pub const TABLE_LEN: usize = NUM_STATES;
