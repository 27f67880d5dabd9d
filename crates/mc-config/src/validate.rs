//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::inputs::{ClinicalInputs, TABLE_LEN};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

fn check_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("Must be positive and finite, got {}", value)));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("Must be non-negative and finite, got {}", value)));
    }
    Ok(())
}

/// Probabilities that feed a logarithm must stay below one.
fn check_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 1), got {}", value)));
    }
    Ok(())
}

fn check_share(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 1], got {}", value)));
    }
    Ok(())
}

fn check_table_len(field: &str, len: usize) -> ValidationResult<()> {
    if len != TABLE_LEN {
        return Err(invalid(
            field,
            format!("Expected one entry per health state ({}), got {}", TABLE_LEN, len),
        ));
    }
    Ok(())
}

/// Validate clinical inputs semantically.
///
/// Row-stochasticity of the baseline matrix is left to the matrix builder,
/// which owns that invariant; only its shape is checked here.
pub fn validate_inputs(inputs: &ClinicalInputs) -> ValidationResult<()> {
    if inputs.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: inputs.schema_version.clone(),
        });
    }

    let cohort = &inputs.cohort;
    if cohort.population_size == 0 {
        return Err(invalid("cohort.population_size", "Must be at least 1".to_string()));
    }
    check_positive("cohort.simulation_years", cohort.simulation_years)?;
    check_positive("cohort.delta_t", cohort.delta_t)?;
    if cohort.delta_t > cohort.simulation_years {
        return Err(ValidationError::SemanticError(format!(
            "Time step {} exceeds the simulation horizon {}",
            cohort.delta_t, cohort.simulation_years
        )));
    }
    check_probability("cohort.discount_rate", cohort.discount_rate)?;
    if !(cohort.significance_level > 0.0 && cohort.significance_level < 1.0) {
        return Err(invalid(
            "cohort.significance_level",
            format!("Must be in (0, 1), got {}", cohort.significance_level),
        ));
    }

    let matrix = &inputs.baseline.transition_matrix;
    check_table_len("baseline.transition_matrix", matrix.len())?;
    for (i, row) in matrix.iter().enumerate() {
        let field = format!("baseline.transition_matrix[{}]", i);
        check_table_len(&field, row.len())?;
        if let Some(bad) = row.iter().find(|x| !x.is_finite()) {
            return Err(invalid(&field, format!("Entries must be finite, got {}", bad)));
        }
    }

    let h = &inputs.hazards;
    check_non_negative("hazards.crude_deaths_per_1000", h.crude_deaths_per_1000)?;
    check_positive("hazards.crude_scale", h.crude_scale)?;
    check_non_negative("hazards.stroke_deaths", h.stroke_deaths)?;
    check_positive("hazards.population", h.population)?;
    check_probability("hazards.first_stroke_probability", h.first_stroke_probability)?;
    check_share("hazards.stroke_survival_share", h.stroke_survival_share)?;
    check_probability(
        "hazards.recurrence_cumulative_incidence",
        h.recurrence_cumulative_incidence,
    )?;
    check_share("hazards.attributable_fraction", h.attributable_fraction)?;
    check_positive("hazards.follow_up_years", h.follow_up_years)?;
    check_share("hazards.recurrence_stroke_share", h.recurrence_stroke_share)?;
    check_positive("hazards.stroke_duration", h.stroke_duration)?;

    let t = &inputs.therapy;
    check_non_negative("therapy.rr_stroke", t.rr_stroke)?;
    check_non_negative("therapy.rr_bleeding", t.rr_bleeding)?;
    check_non_negative("therapy.annual_drug_cost", t.annual_drug_cost)?;

    let o = &inputs.outcomes;
    check_table_len("outcomes.annual_state_costs", o.annual_state_costs.len())?;
    for (i, cost) in o.annual_state_costs.iter().enumerate() {
        check_non_negative(&format!("outcomes.annual_state_costs[{}]", i), *cost)?;
    }
    check_non_negative("outcomes.stroke_event_cost", o.stroke_event_cost)?;
    check_table_len("outcomes.annual_state_utilities", o.annual_state_utilities.len())?;
    if let Some(bad) = o.annual_state_utilities.iter().find(|u| !u.is_finite()) {
        return Err(invalid(
            "outcomes.annual_state_utilities",
            format!("Utilities must be finite, got {}", bad),
        ));
    }

    check_probability(
        "background_mortality.annual_probability",
        inputs.background_mortality.annual_probability,
    )?;

    Ok(())
}
