//! Hazard table derived from the clinical statistics.

use mc_common::{HealthState, NUM_STATES};
use mc_config::HazardInputs;
use mc_math::{
    background_mortality_rate, cause_specific_mortality_rate, fixed_duration_rate,
    incidence_rate, recurrence_rate, DomainError, RateSplit,
};
use serde::{Deserialize, Serialize};

use crate::model::{GeneratorMatrix, ValidationError};

/// Annual hazard rates of every modelled transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalHazards {
    /// All-cause mortality net of stroke deaths.
    pub background_mortality: f64,
    /// Stroke-associated mortality in the general population.
    pub stroke_mortality: f64,
    /// First-ever stroke incidence.
    pub first_stroke: f64,
    /// First strokes split into survived (primary) and fatal (secondary).
    pub first_stroke_split: RateSplit,
    /// Recurrent stroke among survivors.
    pub recurrence: f64,
    /// Recurrences split into new strokes (primary) and deaths (secondary).
    pub recurrence_split: RateSplit,
    /// Rate of leaving the acute Stroke state.
    pub stroke_clearance: f64,
}

impl ClinicalHazards {
    pub fn from_inputs(inputs: &HazardInputs) -> Result<Self, DomainError> {
        let first_stroke = incidence_rate(inputs.first_stroke_probability)?;
        let recurrence = recurrence_rate(
            inputs.recurrence_cumulative_incidence,
            inputs.attributable_fraction,
            inputs.follow_up_years,
        )?;

        Ok(Self {
            background_mortality: background_mortality_rate(
                inputs.crude_deaths_per_1000,
                inputs.crude_scale,
                inputs.stroke_deaths,
                inputs.population,
            )?,
            stroke_mortality: cause_specific_mortality_rate(
                inputs.stroke_deaths,
                inputs.population,
            )?,
            first_stroke,
            first_stroke_split: RateSplit::new(first_stroke, inputs.stroke_survival_share)?,
            recurrence,
            recurrence_split: RateSplit::new(recurrence, inputs.recurrence_stroke_share)?,
            stroke_clearance: fixed_duration_rate(inputs.stroke_duration)?,
        })
    }

    /// Annual generator of the stroke model without background mortality.
    ///
    /// | from       | to         | rate                       |
    /// |------------|------------|----------------------------|
    /// | Well       | Stroke     | survived first strokes     |
    /// | Well       | Death      | stroke-associated mortality|
    /// | Stroke     | PostStroke | stroke clearance           |
    /// | Stroke     | Death      | fatal first strokes        |
    /// | PostStroke | Stroke     | recurrent strokes          |
    /// | PostStroke | Death      | fatal recurrences          |
    pub fn generator(&self) -> Result<GeneratorMatrix, ValidationError> {
        use HealthState::*;

        let mut rates = [[0.0; NUM_STATES]; NUM_STATES];
        let mut set = |from: HealthState, to: HealthState, rate: f64| {
            rates[from.to_index()][to.to_index()] = rate;
        };
        set(Well, Stroke, self.first_stroke_split.primary);
        set(Well, Death, self.stroke_mortality);
        set(Stroke, PostStroke, self.stroke_clearance);
        set(Stroke, Death, self.first_stroke_split.secondary);
        set(PostStroke, Stroke, self.recurrence_split.primary);
        set(PostStroke, Death, self.recurrence_split.secondary);

        GeneratorMatrix::from_off_diagonal(rates)
    }
}
