//! Per-arm parameter bundle handed to the cohort simulator.

use mc_common::{HealthState, Therapy, NUM_STATES};
use mc_config::ClinicalInputs;
use serde::{Deserialize, Serialize};

use super::CalibrationError;
use crate::model::TransitionProbabilityMatrix;

/// Cohort settings passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortParameters {
    pub population_size: u32,
    pub simulation_years: f64,
    pub significance_level: f64,
}

/// Read-only calibrated parameters of one therapy arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    therapy: Therapy,
    initial_health_state: HealthState,
    delta_t: f64,
    transition_matrix: TransitionProbabilityMatrix,
    annual_drug_cost: f64,
    adj_discount_rate: f64,
    annual_state_costs: [f64; NUM_STATES],
    annual_state_utilities: [f64; NUM_STATES],
    stroke_event_cost: f64,
    cohort: CohortParameters,
}

fn state_table(field: &str, values: &[f64]) -> Result<[f64; NUM_STATES], CalibrationError> {
    <[f64; NUM_STATES]>::try_from(values).map_err(|_| {
        CalibrationError::invalid_input(
            field,
            format!("expected {} entries, got {}", NUM_STATES, values.len()),
        )
    })
}

impl ParameterSet {
    /// Bundle a finished per-arm matrix with the configured tables.
    pub fn assemble(
        therapy: Therapy,
        transition_matrix: TransitionProbabilityMatrix,
        inputs: &ClinicalInputs,
    ) -> Result<Self, CalibrationError> {
        let cohort = &inputs.cohort;
        if !cohort.delta_t.is_finite() || cohort.delta_t <= 0.0 {
            return Err(CalibrationError::invalid_input(
                "cohort.delta_t",
                format!("time step must be positive, got {}", cohort.delta_t),
            ));
        }

        let annual_drug_cost = match therapy {
            Therapy::Anticoagulation => inputs.therapy.annual_drug_cost,
            Therapy::None => 0.0,
        };

        Ok(Self {
            therapy,
            initial_health_state: HealthState::Well,
            delta_t: cohort.delta_t,
            transition_matrix,
            annual_drug_cost,
            adj_discount_rate: cohort.discount_rate * cohort.delta_t,
            annual_state_costs: state_table(
                "outcomes.annual_state_costs",
                &inputs.outcomes.annual_state_costs,
            )?,
            annual_state_utilities: state_table(
                "outcomes.annual_state_utilities",
                &inputs.outcomes.annual_state_utilities,
            )?,
            stroke_event_cost: inputs.outcomes.stroke_event_cost,
            cohort: CohortParameters {
                population_size: cohort.population_size,
                simulation_years: cohort.simulation_years,
                significance_level: cohort.significance_level,
            },
        })
    }

    pub fn therapy(&self) -> Therapy {
        self.therapy
    }

    /// Always [`HealthState::Well`].
    pub fn initial_health_state(&self) -> HealthState {
        self.initial_health_state
    }

    /// Clinical time step in years.
    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Outgoing distribution of `state` over one time step.
    pub fn transition_prob(&self, state: HealthState) -> &[f64; NUM_STATES] {
        self.transition_matrix.row(state)
    }

    pub fn transition_matrix(&self) -> &TransitionProbabilityMatrix {
        &self.transition_matrix
    }

    /// Discount rate applied per time step.
    pub fn adj_discount_rate(&self) -> f64 {
        self.adj_discount_rate
    }

    pub fn annual_drug_cost(&self) -> f64 {
        self.annual_drug_cost
    }

    /// Annual cost of residing in `state`; zero for the death states.
    pub fn annual_state_cost(&self, state: HealthState) -> f64 {
        if state.is_absorbing() {
            return 0.0;
        }
        self.annual_state_costs[state.to_index()]
    }

    /// Annual utility of residing in `state`; zero for the death states.
    pub fn annual_state_utility(&self, state: HealthState) -> f64 {
        if state.is_absorbing() {
            return 0.0;
        }
        self.annual_state_utilities[state.to_index()]
    }

    /// One-off cost charged on entering Stroke.
    pub fn stroke_event_cost(&self) -> f64 {
        self.stroke_event_cost
    }

    pub fn cohort(&self) -> &CohortParameters {
        &self.cohort
    }
}
