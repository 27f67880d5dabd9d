//! Background (all-cause) mortality overlay.
//!
//! The baseline matrix carries no BackgroundDeath probability. The overlay
//! recovers the annual generator, writes the background hazard into the
//! BackgroundDeath column of every transient row, and re-discretizes at the
//! clinical time step:
//!
//!   Q = log(P_annual);  Q[s][BackgroundDeath] := λ_bg;  P_Δt = exp(Q·Δt)
//!
//! When the annual generator is already known (hazard baseline, or the
//! treated arm's adjusted generator) the logarithm is skipped and the hazard
//! goes straight into that generator.
//!
//! The injected hazard replaces whatever was in the cell, including a
//! bleeding-adjusted PostStroke rate. Running the overlay twice would take
//! the logarithm of an already-short-interval matrix and yield a wrong rate,
//! so [`BackgroundMortalityOverlay::apply`] consumes the overlay.

use mc_common::HealthState;
use mc_math::{probability_to_rate, DomainError};
use serde::Serialize;
use tracing::debug;

use super::CalibrationError;
use crate::model::{
    to_generator, to_probability, Discretization, Embedding, GeneratorMatrix, Regularization,
    TransitionProbabilityMatrix, ValidationError,
};

/// A single-use background mortality overlay.
#[derive(Debug)]
pub struct BackgroundMortalityOverlay {
    hazard: f64,
}

/// Result of applying the overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayOutcome {
    /// Annual generator after injecting the background hazard.
    pub generator: GeneratorMatrix,
    /// Regularization needed to recover the annual generator.
    pub regularization: Regularization,
    /// Matrix at the clinical time step.
    pub discretization: Discretization,
}

impl BackgroundMortalityOverlay {
    /// Overlay injecting a constant annual `hazard`.
    pub fn new(hazard: f64) -> Result<Self, DomainError> {
        if !hazard.is_finite() || hazard < 0.0 {
            return Err(DomainError::InvalidRate(hazard));
        }
        Ok(Self { hazard })
    }

    /// Overlay for an annual background death probability.
    pub fn from_annual_probability(p: f64) -> Result<Self, DomainError> {
        Self::new(probability_to_rate(p)?)
    }

    pub fn hazard(&self) -> f64 {
        self.hazard
    }

    /// Write the background hazard into every transient row of `q`.
    pub fn inject(&self, q: &GeneratorMatrix) -> Result<GeneratorMatrix, ValidationError> {
        let mut rates = *q.rates();
        for state in HealthState::transient() {
            rates[state.to_index()][HealthState::BackgroundDeath.to_index()] = self.hazard;
        }
        GeneratorMatrix::from_off_diagonal(rates)
    }

    /// Overlay an annual probability matrix and discretize at `delta_t`.
    pub fn apply(
        self,
        annual: &TransitionProbabilityMatrix,
        delta_t: f64,
    ) -> Result<OverlayOutcome, CalibrationError> {
        let embedding = to_generator(annual, 1.0)?;
        self.apply_to_generator(embedding, delta_t)
    }

    /// Overlay an already-recovered annual generator.
    pub fn apply_to_generator(
        self,
        annual: Embedding,
        delta_t: f64,
    ) -> Result<OverlayOutcome, CalibrationError> {
        let generator = self.inject(&annual.generator)?;
        let discretization = to_probability(&generator, delta_t)?;
        debug!(
            hazard = self.hazard,
            delta_t,
            max_exit_rate = discretization.max_exit_rate,
            "background mortality overlaid"
        );

        Ok(OverlayOutcome {
            generator,
            regularization: annual.regularization,
            discretization,
        })
    }
}
