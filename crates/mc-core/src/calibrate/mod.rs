//! Calibration of per-arm cohort parameters from clinical statistics.
//!
//! Pipeline, per therapy arm:
//!
//! 1. derive hazards from the clinical statistics ([`hazards`]);
//! 2. assemble the baseline annual matrix;
//! 3. treated arm only: rescale PostStroke rates by the relative risks
//!    ([`therapy`]);
//! 4. overlay background mortality and re-discretize at the clinical time
//!    step ([`overlay`]);
//! 5. bundle the matrix with costs and utilities ([`params`]).
//!
//! Every arm is an independent pure invocation; nothing is shared between
//! arms or mutated after a [`ParameterSet`] is returned.
//!
//! # Usage
//!
//! ```ignore
//! use mc_core::calibrate::{build_parameter_set, calibrate};
//! use mc_common::{HealthState, Therapy};
//!
//! let inputs = mc_config::ClinicalInputs::default();
//! let treated = build_parameter_set(&inputs, Therapy::Anticoagulation)?;
//! let row = treated.transition_prob(HealthState::PostStroke);
//!
//! let report = calibrate(&inputs, &Therapy::ALL)?;
//! println!("{}", report.to_markdown());
//! ```

pub mod hazards;
pub mod overlay;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod therapy;

pub use hazards::ClinicalHazards;
pub use overlay::{BackgroundMortalityOverlay, OverlayOutcome};
pub use params::{CohortParameters, ParameterSet};
pub use pipeline::{
    baseline_model, build_all, build_parameter_set, calibrate, calibrate_arm, ArmCalibration,
    ArmDiagnostics, BaselineModel,
};
pub use report::CalibrationReport;
pub use therapy::{RelativeRisks, TherapyAdjustment, TherapyOutcome};

use mc_math::{DomainError, NumericalError};
use thiserror::Error;

use crate::model::ValidationError;

/// Failure building a parameter set. Always fatal for the arm.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),

    #[error("invalid input {field}: {message}")]
    InvalidInput { field: String, message: String },
}

impl CalibrationError {
    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        CalibrationError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<CalibrationError> for mc_common::Error {
    fn from(err: CalibrationError) -> Self {
        match err {
            CalibrationError::Domain(e) => mc_common::Error::Domain(e.to_string()),
            CalibrationError::Validation(e) => mc_common::Error::Validation(e.to_string()),
            CalibrationError::Numerical(e) => mc_common::Error::Numerical(e.to_string()),
            e @ CalibrationError::InvalidInput { .. } => {
                mc_common::Error::InvalidInputs(e.to_string())
            }
        }
    }
}
