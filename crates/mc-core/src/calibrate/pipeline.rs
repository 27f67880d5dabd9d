//! Per-arm calibration pipeline.

use mc_common::Therapy;
use mc_config::{BaselineSource, ClinicalInputs};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    BackgroundMortalityOverlay, CalibrationError, CalibrationReport, ClinicalHazards,
    ParameterSet, RelativeRisks, TherapyAdjustment,
};
use crate::model::{
    to_generator, to_probability, Embedding, GeneratorMatrix, Regularization,
    TransitionMatrixBuilder, TransitionProbabilityMatrix,
};

/// Baseline annual matrix of the untreated cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineModel {
    pub source: BaselineSource,
    pub annual: TransitionProbabilityMatrix,
    /// Exact annual generator, known when the baseline was built from
    /// hazards rather than observed probabilities.
    pub generator: Option<GeneratorMatrix>,
}

impl BaselineModel {
    /// Annual generator, recovered by matrix logarithm when not known.
    pub fn embedding(&self) -> Result<Embedding, CalibrationError> {
        match &self.generator {
            Some(generator) => Ok(Embedding {
                generator: generator.clone(),
                regularization: Regularization::default(),
            }),
            None => Ok(to_generator(&self.annual, 1.0)?),
        }
    }
}

/// Build the baseline annual matrix from the configured source.
pub fn baseline_model(
    inputs: &ClinicalInputs,
    hazards: &ClinicalHazards,
) -> Result<BaselineModel, CalibrationError> {
    let source = inputs.baseline.source;
    match source {
        BaselineSource::Matrix => {
            let annual =
                TransitionMatrixBuilder::from_rows(&inputs.baseline.transition_matrix)?.build()?;
            Ok(BaselineModel {
                source,
                annual,
                generator: None,
            })
        }
        BaselineSource::Hazards => {
            let generator = hazards.generator()?;
            let annual = to_probability(&generator, 1.0)?.matrix;
            Ok(BaselineModel {
                source,
                annual,
                generator: Some(generator),
            })
        }
    }
}

/// What the pipeline did for one arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmDiagnostics {
    pub therapy: Therapy,
    pub overlay_applied: bool,
    /// Regularization of the baseline generator the therapy adjustment
    /// started from (treated arm only).
    pub therapy_regularization: Option<Regularization>,
    /// Regularization of the annual generator the overlay started from.
    pub overlay_regularization: Option<Regularization>,
    /// Largest exit rate of the generator discretized at the time step.
    pub max_exit_rate: Option<f64>,
    /// Baseline generator with relative risks applied, before the overlay.
    pub adjusted_generator: Option<GeneratorMatrix>,
    /// Annual generator after the background hazard was injected.
    pub overlay_generator: Option<GeneratorMatrix>,
    /// The overlay overwrote PostStroke → BackgroundDeath, so the bleeding
    /// relative risk had no effect on the parameters.
    pub bleeding_risk_superseded: bool,
}

/// Calibrated parameters plus diagnostics for one arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmCalibration {
    pub parameters: ParameterSet,
    pub diagnostics: ArmDiagnostics,
}

/// Run the full pipeline for `therapy`.
pub fn calibrate_arm(
    inputs: &ClinicalInputs,
    therapy: Therapy,
) -> Result<ArmCalibration, CalibrationError> {
    let hazards = ClinicalHazards::from_inputs(&inputs.hazards)?;
    let baseline = baseline_model(inputs, &hazards)?;
    arm_from_baseline(inputs, &baseline, therapy)
}

fn arm_from_baseline(
    inputs: &ClinicalInputs,
    baseline: &BaselineModel,
    therapy: Therapy,
) -> Result<ArmCalibration, CalibrationError> {
    let delta_t = inputs.cohort.delta_t;
    let mut diagnostics = ArmDiagnostics {
        therapy,
        overlay_applied: false,
        therapy_regularization: None,
        overlay_regularization: None,
        max_exit_rate: None,
        adjusted_generator: None,
        overlay_generator: None,
        bleeding_risk_superseded: false,
    };

    // Annual matrix of this arm, and its annual generator when one is known.
    let (annual, known) = match therapy {
        Therapy::None => (
            baseline.annual.clone(),
            baseline.generator.clone().map(|generator| Embedding {
                generator,
                regularization: Regularization::default(),
            }),
        ),
        Therapy::Anticoagulation => {
            let embedding = baseline.embedding()?;
            let risks = RelativeRisks::new(inputs.therapy.rr_stroke, inputs.therapy.rr_bleeding)?;
            let outcome = TherapyAdjustment::new(risks).apply(&baseline.annual, &embedding.generator)?;
            diagnostics.therapy_regularization = Some(embedding.regularization);
            diagnostics.adjusted_generator = Some(outcome.generator.clone());
            let known = Embedding {
                generator: outcome.generator,
                regularization: embedding.regularization,
            };
            (outcome.annual, Some(known))
        }
    };

    let matrix = if inputs.background_mortality.enabled {
        let overlay = BackgroundMortalityOverlay::from_annual_probability(
            inputs.background_mortality.annual_probability,
        )?;
        if therapy == Therapy::Anticoagulation {
            diagnostics.bleeding_risk_superseded = true;
            debug!(
                %therapy,
                rr_bleeding = inputs.therapy.rr_bleeding,
                hazard = overlay.hazard(),
                "background hazard replaces the bleeding-adjusted PostStroke rate"
            );
        }
        let outcome = match known {
            Some(embedding) => overlay.apply_to_generator(embedding, delta_t)?,
            None => overlay.apply(&annual, delta_t)?,
        };
        diagnostics.overlay_applied = true;
        diagnostics.overlay_regularization = Some(outcome.regularization);
        diagnostics.max_exit_rate = Some(outcome.discretization.max_exit_rate);
        diagnostics.overlay_generator = Some(outcome.generator);
        outcome.discretization.matrix
    } else {
        if (delta_t - 1.0).abs() > f64::EPSILON {
            warn!(
                %therapy,
                delta_t,
                "background mortality overlay disabled; annual matrix used at a non-annual time step"
            );
        }
        annual
    };

    let parameters = ParameterSet::assemble(therapy, matrix, inputs)?;
    info!(
        %therapy,
        overlay = diagnostics.overlay_applied,
        delta_t,
        "parameter set built"
    );

    Ok(ArmCalibration {
        parameters,
        diagnostics,
    })
}

/// Parameters for one arm.
pub fn build_parameter_set(
    inputs: &ClinicalInputs,
    therapy: Therapy,
) -> Result<ParameterSet, CalibrationError> {
    calibrate_arm(inputs, therapy).map(|arm| arm.parameters)
}

/// Parameters for every arm, in [`Therapy::ALL`] order.
pub fn build_all(inputs: &ClinicalInputs) -> Result<Vec<ParameterSet>, CalibrationError> {
    Therapy::ALL
        .into_iter()
        .map(|therapy| build_parameter_set(inputs, therapy))
        .collect()
}

/// Calibrate `therapies` and collect a report.
pub fn calibrate(
    inputs: &ClinicalInputs,
    therapies: &[Therapy],
) -> Result<CalibrationReport, CalibrationError> {
    let hazards = ClinicalHazards::from_inputs(&inputs.hazards)?;
    let baseline = baseline_model(inputs, &hazards)?;
    let arms = therapies
        .iter()
        .map(|&therapy| arm_from_baseline(inputs, &baseline, therapy))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CalibrationReport::new(hazards, baseline, arms))
}
