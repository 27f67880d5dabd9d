//! End-to-end calibration scenarios on the library API.

use mc_common::{HealthState, Therapy};
use mc_config::{BaselineSource, ClinicalInputs};
use mc_core::calibrate::{build_all, build_parameter_set, calibrate, CalibrationError};
use mc_core::ParameterSet;
use mc_math::NumericalError;
use HealthState::*;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

// ============================================================================
// Reference inputs
// ============================================================================

#[test]
fn reference_inputs_build_both_arms_in_order() {
    let sets = build_all(&ClinicalInputs::default()).unwrap();
    let therapies: Vec<Therapy> = sets.iter().map(ParameterSet::therapy).collect();
    assert_eq!(therapies, Therapy::ALL.to_vec());
}

#[test]
fn well_survival_decays_exponentially_at_the_time_step() {
    // No state returns to Well, so P[Well][Well] is exp(Q[Well][Well]·Δt).
    let report = calibrate(&ClinicalInputs::default(), &[Therapy::None]).unwrap();
    let arm = report.arm(Therapy::None).unwrap();
    let q = arm.diagnostics.overlay_generator.as_ref().unwrap();
    let dt = arm.parameters.delta_t();
    let expected = (-q.exit_rate(Well) * dt).exp();
    assert!(close(arm.parameters.transition_prob(Well)[0], expected, 1e-10));
}

#[test]
fn anticoagulation_lowers_monthly_recurrence() {
    let inputs = ClinicalInputs::default();
    let untreated = build_parameter_set(&inputs, Therapy::None).unwrap();
    let treated = build_parameter_set(&inputs, Therapy::Anticoagulation).unwrap();

    let p_none = untreated.transition_prob(PostStroke)[Stroke.to_index()];
    let p_treated = treated.transition_prob(PostStroke)[Stroke.to_index()];
    assert!(p_treated < p_none, "{p_treated} >= {p_none}");
}

#[test]
fn anticoagulation_leaves_well_rates_untouched() {
    let report = calibrate(&ClinicalInputs::default(), &Therapy::ALL).unwrap();
    let untreated = report.arm(Therapy::None).unwrap();
    let treated = report.arm(Therapy::Anticoagulation).unwrap();

    let q_none = untreated.diagnostics.overlay_generator.as_ref().unwrap();
    let q_treated = treated.diagnostics.overlay_generator.as_ref().unwrap();
    assert_eq!(q_none.rates()[Well.to_index()], q_treated.rates()[Well.to_index()]);
    assert_eq!(q_none.rates()[Stroke.to_index()], q_treated.rates()[Stroke.to_index()]);

    let well_none = untreated.parameters.transition_prob(Well);
    let well_treated = treated.parameters.transition_prob(Well);
    assert!(close(well_none[Well.to_index()], well_treated[Well.to_index()], 1e-12));
    // Within one step a Well patient can only reach PostStroke through
    // Stroke, so the treated rates enter the Well row at third order.
    for to in HealthState::ALL {
        let (a, b) = (well_none[to.to_index()], well_treated[to.to_index()]);
        assert!(close(a, b, 1e-4), "Well -> {to}: {a} vs {b}");
    }
}

#[test]
fn annual_step_without_overlay_is_the_baseline() {
    let mut inputs = ClinicalInputs::default();
    inputs.cohort.delta_t = 1.0;
    inputs.background_mortality.enabled = false;
    let params = build_parameter_set(&inputs, Therapy::None).unwrap();
    for (state, row) in HealthState::ALL.into_iter().zip(&inputs.baseline.transition_matrix) {
        assert_eq!(params.transition_prob(state).as_slice(), row.as_slice());
    }
}

#[test]
fn parameter_sets_survive_json() {
    let params = build_parameter_set(&ClinicalInputs::default(), Therapy::Anticoagulation).unwrap();
    let json = serde_json::to_string(&params).unwrap();
    let back: ParameterSet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);
}

// ============================================================================
// Hazard-sourced baseline
// ============================================================================

#[test]
fn hazard_baseline_matches_closed_form_well_row() {
    let mut inputs = ClinicalInputs::default();
    inputs.baseline.source = BaselineSource::Hazards;
    inputs.cohort.delta_t = 1.0;
    inputs.background_mortality.enabled = false;

    let report = calibrate(&inputs, &[Therapy::None]).unwrap();
    let h = &report.hazards;
    let exit = h.first_stroke_split.primary + h.stroke_mortality;
    let well = report.arm(Therapy::None).unwrap().parameters.transition_prob(Well);
    assert!(close(well[Well.to_index()], (-exit).exp(), 1e-12));
    let sum: f64 = well.iter().sum();
    assert!(close(sum, 1.0, 1e-9));
    assert!(well[BackgroundDeath.to_index()].abs() < 1e-15);
}

#[test]
fn hazard_baseline_calibrates_both_arms() {
    let mut inputs = ClinicalInputs::default();
    inputs.baseline.source = BaselineSource::Hazards;
    let report = calibrate(&inputs, &Therapy::ALL).unwrap();
    assert_eq!(report.arms.len(), 2);
    let untreated = report.arm(Therapy::None).unwrap();
    assert!(untreated
        .diagnostics
        .overlay_regularization
        .as_ref()
        .unwrap()
        .is_exact());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn certain_first_stroke_is_a_domain_error() {
    let mut inputs = ClinicalInputs::default();
    inputs.hazards.first_stroke_probability = 1.0;
    assert!(matches!(
        calibrate(&inputs, &Therapy::ALL),
        Err(CalibrationError::Domain(_))
    ));
}

#[test]
fn negative_relative_risk_is_rejected() {
    let mut inputs = ClinicalInputs::default();
    inputs.therapy.rr_bleeding = -0.5;
    let err = build_parameter_set(&inputs, Therapy::Anticoagulation).unwrap_err();
    assert!(matches!(err, CalibrationError::InvalidInput { ref field, .. } if field == "therapy.rr_bleeding"));
    // The untreated arm never reads relative risks.
    assert!(build_parameter_set(&inputs, Therapy::None).is_ok());
}

#[test]
fn rotating_baseline_has_no_real_generator() {
    let mut inputs = ClinicalInputs::default();
    inputs.baseline.transition_matrix = vec![
        vec![0.1, 0.9, 0.0, 0.0, 0.0],
        vec![0.0, 0.1, 0.9, 0.0, 0.0],
        vec![0.9, 0.0, 0.1, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 1.0],
    ];
    let err = build_parameter_set(&inputs, Therapy::None).unwrap_err();
    assert!(
        matches!(err, CalibrationError::Numerical(NumericalError::ComplexEigenvalue { .. })),
        "{err:?}"
    );
    let unified: mc_common::Error = err.into();
    assert_eq!(unified.code(), 32);
}

#[test]
fn leaking_death_row_is_a_validation_error() {
    let mut inputs = ClinicalInputs::default();
    inputs.baseline.transition_matrix[3] = vec![0.0, 0.0, 0.0, 0.99, 0.01];
    assert!(matches!(
        build_parameter_set(&inputs, Therapy::None),
        Err(CalibrationError::Validation(_))
    ));
}
