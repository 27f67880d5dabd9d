//! Fuzz target for hazard derivation from clinical statistics.
//!
//! Every derived rate is either an error or finite and non-negative.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mc_config::HazardInputs;
use mc_core::calibrate::ClinicalHazards;

#[derive(Debug, Arbitrary)]
struct Statistics {
    crude_deaths_per_1000: f64,
    crude_scale: f64,
    stroke_deaths: f64,
    population: f64,
    first_stroke_probability: f64,
    stroke_survival_share: f64,
    recurrence_cumulative_incidence: f64,
    attributable_fraction: f64,
    follow_up_years: f64,
    recurrence_stroke_share: f64,
    stroke_duration: f64,
}

fuzz_target!(|stats: Statistics| {
    let inputs = HazardInputs {
        crude_deaths_per_1000: stats.crude_deaths_per_1000,
        crude_scale: stats.crude_scale,
        stroke_deaths: stats.stroke_deaths,
        population: stats.population,
        first_stroke_probability: stats.first_stroke_probability,
        stroke_survival_share: stats.stroke_survival_share,
        recurrence_cumulative_incidence: stats.recurrence_cumulative_incidence,
        attributable_fraction: stats.attributable_fraction,
        follow_up_years: stats.follow_up_years,
        recurrence_stroke_share: stats.recurrence_stroke_share,
        stroke_duration: stats.stroke_duration,
    };
    if let Ok(hazards) = ClinicalHazards::from_inputs(&inputs) {
        for rate in [
            hazards.background_mortality,
            hazards.stroke_mortality,
            hazards.first_stroke,
            hazards.recurrence,
            hazards.stroke_clearance,
        ] {
            assert!(rate.is_finite() && rate >= 0.0, "bad rate {rate}");
        }
    }
});
