//! Fuzz target for probability matrix to generator conversion.
//!
//! Row-stochastic inputs built from arbitrary weights must either convert
//! to a valid generator or fail with an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_common::{HealthState, NUM_STATES};
use mc_core::model::{to_generator, to_probability, TransitionMatrixBuilder};

fuzz_target!(|weights: [[u8; NUM_STATES]; 3]| {
    let mut builder = TransitionMatrixBuilder::new();
    for (state, row) in HealthState::transient().into_iter().zip(weights) {
        let total: f64 = row.iter().map(|&w| f64::from(w)).sum();
        if total == 0.0 {
            return;
        }
        builder = builder.row(state, row.map(|w| f64::from(w) / total));
    }
    let builder = builder
        .absorbing(HealthState::Death)
        .absorbing(HealthState::BackgroundDeath);
    let Ok(matrix) = builder.build() else {
        return;
    };
    if let Ok(embedding) = to_generator(&matrix, 1.0) {
        let _ = to_probability(&embedding.generator, 1.0 / 12.0);
    }
});
