//! Fuzz target for clinical.json parsing and validation.
//!
//! Arbitrary bytes must never panic the loader; anything that passes
//! validation must also calibrate without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_common::Therapy;
use mc_config::{validate_inputs, ClinicalInputs};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(inputs) = ClinicalInputs::from_json(text) else {
        return;
    };
    if validate_inputs(&inputs).is_ok() {
        let _ = mc_core::calibrate(&inputs, &Therapy::ALL);
    }
});
