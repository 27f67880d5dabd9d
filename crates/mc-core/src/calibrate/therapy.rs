//! Relative-risk adjustment for the anticoagulation arm.
//!
//! Only the PostStroke row changes. In the annual baseline generator,
//!
//!   Q'[PostStroke][Stroke]          = RR_stroke   · Q[PostStroke][Stroke]
//!   Q'[PostStroke][BackgroundDeath] = RR_bleeding · Q[PostStroke][BackgroundDeath]
//!
//! and the treated PostStroke probability row is the PostStroke row of
//! `exp(Q')`. Every other row is copied verbatim from the discrete baseline
//! matrix. When the background mortality overlay runs, it starts from `Q'`
//! itself, so rows the relative risks do not touch keep the baseline rates.

use mc_common::HealthState;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CalibrationError;
use crate::model::{
    to_probability, GeneratorMatrix, TransitionProbabilityMatrix, ValidationError,
};

/// Treatment relative risks applied to PostStroke transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeRisks {
    /// Multiplier on PostStroke → Stroke.
    pub stroke: f64,
    /// Multiplier on PostStroke → BackgroundDeath.
    pub bleeding: f64,
}

impl RelativeRisks {
    pub fn new(stroke: f64, bleeding: f64) -> Result<Self, CalibrationError> {
        for (field, rr) in [("therapy.rr_stroke", stroke), ("therapy.rr_bleeding", bleeding)] {
            if !rr.is_finite() || rr < 0.0 {
                return Err(CalibrationError::invalid_input(
                    field,
                    format!("relative risk must be non-negative and finite, got {rr}"),
                ));
            }
        }
        Ok(Self { stroke, bleeding })
    }
}

/// Treated-arm annual matrix and the generator its PostStroke row came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapyOutcome {
    /// Baseline generator with the PostStroke row rescaled.
    pub generator: GeneratorMatrix,
    /// Annual treated-arm probability matrix.
    pub annual: TransitionProbabilityMatrix,
}

/// Applies [`RelativeRisks`] to the baseline.
#[derive(Debug, Clone, Copy)]
pub struct TherapyAdjustment {
    risks: RelativeRisks,
}

impl TherapyAdjustment {
    pub fn new(risks: RelativeRisks) -> Self {
        Self { risks }
    }

    pub fn risks(&self) -> RelativeRisks {
        self.risks
    }

    /// Rescale the PostStroke row of `base`.
    pub fn adjust_generator(&self, base: &GeneratorMatrix) -> Result<GeneratorMatrix, ValidationError> {
        use HealthState::*;

        let mut rates = *base.rates();
        let row = &mut rates[PostStroke.to_index()];
        row[Stroke.to_index()] *= self.risks.stroke;
        row[BackgroundDeath.to_index()] *= self.risks.bleeding;
        GeneratorMatrix::from_off_diagonal(rates)
    }

    /// Treated-arm annual matrix.
    ///
    /// `baseline_generator` must be the annual generator of `baseline`.
    pub fn apply(
        &self,
        baseline: &TransitionProbabilityMatrix,
        baseline_generator: &GeneratorMatrix,
    ) -> Result<TherapyOutcome, CalibrationError> {
        let generator = self.adjust_generator(baseline_generator)?;
        let treated = to_probability(&generator, 1.0)?.matrix;

        let mut probs = *baseline.probs();
        let post = HealthState::PostStroke.to_index();
        probs[post] = *treated.row(HealthState::PostStroke);
        let annual = TransitionProbabilityMatrix::new(probs)?;

        debug!(
            rr_stroke = self.risks.stroke,
            rr_bleeding = self.risks.bleeding,
            post_stroke_row = ?annual.row(HealthState::PostStroke),
            "therapy adjustment applied"
        );

        Ok(TherapyOutcome { generator, annual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HealthState::*;

    fn survivor_generator() -> GeneratorMatrix {
        let mut rates = [[0.0; 5]; 5];
        rates[Well.to_index()][Stroke.to_index()] = 0.0136;
        rates[Stroke.to_index()][PostStroke.to_index()] = 52.0;
        rates[Stroke.to_index()][Death.to_index()] = 0.0015;
        rates[PostStroke.to_index()][Stroke.to_index()] = 0.0298;
        rates[PostStroke.to_index()][Death.to_index()] = 0.0075;
        rates[PostStroke.to_index()][BackgroundDeath.to_index()] = 0.018;
        GeneratorMatrix::from_off_diagonal(rates).unwrap()
    }

    #[test]
    fn relative_risks_are_validated() {
        assert!(RelativeRisks::new(0.65, 1.05).is_ok());
        assert!(RelativeRisks::new(0.0, 0.0).is_ok());
        assert!(matches!(
            RelativeRisks::new(-0.1, 1.0),
            Err(CalibrationError::InvalidInput { .. })
        ));
        assert!(RelativeRisks::new(0.5, f64::INFINITY).is_err());
    }

    #[test]
    fn only_post_stroke_rates_are_scaled() {
        let base = survivor_generator();
        let adj = TherapyAdjustment::new(RelativeRisks::new(0.65, 1.05).unwrap());
        let q = adj.adjust_generator(&base).unwrap();

        assert_eq!(q.rate(PostStroke, Stroke), 0.65 * base.rate(PostStroke, Stroke));
        assert_eq!(
            q.rate(PostStroke, BackgroundDeath),
            1.05 * base.rate(PostStroke, BackgroundDeath)
        );
        assert_eq!(q.rate(PostStroke, Death), base.rate(PostStroke, Death));
        let sum: f64 = q.rates()[PostStroke.to_index()].iter().sum();
        assert!(sum.abs() < 1e-15);
        for state in [Well, Stroke, Death, BackgroundDeath] {
            assert_eq!(q.rates()[state.to_index()], base.rates()[state.to_index()]);
        }
    }

    #[test]
    fn untouched_rows_come_from_discrete_baseline() {
        let base = survivor_generator();
        let baseline = to_probability(&base, 1.0).unwrap().matrix;
        let adj = TherapyAdjustment::new(RelativeRisks::new(0.65, 1.05).unwrap());
        let outcome = adj.apply(&baseline, &base).unwrap();

        for state in [Well, Stroke, Death, BackgroundDeath] {
            assert_eq!(outcome.annual.row(state), baseline.row(state));
        }
        assert!(outcome.annual.prob(PostStroke, Stroke) < baseline.prob(PostStroke, Stroke));
        assert!(
            outcome.annual.prob(PostStroke, BackgroundDeath)
                > baseline.prob(PostStroke, BackgroundDeath)
        );
    }

    #[test]
    fn unit_risks_leave_matrix_unchanged() {
        let base = survivor_generator();
        let baseline = to_probability(&base, 1.0).unwrap().matrix;
        let adj = TherapyAdjustment::new(RelativeRisks::new(1.0, 1.0).unwrap());
        let outcome = adj.apply(&baseline, &base).unwrap();
        assert!(outcome.annual.max_abs_diff(&baseline) < 1e-15);
        assert_eq!(outcome.generator, base);
    }
}
