//! Discrete ⇄ continuous conversion of transition matrices.
//!
//! `to_generator` takes the real matrix logarithm of an interval probability
//! matrix and regularizes the result into a valid generator:
//!
//!   Q = log(P) / interval, then clamp Q[i][j] < 0 (i≠j) to 0 and reset the
//!   diagonal so every row sums to 0.
//!
//! `to_probability` exponentiates `Q · interval`. Both force absorbing rows
//! back to exact zero (generator) or identity (probability) rows.

use mc_common::{HealthState, NUM_STATES};
use mc_math::{expm, logm_real, NumericalError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::matrix::{
    set_diagonal, GeneratorMatrix, StateArray, TransitionProbabilityMatrix, ValidationError,
};

/// Negative entries of `exp(Q·t)` or `log(P)` above this value are round-off.
pub const NEGATIVE_ROUNDOFF: f64 = 1e-12;

/// Largest row-sum deviation of `exp(Q·t)` absorbed by renormalization.
pub const ROW_DRIFT_TOLERANCE: f64 = 1e-9;

/// What regularization had to change to obtain a valid generator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Regularization {
    /// Negative off-diagonal rates clamped to zero.
    pub clamped_entries: usize,
    /// Sum of the magnitudes of the clamped rates.
    pub clamped_mass: f64,
    /// Negative eigenvalues of the probability matrix whose modulus was used.
    pub negative_eigenvalues: usize,
}

impl Regularization {
    /// Whether `exp(Q·interval)` reproduces the input up to round-off.
    pub fn is_exact(&self) -> bool {
        self.clamped_entries == 0 && self.negative_eigenvalues == 0
    }
}

/// Generator recovered from an interval probability matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub generator: GeneratorMatrix,
    pub regularization: Regularization,
}

/// Probability matrix obtained from a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretization {
    pub matrix: TransitionProbabilityMatrix,
    /// Largest total exit rate `max_i(-Q[i][i])` of the exponentiated
    /// generator, per unit time. Times the interval, this bounds how far the
    /// result sits from the identity.
    pub max_exit_rate: f64,
}

fn check_interval(interval: f64) -> Result<(), NumericalError> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(NumericalError::InvalidInterval(interval));
    }
    Ok(())
}

/// Translate a structural violation left after conversion.
fn conversion_failure(err: ValidationError) -> NumericalError {
    match err {
        ValidationError::NegativeProbability { from, to, value }
        | ValidationError::NegativeRate { from, to, value } => NumericalError::NegativeEntry {
            row: from.to_index(),
            col: to.to_index(),
            value,
        },
        ValidationError::RowSum { state, sum } | ValidationError::GeneratorRowSum { state, sum } => {
            NumericalError::RowSumDrift {
                row: state.to_index(),
                sum,
            }
        }
        ValidationError::AbsorbingRow { state }
        | ValidationError::AbsorbingGeneratorRow { state } => NumericalError::RowSumDrift {
            row: state.to_index(),
            sum: f64::NAN,
        },
        ValidationError::Shape { rows, cols } => NumericalError::NotSquare { rows, cols },
        ValidationError::NonFinite { .. } | ValidationError::MissingRow(_) => {
            NumericalError::NonFinite
        }
    }
}

/// Turn raw log-rates into a valid generator.
///
/// Negative off-diagonals are clamped to zero, absorbing rows are zeroed and
/// every diagonal is reset to minus its row's off-diagonal sum. Negatives
/// within [`NEGATIVE_ROUNDOFF`] of zero, scaled by the row's exit rate, are
/// round-off: they are zeroed but not reported.
pub fn regularize(raw: StateArray) -> Result<(GeneratorMatrix, Regularization), NumericalError> {
    if raw.iter().flatten().any(|r| !r.is_finite()) {
        return Err(NumericalError::NonFinite);
    }
    let mut rates = raw;
    let mut report = Regularization::default();
    for (state, row) in HealthState::ALL.into_iter().zip(rates.iter_mut()) {
        if state.is_absorbing() {
            *row = [0.0; NUM_STATES];
            continue;
        }
        let i = state.to_index();
        let tolerance = NEGATIVE_ROUNDOFF * row[i].abs().max(1.0);
        for (j, r) in row.iter_mut().enumerate() {
            if j == i || *r >= 0.0 {
                continue;
            }
            if *r < -tolerance {
                report.clamped_entries += 1;
                report.clamped_mass += -*r;
            }
            *r = 0.0;
        }
    }
    set_diagonal(&mut rates);
    let generator = GeneratorMatrix::new(rates).map_err(conversion_failure)?;
    Ok((generator, report))
}

/// Generator `Q` with `P ≈ exp(Q · interval)`.
pub fn to_generator(
    p: &TransitionProbabilityMatrix,
    interval: f64,
) -> Result<Embedding, NumericalError> {
    check_interval(interval)?;
    let log = logm_real(&p.to_dmatrix())?;

    let mut raw = [[0.0; NUM_STATES]; NUM_STATES];
    for (i, row) in raw.iter_mut().enumerate() {
        for (j, r) in row.iter_mut().enumerate() {
            *r = log.matrix[(i, j)] / interval;
        }
    }

    let (generator, mut regularization) = regularize(raw)?;
    regularization.negative_eigenvalues = log.negative_eigenvalues;

    if !regularization.is_exact() {
        warn!(
            clamped_entries = regularization.clamped_entries,
            clamped_mass = regularization.clamped_mass,
            negative_eigenvalues = regularization.negative_eigenvalues,
            "probability matrix has no exact generator; regularized"
        );
    }
    debug!(interval, rates = ?generator.rates(), "recovered generator");

    Ok(Embedding {
        generator,
        regularization,
    })
}

/// Probability matrix `P = exp(Q · interval)`.
pub fn to_probability(q: &GeneratorMatrix, interval: f64) -> Result<Discretization, NumericalError> {
    check_interval(interval)?;
    let exp = expm(&(q.to_dmatrix() * interval))?;

    let mut probs = [[0.0; NUM_STATES]; NUM_STATES];
    for (state, row) in HealthState::ALL.into_iter().zip(probs.iter_mut()) {
        let i = state.to_index();
        if state.is_absorbing() {
            row[i] = 1.0;
            continue;
        }
        for (j, p) in row.iter_mut().enumerate() {
            let value = exp[(i, j)];
            if value < -NEGATIVE_ROUNDOFF {
                return Err(NumericalError::NegativeEntry { row: i, col: j, value });
            }
            *p = value.max(0.0);
        }
        let sum: f64 = row.iter().sum();
        if (sum - 1.0).abs() > ROW_DRIFT_TOLERANCE {
            return Err(NumericalError::RowSumDrift { row: i, sum });
        }
        for p in row.iter_mut() {
            *p /= sum;
        }
    }

    let matrix = TransitionProbabilityMatrix::new(probs).map_err(conversion_failure)?;
    debug!(interval, probs = ?matrix.probs(), "discretized generator");

    Ok(Discretization {
        matrix,
        max_exit_rate: q.max_exit_rate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransitionMatrixBuilder;
    use HealthState::*;

    fn reference_matrix() -> TransitionProbabilityMatrix {
        TransitionMatrixBuilder::new()
            .row(Well, [0.75, 0.15, 0.0, 0.1, 0.0])
            .row(Stroke, [0.0, 0.0, 1.0, 0.0, 0.0])
            .row(PostStroke, [0.0, 0.25, 0.55, 0.2, 0.0])
            .absorbing(Death)
            .absorbing(BackgroundDeath)
            .build()
            .unwrap()
    }

    fn progressive_generator() -> GeneratorMatrix {
        let mut rates = [[0.0; NUM_STATES]; NUM_STATES];
        rates[Well.to_index()][Stroke.to_index()] = 0.0136;
        rates[Well.to_index()][Death.to_index()] = 0.0004;
        rates[Well.to_index()][BackgroundDeath.to_index()] = 0.018;
        rates[Stroke.to_index()][PostStroke.to_index()] = 4.0;
        rates[Stroke.to_index()][Death.to_index()] = 0.5;
        rates[PostStroke.to_index()][Death.to_index()] = 0.2;
        GeneratorMatrix::from_off_diagonal(rates).unwrap()
    }

    #[test]
    fn zero_generator_discretizes_to_identity() {
        let q = GeneratorMatrix::from_off_diagonal([[0.0; NUM_STATES]; NUM_STATES]).unwrap();
        let d = to_probability(&q, 1.0).unwrap();
        assert_eq!(d.matrix, TransitionProbabilityMatrix::identity());
        assert_eq!(d.max_exit_rate, 0.0);
    }

    #[test]
    fn embeddable_matrix_round_trips_exactly() {
        let q = progressive_generator();
        let p = to_probability(&q, 1.0).unwrap().matrix;
        let embedding = to_generator(&p, 1.0).unwrap();
        assert!(embedding.regularization.is_exact());
        assert!(embedding.generator.max_abs_diff(&q) < 1e-9);
    }

    #[test]
    fn interval_scales_rates() {
        let q = progressive_generator();
        let p_half = to_probability(&q, 0.5).unwrap().matrix;
        let embedding = to_generator(&p_half, 0.5).unwrap();
        assert!(embedding.generator.max_abs_diff(&q) < 1e-9);
    }

    #[test]
    fn reference_matrix_needs_regularization() {
        let embedding = to_generator(&reference_matrix(), 1.0).unwrap();
        // The Stroke/PostStroke block has eigenvalue ≈ -0.2956.
        assert_eq!(embedding.regularization.negative_eigenvalues, 1);
        assert!(!embedding.regularization.is_exact());

        let q = embedding.generator;
        for state in HealthState::ALL {
            let sum: f64 = q.rates()[state.to_index()].iter().sum();
            assert!(sum.abs() < 1e-12, "row {state} sums to {sum}");
            for to in HealthState::ALL {
                if to != state {
                    assert!(q.rate(state, to) >= 0.0);
                }
            }
        }
        assert_eq!(q.exit_rate(Death), 0.0);
        assert_eq!(q.exit_rate(BackgroundDeath), 0.0);
    }

    #[test]
    fn discretization_keeps_absorbing_rows_exact() {
        let d = to_probability(&progressive_generator(), 1.0 / 12.0).unwrap();
        assert_eq!(d.matrix.row(Death), &[0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(d.matrix.row(BackgroundDeath), &[0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!((d.max_exit_rate - 4.5).abs() < 1e-15);
    }

    #[test]
    fn regularize_clamps_and_rebalances() {
        let mut raw = [[0.0; NUM_STATES]; NUM_STATES];
        raw[Well.to_index()] = [-0.2, 0.25, -0.05, 0.0, 0.0];
        raw[Death.to_index()] = [1e-14, 0.0, 0.0, -1e-14, 0.0];
        let (q, report) = regularize(raw).unwrap();

        assert_eq!(report.clamped_entries, 1);
        assert!((report.clamped_mass - 0.05).abs() < 1e-15);
        assert_eq!(q.rate(Well, PostStroke), 0.0);
        assert!((q.exit_rate(Well) - 0.25).abs() < 1e-15);
        assert_eq!(q.rates()[Death.to_index()], [0.0; NUM_STATES]);
    }

    #[test]
    fn regularize_ignores_round_off_negatives() {
        let mut raw = [[0.0; NUM_STATES]; NUM_STATES];
        raw[Well.to_index()] = [-0.03, 0.03, -1.5e-17, -2e-17, 0.0];
        raw[Stroke.to_index()] = [-3e-12, -4.5, 4.0, 0.5, 0.0];
        let (q, report) = regularize(raw).unwrap();

        // Stroke's exit rate widens the tolerance to 4.5e-12.
        assert!(report.is_exact(), "{report:?}");
        assert_eq!(report.clamped_mass, 0.0);
        assert_eq!(q.rate(Well, PostStroke), 0.0);
        assert_eq!(q.rate(Stroke, Well), 0.0);
        assert!((q.exit_rate(Stroke) - 4.5).abs() < 1e-15);
    }

    #[test]
    fn regularized_round_trip_deviation_is_bounded() {
        let p = reference_matrix();
        let embedding = to_generator(&p, 1.0).unwrap();
        assert!(!embedding.regularization.is_exact());

        let back = to_probability(&embedding.generator, 1.0).unwrap().matrix;
        let diff = back.max_abs_diff(&p);
        // The deterministic Stroke → PostStroke step has no continuous-time
        // counterpart; exp(log|P|) spreads it over Stroke, PostStroke and Death.
        assert!(diff > 0.5 && diff < 0.55, "max diff {diff}");
        assert!((back.prob(Stroke, PostStroke) - 0.482).abs() < 0.01);
        assert!((back.prob(Stroke, Stroke) - 0.438).abs() < 0.01);
        assert!((back.prob(Stroke, Death) - 0.080).abs() < 0.01);
        assert_eq!(back.row(Death), p.row(Death));
        assert_eq!(back.row(BackgroundDeath), p.row(BackgroundDeath));
        for state in HealthState::ALL {
            assert!((back.row(state).iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn regularize_rejects_non_finite() {
        let mut raw = [[0.0; NUM_STATES]; NUM_STATES];
        raw[Stroke.to_index()][Death.to_index()] = f64::INFINITY;
        assert_eq!(regularize(raw).unwrap_err(), NumericalError::NonFinite);
    }

    #[test]
    fn invalid_intervals_are_rejected() {
        let q = progressive_generator();
        assert_eq!(
            to_probability(&q, 0.0).unwrap_err(),
            NumericalError::InvalidInterval(0.0)
        );
        assert!(matches!(
            to_generator(&reference_matrix(), -1.0),
            Err(NumericalError::InvalidInterval(_))
        ));
    }

    #[test]
    fn singular_probability_matrix_has_no_generator() {
        // Well jumps straight to Stroke; the Well eigenvalue is zero.
        let p = TransitionMatrixBuilder::new()
            .row(Well, [0.0, 1.0, 0.0, 0.0, 0.0])
            .row(Stroke, [0.0, 0.5, 0.5, 0.0, 0.0])
            .row(PostStroke, [0.0, 0.0, 0.9, 0.1, 0.0])
            .absorbing(Death)
            .absorbing(BackgroundDeath)
            .build()
            .unwrap();
        assert!(matches!(
            to_generator(&p, 1.0),
            Err(NumericalError::Singular(_))
        ));
    }
}
