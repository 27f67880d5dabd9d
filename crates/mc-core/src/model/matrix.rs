//! Discrete-time transition probability and continuous-time generator
//! matrices over [`HealthState`].
//!
//! Both types validate on construction and are immutable afterwards, so a
//! value in hand always satisfies its stochastic invariants:
//!
//! - probability rows are non-negative and sum to 1, absorbing rows are
//!   identity rows;
//! - generator off-diagonals are non-negative, rows sum to 0, absorbing rows
//!   are all zero.

use mc_common::{HealthState, NUM_STATES};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for a probability row summing to 1.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Tolerance for a generator row summing to 0, relative to its exit rate.
pub const GENERATOR_ROW_TOLERANCE: f64 = 1e-9;

/// Square array indexed `[from][to]` in [`HealthState::ALL`] order.
pub type StateArray = [[f64; NUM_STATES]; NUM_STATES];

/// Structural violation of a probability or generator matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected a {NUM_STATES}x{NUM_STATES} matrix, got {rows}x{cols}")]
    Shape { rows: usize, cols: usize },

    #[error("entry {from}->{to} is not finite")]
    NonFinite { from: HealthState, to: HealthState },

    #[error("probability {from}->{to} is negative: {value}")]
    NegativeProbability {
        from: HealthState,
        to: HealthState,
        value: f64,
    },

    #[error("row {state} sums to {sum}, expected 1")]
    RowSum { state: HealthState, sum: f64 },

    #[error("absorbing state {state} must have an identity row")]
    AbsorbingRow { state: HealthState },

    #[error("rate {from}->{to} is negative: {value}")]
    NegativeRate {
        from: HealthState,
        to: HealthState,
        value: f64,
    },

    #[error("generator row {state} sums to {sum}, expected 0")]
    GeneratorRowSum { state: HealthState, sum: f64 },

    #[error("absorbing state {state} must have a zero generator row")]
    AbsorbingGeneratorRow { state: HealthState },

    #[error("no row supplied for state {0}")]
    MissingRow(HealthState),
}

fn check_finite(values: &StateArray) -> Result<(), ValidationError> {
    for (from, row) in HealthState::ALL.into_iter().zip(values.iter()) {
        for (to, &v) in HealthState::ALL.into_iter().zip(row.iter()) {
            if !v.is_finite() {
                return Err(ValidationError::NonFinite { from, to });
            }
        }
    }
    Ok(())
}

fn to_state_array(m: &DMatrix<f64>) -> Result<StateArray, ValidationError> {
    if m.nrows() != NUM_STATES || m.ncols() != NUM_STATES {
        return Err(ValidationError::Shape {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    let mut out = [[0.0; NUM_STATES]; NUM_STATES];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = m[(i, j)];
        }
    }
    Ok(out)
}

fn to_dmatrix(values: &StateArray) -> DMatrix<f64> {
    DMatrix::from_fn(NUM_STATES, NUM_STATES, |i, j| values[i][j])
}

/// Row-stochastic transition probability matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StateArray", into = "StateArray")]
pub struct TransitionProbabilityMatrix {
    probs: StateArray,
}

impl TransitionProbabilityMatrix {
    /// Validate and wrap a probability array.
    pub fn new(probs: StateArray) -> Result<Self, ValidationError> {
        check_finite(&probs)?;
        for (from, row) in HealthState::ALL.into_iter().zip(probs.iter()) {
            for (to, &p) in HealthState::ALL.into_iter().zip(row.iter()) {
                if p < 0.0 {
                    return Err(ValidationError::NegativeProbability { from, to, value: p });
                }
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ValidationError::RowSum { state: from, sum });
            }
            if from.is_absorbing()
                && row
                    .iter()
                    .enumerate()
                    .any(|(j, &p)| p != if j == from.to_index() { 1.0 } else { 0.0 })
            {
                return Err(ValidationError::AbsorbingRow { state: from });
            }
        }
        Ok(Self { probs })
    }

    /// Identity matrix: every state stays where it is.
    pub fn identity() -> Self {
        let mut probs = [[0.0; NUM_STATES]; NUM_STATES];
        for (i, row) in probs.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { probs }
    }

    /// Validate a dense matrix.
    pub fn from_dmatrix(m: &DMatrix<f64>) -> Result<Self, ValidationError> {
        Self::new(to_state_array(m)?)
    }

    /// P(to | from) over one interval.
    pub fn prob(&self, from: HealthState, to: HealthState) -> f64 {
        self.probs[from.to_index()][to.to_index()]
    }

    /// Outgoing distribution of `state`.
    pub fn row(&self, state: HealthState) -> &[f64; NUM_STATES] {
        &self.probs[state.to_index()]
    }

    pub fn probs(&self) -> &StateArray {
        &self.probs
    }

    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        to_dmatrix(&self.probs)
    }

    /// Largest absolute entrywise difference.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        max_abs_diff(&self.probs, &other.probs)
    }
}

impl TryFrom<StateArray> for TransitionProbabilityMatrix {
    type Error = ValidationError;

    fn try_from(probs: StateArray) -> Result<Self, Self::Error> {
        Self::new(probs)
    }
}

impl From<TransitionProbabilityMatrix> for StateArray {
    fn from(m: TransitionProbabilityMatrix) -> Self {
        m.probs
    }
}

/// Continuous-time generator (rate) matrix Q.
///
/// Q[i][j] for j≠i is the hazard of moving from i to j and
/// Q[i][i] = −Σ_{j≠i} Q[i][j].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StateArray", into = "StateArray")]
pub struct GeneratorMatrix {
    rates: StateArray,
}

impl GeneratorMatrix {
    /// Validate and wrap a rate array.
    pub fn new(rates: StateArray) -> Result<Self, ValidationError> {
        check_finite(&rates)?;
        for (from, row) in HealthState::ALL.into_iter().zip(rates.iter()) {
            if from.is_absorbing() {
                if row.iter().any(|&r| r != 0.0) {
                    return Err(ValidationError::AbsorbingGeneratorRow { state: from });
                }
                continue;
            }
            for (to, &r) in HealthState::ALL.into_iter().zip(row.iter()) {
                if to != from && r < 0.0 {
                    return Err(ValidationError::NegativeRate { from, to, value: r });
                }
            }
            let sum: f64 = row.iter().sum();
            let exit = -row[from.to_index()];
            if sum.abs() > GENERATOR_ROW_TOLERANCE * exit.abs().max(1.0) {
                return Err(ValidationError::GeneratorRowSum { state: from, sum });
            }
        }
        Ok(Self { rates })
    }

    /// Build from off-diagonal rates; the diagonal is derived.
    ///
    /// Diagonal entries of `rates` are ignored.
    pub fn from_off_diagonal(mut rates: StateArray) -> Result<Self, ValidationError> {
        set_diagonal(&mut rates);
        Self::new(rates)
    }

    /// Validate a dense matrix.
    pub fn from_dmatrix(m: &DMatrix<f64>) -> Result<Self, ValidationError> {
        Self::new(to_state_array(m)?)
    }

    /// Hazard of moving `from` → `to`.
    pub fn rate(&self, from: HealthState, to: HealthState) -> f64 {
        self.rates[from.to_index()][to.to_index()]
    }

    /// Total hazard of leaving `state`.
    pub fn exit_rate(&self, state: HealthState) -> f64 {
        -self.rates[state.to_index()][state.to_index()]
    }

    /// Largest total exit rate over all states.
    pub fn max_exit_rate(&self) -> f64 {
        HealthState::ALL
            .into_iter()
            .map(|s| self.exit_rate(s))
            .fold(0.0, f64::max)
    }

    pub fn rates(&self) -> &StateArray {
        &self.rates
    }

    /// Copy with `from` → `to` replaced and the diagonal re-derived.
    pub fn with_rate(
        &self,
        from: HealthState,
        to: HealthState,
        rate: f64,
    ) -> Result<Self, ValidationError> {
        let mut rates = self.rates;
        rates[from.to_index()][to.to_index()] = rate;
        Self::from_off_diagonal(rates)
    }

    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        to_dmatrix(&self.rates)
    }

    /// Largest absolute entrywise difference.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        max_abs_diff(&self.rates, &other.rates)
    }
}

impl TryFrom<StateArray> for GeneratorMatrix {
    type Error = ValidationError;

    fn try_from(rates: StateArray) -> Result<Self, Self::Error> {
        Self::new(rates)
    }
}

impl From<GeneratorMatrix> for StateArray {
    fn from(m: GeneratorMatrix) -> Self {
        m.rates
    }
}

/// Set each diagonal entry to minus the sum of its row's off-diagonals.
pub(crate) fn set_diagonal(rates: &mut StateArray) {
    for (i, row) in rates.iter_mut().enumerate() {
        let off: f64 = row
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, r)| r)
            .sum();
        row[i] = -off;
    }
}

fn max_abs_diff(a: &StateArray, b: &StateArray) -> f64 {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
