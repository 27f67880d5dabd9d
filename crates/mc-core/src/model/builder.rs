//! Row-by-row assembly of the baseline annual transition matrix.

use mc_common::{HealthState, NUM_STATES};

use super::matrix::{StateArray, TransitionProbabilityMatrix, ValidationError};

/// Collects one probability row per health state.
///
/// Absorbing states must be given explicitly as identity rows; nothing is
/// inferred for missing rows.
#[derive(Debug, Clone, Default)]
pub struct TransitionMatrixBuilder {
    rows: [Option<[f64; NUM_STATES]>; NUM_STATES],
}

impl TransitionMatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outgoing distribution of `state`, replacing any earlier row.
    pub fn row(mut self, state: HealthState, probs: [f64; NUM_STATES]) -> Self {
        self.rows[state.to_index()] = Some(probs);
        self
    }

    /// Set `state` to stay put with probability one.
    pub fn absorbing(self, state: HealthState) -> Self {
        let mut probs = [0.0; NUM_STATES];
        probs[state.to_index()] = 1.0;
        self.row(state, probs)
    }

    /// Load rows from a table in [`HealthState::ALL`] order.
    pub fn from_rows(table: &[Vec<f64>]) -> Result<Self, ValidationError> {
        let ragged = table.iter().find(|r| r.len() != NUM_STATES);
        if table.len() != NUM_STATES || ragged.is_some() {
            return Err(ValidationError::Shape {
                rows: table.len(),
                cols: ragged.map_or(NUM_STATES, Vec::len),
            });
        }
        let mut builder = Self::new();
        for (state, values) in HealthState::ALL.into_iter().zip(table) {
            let mut probs = [0.0; NUM_STATES];
            probs.copy_from_slice(values);
            builder = builder.row(state, probs);
        }
        Ok(builder)
    }

    /// Validate and produce the matrix.
    pub fn build(self) -> Result<TransitionProbabilityMatrix, ValidationError> {
        let mut probs: StateArray = [[0.0; NUM_STATES]; NUM_STATES];
        for (state, (slot, row)) in HealthState::ALL
            .into_iter()
            .zip(self.rows.iter().zip(probs.iter_mut()))
        {
            *row = slot.ok_or(ValidationError::MissingRow(state))?;
        }
        TransitionProbabilityMatrix::new(probs)
    }
}
