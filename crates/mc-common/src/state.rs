//! Health states and therapy arms of the stroke cohort model.
//!
//! The order of [`HealthState::ALL`] is the index basis for every matrix and
//! per-state table in the workspace.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of health states in the cohort model.
pub const NUM_STATES: usize = 5;

/// Mutually exclusive health state of a cohort member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// No history of stroke.
    Well = 0,
    /// Acute stroke episode.
    Stroke = 1,
    /// Survived at least one stroke.
    PostStroke = 2,
    /// Stroke-related death (absorbing).
    Death = 3,
    /// Death from causes unrelated to stroke (absorbing).
    BackgroundDeath = 4,
}

impl HealthState {
    /// All states in index order.
    pub const ALL: [HealthState; NUM_STATES] = [
        HealthState::Well,
        HealthState::Stroke,
        HealthState::PostStroke,
        HealthState::Death,
        HealthState::BackgroundDeath,
    ];

    /// Convert from index to state.
    pub fn from_index(idx: usize) -> Option<HealthState> {
        match idx {
            0 => Some(HealthState::Well),
            1 => Some(HealthState::Stroke),
            2 => Some(HealthState::PostStroke),
            3 => Some(HealthState::Death),
            4 => Some(HealthState::BackgroundDeath),
            _ => None,
        }
    }

    /// Convert state to index.
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Absorbing states have no outgoing transitions other than to themselves.
    pub fn is_absorbing(self) -> bool {
        matches!(self, HealthState::Death | HealthState::BackgroundDeath)
    }

    /// Iterator over the non-absorbing (transient) states.
    pub fn transient() -> impl Iterator<Item = HealthState> {
        Self::ALL.into_iter().filter(|s| !s.is_absorbing())
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            HealthState::Well => "No stroke history",
            HealthState::Stroke => "Acute stroke episode",
            HealthState::PostStroke => "Stroke survivor",
            HealthState::Death => "Stroke-related death",
            HealthState::BackgroundDeath => "Death from other causes",
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Well => write!(f, "Well"),
            HealthState::Stroke => write!(f, "Stroke"),
            HealthState::PostStroke => write!(f, "PostStroke"),
            HealthState::Death => write!(f, "Death"),
            HealthState::BackgroundDeath => write!(f, "BackgroundDeath"),
        }
    }
}

/// Treatment arm selecting which adjustment pipeline produces the matrix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Therapy {
    /// Untreated arm.
    #[default]
    None,
    /// Anticoagulation arm.
    Anticoagulation,
}

impl Therapy {
    /// Both arms in a stable order.
    pub const ALL: [Therapy; 2] = [Therapy::None, Therapy::Anticoagulation];
}

impl std::fmt::Display for Therapy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Therapy::None => write!(f, "none"),
            Therapy::Anticoagulation => write!(f, "anticoagulation"),
        }
    }
}
