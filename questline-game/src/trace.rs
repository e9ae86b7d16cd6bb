//! Explainability telemetry for weighted event selection.
use serde::{Deserialize, Serialize};

/// Record of a single selection: which pool was drawn from, the roll, and the
/// candidate weights that were considered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDecisionTrace {
    /// Identifier for the selection pool (e.g., `questline.events.negative`).
    pub pool_id: String,
    /// Percentage roll that decided between the negative and positive pools,
    /// when both were eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_roll: Option<u32>,
    /// Weighted draw in `1..=total_weight`.
    pub roll: u64,
    pub candidates: Vec<WeightedCandidate>,
    pub chosen_id: String,
}

impl EventDecisionTrace {
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.candidates
            .iter()
            .map(|candidate| u64::from(candidate.weight))
            .sum()
    }
}

/// Candidate weight telemetry captured during event selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub weight: u32,
}
