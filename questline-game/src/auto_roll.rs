//! Resolution of probability-gated events.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::constants::PERCENT_ROLL_MAX;
use crate::data::AutoRoll;
use crate::effects::{EffectOutcome, apply_effects};
use crate::formula::resolve_probability_or;
use crate::state::CharacterState;

/// Outcome of an auto-roll check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRollOutcome {
    pub success: bool,
    /// Percentage roll in `1..=100`.
    pub roll: u32,
    /// Success chance the roll was compared against.
    pub chance: u32,
    pub description: String,
    pub effects: EffectOutcome,
}

/// Roll against the rule's formula and apply the matching effect branch.
pub fn resolve_auto_roll<R: Rng + ?Sized>(
    state: &mut CharacterState,
    rule: &AutoRoll,
    cfg: &EngineConfig,
    rng: &mut R,
) -> AutoRollOutcome {
    let chance = resolve_probability_or(
        &rule.success_probability,
        &state.attributes,
        cfg.default_probability,
    );
    let roll = rng.gen_range(1..=PERCENT_ROLL_MAX);
    let success = roll <= chance;
    log::debug!("auto-roll {roll} vs {chance}% -> {}", if success { "success" } else { "failure" });
    let (branch, description) = if success {
        (&rule.success_effects, &rule.success_description)
    } else {
        (&rule.failure_effects, &rule.failure_description)
    };
    let effects = apply_effects(state, branch, cfg, rng);
    AutoRollOutcome {
        success,
        roll,
        chance,
        description: description.clone(),
        effects,
    }
}
