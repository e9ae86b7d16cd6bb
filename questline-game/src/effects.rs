//! Applies content effects to the character.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::data::{EffectMap, EffectTarget};
use crate::progression::{LevelUp, check_level_ups};
use crate::state::CharacterState;

/// One applied effect: the target, the rolled delta and the value afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectChange {
    pub target: EffectTarget,
    pub delta: i32,
    pub value: i64,
    /// Upper bound for capped pools (health, magic).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl fmt::Display for EffectChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.target {
            EffectTarget::Attribute(attribute) => attribute.as_str(),
            EffectTarget::Health => "health",
            EffectTarget::Magic => "magic",
            EffectTarget::Experience => "experience",
            EffectTarget::Unknown => "unknown",
        };
        match self.max {
            Some(max) => write!(f, "{label} {:+} (now {}/{max})", self.delta, self.value),
            None => write!(f, "{label} {:+} (now {})", self.delta, self.value),
        }
    }
}

/// Everything an effect map did to the character.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectOutcome {
    pub changes: Vec<EffectChange>,
    pub level_ups: Vec<LevelUp>,
}

impl EffectOutcome {
    /// Human-readable change lines in application order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.changes.iter().map(ToString::to_string).collect()
    }
}

/// Apply `effects` in order, then run the progression check.
///
/// Ranged values are drawn inclusively from `rng`. Health and magic clamp to
/// their pools; attributes and experience are uncapped. Unknown keys are
/// skipped and produce no change line.
pub fn apply_effects<R: Rng + ?Sized>(
    state: &mut CharacterState,
    effects: &EffectMap,
    cfg: &EngineConfig,
    rng: &mut R,
) -> EffectOutcome {
    let mut outcome = EffectOutcome::default();
    for effect in effects {
        if effect.target == EffectTarget::Unknown {
            log::debug!("ignoring unknown effect key `{}`", effect.key);
            continue;
        }
        let (lo, hi) = effect.value.bounds();
        let delta = if lo == hi { lo } else { rng.gen_range(lo..=hi) };
        let change = match effect.target {
            EffectTarget::Attribute(attribute) => {
                let value = state.attributes.get_mut(attribute);
                *value = value.saturating_add(delta);
                EffectChange {
                    target: effect.target,
                    delta,
                    value: i64::from(*value),
                    max: None,
                }
            }
            EffectTarget::Health => {
                state.health = state
                    .health
                    .saturating_add(delta)
                    .min(state.max_health)
                    .max(0);
                EffectChange {
                    target: effect.target,
                    delta,
                    value: i64::from(state.health),
                    max: Some(state.max_health),
                }
            }
            EffectTarget::Magic => {
                state.magic = state.magic.saturating_add(delta).min(state.max_magic).max(0);
                EffectChange {
                    target: effect.target,
                    delta,
                    value: i64::from(state.magic),
                    max: Some(state.max_magic),
                }
            }
            EffectTarget::Experience => {
                state.experience = state.experience.saturating_add(i64::from(delta));
                EffectChange {
                    target: effect.target,
                    delta,
                    value: state.experience,
                    max: None,
                }
            }
            EffectTarget::Unknown => continue,
        };
        outcome.changes.push(change);
    }
    outcome.level_ups = check_level_ups(state, cfg);
    outcome
}
