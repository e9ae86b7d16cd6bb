//! Experience thresholds and level-ups.
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::state::CharacterState;

/// Notification raised for each level gained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    /// Level reached.
    pub level: u32,
    /// Amount added to every attribute.
    pub bonus: i32,
}

/// Experience needed to leave `level`.
#[must_use]
pub fn required_experience(level: u32, cfg: &EngineConfig) -> i64 {
    (i64::from(level) + 1).saturating_mul(cfg.level_experience_step.max(1))
}

/// Convert banked experience into levels until it falls below the next threshold.
pub fn check_level_ups(state: &mut CharacterState, cfg: &EngineConfig) -> Vec<LevelUp> {
    let mut gained = Vec::new();
    loop {
        let required = required_experience(state.level, cfg);
        if state.experience < required || state.level == u32::MAX {
            break;
        }
        state.experience -= required;
        state.level += 1;
        state.attributes.raise_all(cfg.level_up_bonus);
        log::debug!("level up to {} (bonus {})", state.level, cfg.level_up_bonus);
        gained.push(LevelUp {
            level: state.level,
            bonus: cfg.level_up_bonus,
        });
    }
    gained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;

    #[test]
    fn two_hundred_fifty_experience_reaches_level_two() {
        let cfg = EngineConfig::default();
        let mut state = CharacterState::new(&cfg, Attributes::new(1, 2, 3, 4));
        state.experience = 250;
        let ups = check_level_ups(&mut state, &cfg);
        assert_eq!(ups, vec![LevelUp { level: 2, bonus: 3 }]);
        assert_eq!(state.level, 2);
        assert_eq!(state.experience, 50);
        assert_eq!(state.attributes, Attributes::new(4, 5, 6, 7));
    }

    #[test]
    fn large_grant_levels_multiple_times() {
        let cfg = EngineConfig::default();
        let mut state = CharacterState::default();
        // 200 (1->2) + 300 (2->3) + 400 (3->4) = 900
        state.experience = 950;
        let ups = check_level_ups(&mut state, &cfg);
        assert_eq!(ups.len(), 3);
        assert_eq!(state.level, 4);
        assert_eq!(state.experience, 50);
        assert!(state.experience < required_experience(state.level, &cfg));
        assert_eq!(state.attributes, Attributes::new(9, 9, 9, 9));
    }

    #[test]
    fn below_threshold_is_a_no_op() {
        let cfg = EngineConfig::default();
        let mut state = CharacterState::default();
        state.experience = 199;
        assert!(check_level_ups(&mut state, &cfg).is_empty());
        assert_eq!(state.level, 1);
    }
}
