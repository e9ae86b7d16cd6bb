//! Engine tuning configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BOSS_ATTACK, BOSS_DODGE_PCT, BOSS_MAX_HEALTH, BOSS_TRIGGER_CHOICES, DEFAULT_MAX_HEALTH,
    DEFAULT_MAX_MAGIC, DEFAULT_PROBABILITY_PCT, DEFEAT_EXPERIENCE, LEVEL_EXPERIENCE_STEP,
    LEVEL_UP_ATTRIBUTE_BONUS, MAX_COMBAT_ROUNDS, NEGATIVE_MIN_CHOICE_EVENTS,
    NEGATIVE_MIN_EVENT_GAP, NEGATIVE_PREFERENCE_PCT, PLAYER_ATTACK_PER_CHARISMA,
    PLAYER_DODGE_PER_LUCK, PLAYER_HEALTH_PER_CONSTITUTION, PLAYER_MAGIC_PER_INTELLECT,
    PROBABILITY_MAX_PCT, PROBABILITY_MIN_PCT, VICTORY_EXPERIENCE,
};

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
}

/// Boss and derived-stat tuning for the combat engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub max_health: i32,
    pub attack: i32,
    pub dodge_percent: u32,
    pub health_per_constitution: i32,
    pub magic_per_intellect: i32,
    pub attack_per_charisma: i32,
    pub dodge_per_luck: i32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            max_health: BOSS_MAX_HEALTH,
            attack: BOSS_ATTACK,
            dodge_percent: BOSS_DODGE_PCT,
            health_per_constitution: PLAYER_HEALTH_PER_CONSTITUTION,
            magic_per_intellect: PLAYER_MAGIC_PER_INTELLECT,
            attack_per_charisma: PLAYER_ATTACK_PER_CHARISMA,
            dodge_per_luck: PLAYER_DODGE_PER_LUCK,
        }
    }
}

/// Tunable pacing for selection, progression and combat.
///
/// The boss trigger threshold and the combat rewards have shifted between
/// content iterations, so they live here instead of being baked into the
/// rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolved choices required before the host should start a boss encounter.
    pub boss_trigger_choices: u32,
    pub victory_experience: i64,
    pub defeat_experience: i64,
    /// Minimum `choice_event_count` before negative events are considered.
    pub negative_min_choice_events: u32,
    /// Minimum `event_count` distance between two negative events.
    pub negative_min_gap: u32,
    /// Chance (percent) to prefer a negative event when one is eligible.
    pub negative_chance_pct: u32,
    /// Experience for the next level is `(level + 1) * level_experience_step`.
    pub level_experience_step: i64,
    pub level_up_bonus: i32,
    /// Probability used when an auto-roll formula cannot be evaluated.
    pub default_probability: u32,
    pub max_combat_rounds: u32,
    pub starting_max_health: i32,
    pub starting_max_magic: i32,
    pub boss: BossConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            boss_trigger_choices: BOSS_TRIGGER_CHOICES,
            victory_experience: VICTORY_EXPERIENCE,
            defeat_experience: DEFEAT_EXPERIENCE,
            negative_min_choice_events: NEGATIVE_MIN_CHOICE_EVENTS,
            negative_min_gap: NEGATIVE_MIN_EVENT_GAP,
            negative_chance_pct: NEGATIVE_PREFERENCE_PCT,
            level_experience_step: LEVEL_EXPERIENCE_STEP,
            level_up_bonus: LEVEL_UP_ATTRIBUTE_BONUS,
            default_probability: DEFAULT_PROBABILITY_PCT,
            max_combat_rounds: MAX_COMBAT_ROUNDS,
            starting_max_health: DEFAULT_MAX_HEALTH,
            starting_max_magic: DEFAULT_MAX_MAGIC,
            boss: BossConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the configuration for values the rules cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_min("boss_trigger_choices", i64::from(self.boss_trigger_choices), 1)?;
        ensure_min("level_experience_step", self.level_experience_step, 1)?;
        ensure_min("max_combat_rounds", i64::from(self.max_combat_rounds), 1)?;
        ensure_min("starting_max_health", i64::from(self.starting_max_health), 1)?;
        ensure_min("starting_max_magic", i64::from(self.starting_max_magic), 0)?;
        ensure_min("boss.max_health", i64::from(self.boss.max_health), 1)?;
        ensure_min("boss.attack", i64::from(self.boss.attack), 0)?;
        ensure_min("victory_experience", self.victory_experience, 0)?;
        ensure_min("defeat_experience", self.defeat_experience, 0)?;
        ensure_range("negative_chance_pct", i64::from(self.negative_chance_pct), 0, 100)?;
        ensure_range("boss.dodge_percent", i64::from(self.boss.dodge_percent), 0, 100)?;
        ensure_range(
            "default_probability",
            i64::from(self.default_probability),
            i64::from(PROBABILITY_MIN_PCT),
            i64::from(PROBABILITY_MAX_PCT),
        )?;
        Ok(())
    }
}

const fn ensure_min(field: &'static str, value: i64, min: i64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

const fn ensure_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}
