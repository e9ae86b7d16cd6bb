//! Centralized balance and tuning defaults for Questline game logic.
//!
//! Every value here seeds a field of [`crate::config::EngineConfig`]; hosts
//! that want different pacing override the config rather than these constants.

// Character defaults -------------------------------------------------------
pub(crate) const DEFAULT_MAX_HEALTH: i32 = 100;
pub(crate) const DEFAULT_MAX_MAGIC: i32 = 50;
pub(crate) const STARTING_LEVEL: u32 = 1;

// Progression --------------------------------------------------------------
pub(crate) const LEVEL_EXPERIENCE_STEP: i64 = 100;
pub(crate) const LEVEL_UP_ATTRIBUTE_BONUS: i32 = 3;

// Event selection ----------------------------------------------------------
pub(crate) const DEFAULT_EVENT_WEIGHT: u32 = 1;
pub(crate) const DEFAULT_MAX_LEVEL: u32 = u32::MAX;
pub(crate) const NEGATIVE_MIN_CHOICE_EVENTS: u32 = 5;
pub(crate) const NEGATIVE_MIN_EVENT_GAP: u32 = 3;
pub(crate) const NEGATIVE_PREFERENCE_PCT: u32 = 15;
pub(crate) const SEEN_FLAG_PREFIX: &str = "seen:";
pub const SELECTION_POOL_POSITIVE: &str = "questline.events.positive";
pub const SELECTION_POOL_NEGATIVE: &str = "questline.events.negative";
pub const SELECTION_POOL_FALLBACK: &str = "questline.events.fallback";

// Probability evaluation ---------------------------------------------------
pub(crate) const DEFAULT_PROBABILITY_PCT: u32 = 50;
pub(crate) const PROBABILITY_MIN_PCT: u32 = 1;
pub(crate) const PROBABILITY_MAX_PCT: u32 = 100;
pub(crate) const PERCENT_ROLL_MAX: u32 = 100;

// Combat -------------------------------------------------------------------
pub(crate) const BOSS_TRIGGER_CHOICES: u32 = 10;
pub(crate) const BOSS_MAX_HEALTH: i32 = 100;
pub(crate) const BOSS_ATTACK: i32 = 10;
pub(crate) const BOSS_DODGE_PCT: u32 = 0;
pub(crate) const PLAYER_HEALTH_PER_CONSTITUTION: i32 = 5;
pub(crate) const PLAYER_MAGIC_PER_INTELLECT: i32 = 5;
pub(crate) const PLAYER_ATTACK_PER_CHARISMA: i32 = 1;
pub(crate) const PLAYER_DODGE_PER_LUCK: i32 = 2;
pub(crate) const VICTORY_EXPERIENCE: i64 = 50;
pub(crate) const DEFEAT_EXPERIENCE: i64 = 20;
pub(crate) const MAX_COMBAT_ROUNDS: u32 = 500;

// Attribute generation -----------------------------------------------------
pub(crate) const ATTRIBUTE_DICE: usize = 2;
pub(crate) const ATTRIBUTE_DIE_MAX_FACE: i32 = 5;
