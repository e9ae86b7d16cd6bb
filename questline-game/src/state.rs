//! Mutable game state owned by the host (or a [`crate::GameSession`]).
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::attributes::Attributes;
use crate::config::EngineConfig;
use crate::constants::{SEEN_FLAG_PREFIX, STARTING_LEVEL};

/// The player character and the counters the selector keeps on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    pub attributes: Attributes,
    pub health: i32,
    pub max_health: i32,
    pub magic: i32,
    pub max_magic: i32,
    pub experience: i64,
    pub level: u32,
    /// Choices resolved since the last boss encounter started.
    pub choice_count: u32,
    /// Events selected this session.
    pub event_count: u32,
    /// Choice events resolved this session.
    pub choice_event_count: u32,
    /// `event_count` at the most recent negative event.
    #[serde(default)]
    pub last_negative_event: Option<u32>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::new(&EngineConfig::default(), Attributes::default())
    }
}

impl CharacterState {
    #[must_use]
    pub fn new(cfg: &EngineConfig, attributes: Attributes) -> Self {
        Self {
            attributes,
            health: cfg.starting_max_health,
            max_health: cfg.starting_max_health,
            magic: cfg.starting_max_magic,
            max_magic: cfg.starting_max_magic,
            experience: 0,
            level: STARTING_LEVEL,
            choice_count: 0,
            event_count: 0,
            choice_event_count: 0,
            last_negative_event: None,
            flags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn has_seen(&self, event: &str) -> bool {
        self.flags.contains(&seen_flag(event))
    }

    pub(crate) fn mark_seen(&mut self, event: &str) {
        self.flags.insert(seen_flag(event));
    }

    /// Progress proxy used for event level windows.
    #[must_use]
    pub fn progress_level(&self) -> u32 {
        self.choice_event_count.max(STARTING_LEVEL)
    }
}

/// Flag recorded once an event has been selected.
#[must_use]
pub fn seen_flag(event: &str) -> String {
    format!("{SEEN_FLAG_PREFIX}{event}")
}

/// Persistent boss health shared by every encounter in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossState {
    pub current_health: i32,
    pub max_health: i32,
}

impl BossState {
    #[must_use]
    pub const fn new(max_health: i32) -> Self {
        Self {
            current_health: max_health,
            max_health,
        }
    }

    /// Store the health left at the end of an encounter, respawning a
    /// depleted boss at full health.
    pub fn persist(&mut self, remaining: i32) {
        self.current_health = if remaining <= 0 {
            self.max_health
        } else {
            remaining.min(self.max_health)
        };
    }
}

impl Default for BossState {
    fn default() -> Self {
        Self::new(EngineConfig::default().boss.max_health)
    }
}

/// Per-event bookkeeping for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventRecord {
    pub trigger_count: u32,
    pub last_seen: Option<u32>,
}

/// Trigger history keyed by event name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventRuntimeState {
    records: BTreeMap<String, EventRecord>,
}

impl EventRuntimeState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn record(&self, event: &str) -> EventRecord {
        self.records.get(event).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn trigger_count(&self, event: &str) -> u32 {
        self.record(event).trigger_count
    }

    #[must_use]
    pub fn last_seen(&self, event: &str) -> Option<u32> {
        self.record(event).last_seen
    }

    pub(crate) fn note_trigger(&mut self, event: &str, event_count: u32) {
        let record = self.records.entry(event.to_string()).or_default();
        record.trigger_count = record.trigger_count.saturating_add(1);
        record.last_seen = Some(event_count);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventRecord)> {
        self.records
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_character_uses_configured_pools() {
        let cfg = EngineConfig {
            starting_max_health: 80,
            ..EngineConfig::default()
        };
        let state = CharacterState::new(&cfg, Attributes::new(1, 2, 3, 4));
        assert_eq!(state.health, 80);
        assert_eq!(state.max_health, 80);
        assert_eq!(state.magic, 50);
        assert_eq!(state.level, 1);
        assert_eq!(state.last_negative_event, None);
        assert_eq!(state.progress_level(), 1);
    }

    #[test]
    fn seen_flags_use_prefix() {
        let mut state = CharacterState::default();
        state.mark_seen("Old Library");
        assert!(state.has_flag("seen:Old Library"));
        assert!(state.has_seen("Old Library"));
        assert!(!state.has_seen("Ambush"));
    }

    #[test]
    fn boss_respawns_only_when_depleted() {
        let mut boss = BossState::new(100);
        boss.persist(40);
        assert_eq!(boss.current_health, 40);
        boss.persist(0);
        assert_eq!(boss.current_health, 100);
    }

    #[test]
    fn runtime_records_triggers() {
        let mut runtime = EventRuntimeState::new();
        assert_eq!(runtime.last_seen("Gate"), None);
        runtime.note_trigger("Gate", 3);
        runtime.note_trigger("Gate", 7);
        assert_eq!(runtime.trigger_count("Gate"), 2);
        assert_eq!(runtime.last_seen("Gate"), Some(7));
        assert_eq!(runtime.iter().count(), 1);
    }

    #[test]
    fn character_state_roundtrips_through_json() {
        let mut state = CharacterState::default();
        state.mark_seen("Gate");
        state.last_negative_event = Some(4);
        let json = serde_json::to_string(&state).expect("serialize");
        let restored: CharacterState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, state);
    }
}
