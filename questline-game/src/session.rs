//! High-level session wrapper owning content, state and random streams.
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::attributes::{AttributeInputError, Attributes};
use crate::auto_roll::{AutoRollOutcome, resolve_auto_roll};
use crate::combat::{
    CombatAction, CombatError, Encounter, EncounterSummary, TurnReport, finish_encounter,
    run_encounter,
};
use crate::config::EngineConfig;
use crate::data::{EventBody, EventCatalog, TagSet};
use crate::effects::{EffectOutcome, apply_effects};
use crate::rng::RngBundle;
use crate::selector::select_next_event;
use crate::state::{BossState, CharacterState, EventRuntimeState};
use crate::trace::EventDecisionTrace;

/// Errors raised when the session is driven out of order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no choice event is waiting for an answer")]
    NoPendingChoice,
    #[error("a choice event is still waiting for an answer")]
    ChoicePending,
    #[error("choice {index} is out of range (event offers {available})")]
    InvalidChoice { index: usize, available: usize },
    #[error("a boss encounter is in progress")]
    EncounterActive,
    #[error("no boss encounter has been started")]
    NoEncounter,
    #[error("the event catalog is empty")]
    NoEvents,
    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// Playable part of an [`EventDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPrompt {
    /// Waiting for [`GameSession::choose`]; holds each choice's display text.
    Choice { options: Vec<String> },
    /// Already resolved.
    AutoRoll { outcome: AutoRollOutcome },
}

/// What the host shows for a selected event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    pub description: String,
    pub is_negative: bool,
    pub prompt: EventPrompt,
    pub tags: TagSet,
    /// Content-declared exclusions, surfaced as a warning only.
    pub excludes: TagSet,
    pub decision_trace: EventDecisionTrace,
}

impl EventDescriptor {
    #[must_use]
    pub const fn is_choice(&self) -> bool {
        matches!(self.prompt, EventPrompt::Choice { .. })
    }
}

/// Result of answering a choice event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOutcome {
    pub event: String,
    pub choice: String,
    pub description: String,
    pub effects: EffectOutcome,
    /// True once enough choices have been made for a boss encounter.
    pub boss_due: bool,
}

/// A single playthrough: catalog, configuration, character, boss and streams.
#[derive(Debug, Clone)]
pub struct GameSession {
    catalog: Arc<EventCatalog>,
    config: EngineConfig,
    state: CharacterState,
    boss: BossState,
    runtime: EventRuntimeState,
    rng: RngBundle,
    pending: Option<usize>,
    encounter: Option<Encounter>,
}

impl GameSession {
    /// Construct a fresh session from catalog, configuration and seed.
    /// A configuration that fails validation is replaced by the defaults.
    #[must_use]
    pub fn new(catalog: Arc<EventCatalog>, config: EngineConfig, seed: u64) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("config rejected, using defaults: {err}");
                EngineConfig::default()
            }
        };
        let state = CharacterState::new(&config, Attributes::default());
        let boss = BossState::new(config.boss.max_health);
        Self {
            catalog,
            config,
            state,
            boss,
            runtime: EventRuntimeState::new(),
            rng: RngBundle::from_user_seed(seed),
            pending: None,
            encounter: None,
        }
    }

    /// Reset character, boss and history for a new playthrough.
    /// Random streams continue from their current position.
    pub fn new_game(&mut self, attributes: Attributes) {
        self.state = CharacterState::new(&self.config, attributes);
        self.boss = BossState::new(self.config.boss.max_health);
        self.runtime = EventRuntimeState::new();
        self.pending = None;
        self.encounter = None;
        log::info!("new game | {attributes}");
    }

    /// Deterministically reseed every stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = RngBundle::from_user_seed(seed);
    }

    /// Replace attributes from a host mapping such as `{"intellect": 4}`.
    /// On failure the current attributes are kept.
    ///
    /// # Errors
    ///
    /// Returns the parse error after logging it.
    pub fn load_attributes(&mut self, input: &str) -> Result<(), AttributeInputError> {
        match Attributes::parse_onto(self.state.attributes, input) {
            Ok(attributes) => {
                self.state.attributes = attributes;
                log::debug!("attributes loaded | {attributes}");
                Ok(())
            }
            Err(err) => {
                log::warn!("attribute input rejected, keeping current values: {err}");
                Err(err)
            }
        }
    }

    pub fn set_attributes(&mut self, attributes: Attributes) {
        self.state.attributes = attributes;
    }

    /// Select the next event. Auto-roll events are resolved immediately.
    ///
    /// # Errors
    ///
    /// Returns an error while a choice is unanswered or a boss encounter is
    /// active.
    pub fn next_event(&mut self) -> Result<EventDescriptor, SessionError> {
        if self.encounter.is_some() {
            return Err(SessionError::EncounterActive);
        }
        if self.pending.is_some() {
            return Err(SessionError::ChoicePending);
        }
        let selection = select_next_event(
            &mut self.state,
            &mut self.runtime,
            &self.catalog,
            &self.config,
            &mut *self.rng.selection(),
        )
        .ok_or(SessionError::NoEvents)?;
        let event = selection.event;
        log::debug!(
            "event {} -> `{}`{}",
            self.state.event_count,
            event.name,
            if selection.is_negative { " (negative)" } else { "" }
        );

        let prompt = match &event.body {
            EventBody::Choices(choices) => {
                self.pending = self
                    .catalog
                    .events()
                    .iter()
                    .position(|candidate| candidate.name == event.name);
                EventPrompt::Choice {
                    options: choices.iter().map(|choice| choice.text.clone()).collect(),
                }
            }
            EventBody::AutoRoll(rule) => EventPrompt::AutoRoll {
                outcome: resolve_auto_roll(
                    &mut self.state,
                    rule,
                    &self.config,
                    &mut *self.rng.effects(),
                ),
            },
        };

        Ok(EventDescriptor {
            name: event.name.clone(),
            description: event.description.clone(),
            is_negative: selection.is_negative,
            prompt,
            tags: event.meta.tags.clone(),
            excludes: event.meta.excludes.clone(),
            decision_trace: selection.decision_trace,
        })
    }

    /// Answer the pending choice event.
    ///
    /// # Errors
    ///
    /// Returns an error when no choice is pending or `index` is out of range.
    /// An out-of-range index leaves the event pending.
    pub fn choose(&mut self, index: usize) -> Result<ChoiceOutcome, SessionError> {
        let event_idx = self.pending.ok_or(SessionError::NoPendingChoice)?;
        let catalog = Arc::clone(&self.catalog);
        let event = catalog
            .events()
            .get(event_idx)
            .ok_or(SessionError::NoPendingChoice)?;
        let choices = event.choices();
        let choice = choices.get(index).ok_or(SessionError::InvalidChoice {
            index,
            available: choices.len(),
        })?;
        self.pending = None;

        let effects = apply_effects(
            &mut self.state,
            &choice.effects,
            &self.config,
            &mut *self.rng.effects(),
        );
        self.state.choice_count = self.state.choice_count.saturating_add(1);
        self.state.choice_event_count = self.state.choice_event_count.saturating_add(1);

        Ok(ChoiceOutcome {
            event: event.name.clone(),
            choice: choice.text.clone(),
            description: choice.description.clone(),
            effects,
            boss_due: self.boss_due(),
        })
    }

    /// True once `choice_count` reaches the configured trigger.
    #[must_use]
    pub const fn boss_due(&self) -> bool {
        self.state.choice_count >= self.config.boss_trigger_choices
    }

    /// Begin a boss encounter, resetting `choice_count`.
    ///
    /// # Errors
    ///
    /// Returns an error if an encounter is already active or a choice is pending.
    pub fn start_encounter(&mut self) -> Result<&Encounter, SessionError> {
        if self.encounter.is_some() {
            return Err(SessionError::EncounterActive);
        }
        if self.pending.is_some() {
            return Err(SessionError::ChoicePending);
        }
        self.state.choice_count = 0;
        let encounter = Encounter::new(&self.state.attributes, &self.boss, &self.config);
        Ok(self.encounter.insert(encounter))
    }

    #[must_use]
    pub const fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    /// Play one round of the active encounter.
    ///
    /// # Errors
    ///
    /// Returns an error without an active encounter or when it is not the
    /// player's turn.
    pub fn encounter_round(
        &mut self,
        action: CombatAction,
    ) -> Result<Vec<TurnReport>, SessionError> {
        let encounter = self.encounter.as_mut().ok_or(SessionError::NoEncounter)?;
        Ok(encounter.play_round(action, &mut *self.rng.combat())?)
    }

    /// Drive the active encounter to its end with `intent`.
    ///
    /// # Errors
    ///
    /// Returns an error without an active encounter.
    pub fn run_encounter<F>(&mut self, intent: F) -> Result<Vec<TurnReport>, SessionError>
    where
        F: FnMut(&Encounter) -> CombatAction,
    {
        let encounter = self.encounter.as_mut().ok_or(SessionError::NoEncounter)?;
        Ok(run_encounter(encounter, &mut *self.rng.combat(), intent))
    }

    /// Close a finished encounter: persist boss health and grant experience.
    ///
    /// # Errors
    ///
    /// Returns an error without an encounter or while it is still running.
    pub fn finish_encounter(&mut self) -> Result<EncounterSummary, SessionError> {
        let encounter = self.encounter.as_ref().ok_or(SessionError::NoEncounter)?;
        let summary = finish_encounter(encounter, &mut self.state, &mut self.boss, &self.config)?;
        self.encounter = None;
        Ok(summary)
    }

    #[must_use]
    pub const fn state(&self) -> &CharacterState {
        &self.state
    }

    #[must_use]
    pub const fn boss(&self) -> &BossState {
        &self.boss
    }

    #[must_use]
    pub const fn runtime(&self) -> &EventRuntimeState {
        &self.runtime
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// True while a choice event waits for [`Self::choose`].
    #[must_use]
    pub const fn has_pending_choice(&self) -> bool {
        self.pending.is_some()
    }
}
