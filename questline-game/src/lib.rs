//! Questline Game Engine
//!
//! Platform-agnostic rules for a choice-driven adventure: weighted event
//! selection, effect resolution, leveling, probability checks and a
//! persistent boss fight. Hosts own the presentation and feed the engine
//! content, attributes, choice indices and combat intents.

pub mod attributes;
pub mod auto_roll;
pub mod combat;
pub mod config;
pub mod constants;
pub mod data;
pub mod effects;
pub mod formula;
pub mod numbers;
pub mod progression;
pub mod rng;
pub mod selector;
pub mod session;
pub mod state;
pub mod trace;

// Re-export commonly used types
pub use attributes::{Attribute, AttributeInputError, Attributes, roll_attributes};
pub use auto_roll::{AutoRollOutcome, resolve_auto_roll};
pub use combat::{
    CombatAction, CombatError, CombatPhase, CombatSnapshot, CombatStats, Encounter,
    EncounterSummary, TurnReport, finish_encounter, run_encounter,
};
pub use config::{BossConfig, ConfigError, EngineConfig};
pub use data::{
    AttributeRequirement, AutoRoll, Choice, Comparison, ContentError, Effect, EffectMap,
    EffectTarget, EffectValue, EventBody, EventCatalog, EventDefinition, EventMeta, Requirements,
    TagSet,
};
pub use effects::{EffectChange, EffectOutcome, apply_effects};
pub use formula::{FormulaError, evaluate, resolve_probability, resolve_probability_or};
pub use progression::{LevelUp, check_level_ups, required_experience};
pub use rng::{CountingRng, RngBundle};
pub use selector::{EventSelection, is_available, select_next_event};
pub use session::{ChoiceOutcome, EventDescriptor, EventPrompt, GameSession, SessionError};
pub use state::{BossState, CharacterState, EventRecord, EventRuntimeState, seen_flag};
pub use trace::{EventDecisionTrace, WeightedCandidate};

use std::sync::Arc;

/// Trait for abstracting content loading operations.
/// Platform-specific implementations should provide this.
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the event catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<EventCatalog, Self::Error>;

    /// Load engine tuning. Defaults to [`EngineConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(EngineConfig::default())
    }
}

/// Loader for the content bundled with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledContent;

impl ContentLoader for BundledContent {
    type Error = ContentError;

    fn load_catalog(&self) -> Result<EventCatalog, Self::Error> {
        EventCatalog::from_json(data::DEFAULT_CONTENT)
    }
}

/// Main game engine for creating sessions over loaded content
pub struct GameEngine<L>
where
    L: ContentLoader,
{
    loader: L,
}

impl<L> GameEngine<L>
where
    L: ContentLoader,
{
    /// Create a new game engine with the provided content loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load the catalog, substituting the fallback catalog on failure.
    #[must_use]
    pub fn catalog(&self) -> EventCatalog {
        self.loader.load_catalog().unwrap_or_else(|err| {
            log::warn!("content load failed, using fallback events: {err}");
            EventCatalog::fallback()
        })
    }

    /// Load and validate configuration, substituting defaults on failure.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        let cfg = match self.loader.load_config() {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("config load failed, using defaults: {err}");
                return EngineConfig::default();
            }
        };
        if let Err(err) = cfg.validate() {
            log::warn!("config rejected, using defaults: {err}");
            return EngineConfig::default();
        }
        cfg
    }

    /// Construct a new session with a fresh character.
    #[must_use]
    pub fn create_session(&self, seed: u64, attributes: Attributes) -> GameSession {
        let mut session = GameSession::new(Arc::new(self.catalog()), self.config(), seed);
        session.new_game(attributes);
        session
    }

    /// Borrow the loader.
    pub const fn loader(&self) -> &L {
        &self.loader
    }
}
