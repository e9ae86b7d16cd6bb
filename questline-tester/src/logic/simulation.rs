use std::collections::BTreeMap;
use std::sync::Arc;

use questline_game::constants::SELECTION_POOL_FALLBACK;
use questline_game::{
    Attributes, BossState, CharacterState, ContentLoader, EngineConfig, EventCatalog,
    EventDescriptor, EventPrompt, GameEngine, GameSession, SessionError, required_experience,
    roll_attributes,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

const DEFAULT_MAX_EVENTS: u32 = 200;

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_events: u32,
    /// Fixed starting attributes; rolled from the seed when absent.
    pub attributes: Option<Attributes>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_events: DEFAULT_MAX_EVENTS,
            attributes: None,
        }
    }

    #[must_use]
    pub const fn with_max_events(mut self, max_events: u32) -> Self {
        self.max_events = max_events;
        self
    }

    #[must_use]
    pub const fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// One policy decision taken during a run.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub event_count: u32,
    pub event_name: String,
    pub choice_label: String,
    pub choice_index: usize,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub starting_attributes: Attributes,
    pub events: u32,
    pub auto_rolls: u32,
    pub negative_events: u32,
    pub fallback_draws: u32,
    pub encounters: u32,
    pub victories: u32,
    pub level_ups: usize,
    pub decision_log: Vec<DecisionRecord>,
    pub final_state: CharacterState,
    pub final_boss: BossState,
    /// Invariant breaches and session errors, in the order they were seen.
    pub violations: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Headless deterministic runner over a loaded catalog and configuration.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    catalog: Arc<EventCatalog>,
    config: EngineConfig,
}

impl GameTester {
    pub fn new(catalog: Arc<EventCatalog>, config: EngineConfig, verbose: bool) -> Self {
        Self {
            verbose,
            catalog,
            config,
        }
    }

    /// Load catalog and configuration through an engine, with its fallbacks.
    pub fn from_engine<L: ContentLoader>(engine: &GameEngine<L>, verbose: bool) -> Self {
        Self::new(Arc::new(engine.catalog()), engine.config(), verbose)
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let attributes = plan
            .attributes
            .unwrap_or_else(|| roll_attributes(&mut ChaCha20Rng::seed_from_u64(seed)));
        let mut session = GameSession::new(Arc::clone(&self.catalog), self.config.clone(), seed);
        session.new_game(attributes);

        if self.verbose {
            println!(
                "🎮 Starting simulation | seed:{seed} policy:{} | {attributes}",
                plan.strategy.label()
            );
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut run = RunState::new(&session);
        let mut summary = SimulationSummary {
            seed,
            strategy: plan.strategy,
            starting_attributes: attributes,
            events: 0,
            auto_rolls: 0,
            negative_events: 0,
            fallback_draws: 0,
            encounters: 0,
            victories: 0,
            level_ups: 0,
            decision_log: Vec::new(),
            final_state: session.state().clone(),
            final_boss: *session.boss(),
            violations: Vec::new(),
        };

        for _ in 0..plan.max_events {
            if let Err(err) = self.step(&mut session, policy.as_mut(), &mut run, &mut summary) {
                summary
                    .violations
                    .push(format!("session error after {} events: {err}", summary.events));
                break;
            }
        }

        summary.final_state = session.state().clone();
        summary.final_boss = *session.boss();
        if self.verbose {
            println!(
                "🏁 Simulation ended | started {} | level {} exp {} (+{} levels) | boss {}/{} | negative {} auto-roll {} forced {} | {} violation(s)",
                summary.starting_attributes,
                summary.final_state.level,
                summary.final_state.experience,
                summary.level_ups,
                summary.final_boss.current_health,
                summary.final_boss.max_health,
                summary.negative_events,
                summary.auto_rolls,
                summary.fallback_draws,
                summary.violations.len()
            );
        }
        summary
    }

    fn step(
        &self,
        session: &mut GameSession,
        policy: &mut dyn PlayerPolicy,
        run: &mut RunState,
        summary: &mut SimulationSummary,
    ) -> Result<(), SessionError> {
        if session.boss_due() {
            self.fight(session, policy, summary)?;
        }

        let event = session.next_event()?;
        summary.events += 1;
        if event.is_negative {
            summary.negative_events += 1;
        }
        if event.decision_trace.pool_id == SELECTION_POOL_FALLBACK {
            summary.fallback_draws += 1;
        }
        run.check_selection(session, &event, &mut summary.violations);

        match &event.prompt {
            EventPrompt::Choice { .. } => {
                let choices = self
                    .catalog
                    .get(&event.name)
                    .map(|definition| definition.choices())
                    .unwrap_or_default();
                let decision = policy.pick_choice(session.state(), choices);
                let outcome = session.choose(decision.choice_index)?;
                summary.level_ups += outcome.effects.level_ups.len();
                if self.verbose {
                    println!(
                        "🎯 Event {}: {} -> {} ({})",
                        session.state().event_count,
                        event.name,
                        outcome.choice,
                        policy.name()
                    );
                }
                summary.decision_log.push(DecisionRecord {
                    event_count: session.state().event_count,
                    event_name: event.name.clone(),
                    choice_label: outcome.choice,
                    choice_index: decision.choice_index,
                    policy_name: policy.name(),
                    rationale: decision.rationale,
                });
            }
            EventPrompt::AutoRoll { outcome } => {
                summary.auto_rolls += 1;
                summary.level_ups += outcome.effects.level_ups.len();
                if self.verbose {
                    println!(
                        "🎲 Event {}: {} rolled {} vs {} ({})",
                        session.state().event_count,
                        event.name,
                        outcome.roll,
                        outcome.chance,
                        if outcome.success { "success" } else { "failure" }
                    );
                }
            }
        }

        run.check_state(session, &mut summary.violations);
        Ok(())
    }

    fn fight(
        &self,
        session: &mut GameSession,
        policy: &mut dyn PlayerPolicy,
        summary: &mut SimulationSummary,
    ) -> Result<(), SessionError> {
        session.start_encounter()?;
        if session.state().choice_count != 0 {
            summary
                .violations
                .push(String::from("choice count not reset when the boss appeared"));
        }
        session.run_encounter(|encounter| policy.combat_action(encounter))?;
        let outcome = session.finish_encounter()?;
        summary.encounters += 1;
        summary.level_ups += outcome.level_ups.len();

        let boss = session.boss();
        if outcome.victory {
            summary.victories += 1;
            if boss.current_health != boss.max_health {
                summary.violations.push(format!(
                    "defeated boss persisted at {}/{} instead of respawning",
                    boss.current_health, boss.max_health
                ));
            }
        } else if boss.current_health != outcome.boss_remaining_health {
            summary.violations.push(format!(
                "boss health {} not persisted (fight ended at {})",
                boss.current_health, outcome.boss_remaining_health
            ));
        }

        if self.verbose {
            println!(
                "⚔️  Boss fight {} | {} in {} rounds | boss {}/{}",
                summary.encounters,
                if outcome.victory { "victory" } else { "defeat" },
                outcome.rounds,
                boss.current_health,
                boss.max_health
            );
        }
        Ok(())
    }
}

/// Rolling bookkeeping for the checks that span several events.
#[derive(Debug)]
struct RunState {
    previous_level: u32,
    last_seen: BTreeMap<String, u32>,
    last_negative: Option<u32>,
}

impl RunState {
    fn new(session: &GameSession) -> Self {
        Self {
            previous_level: session.state().level,
            last_seen: BTreeMap::new(),
            last_negative: None,
        }
    }

    fn check_selection(
        &mut self,
        session: &GameSession,
        event: &EventDescriptor,
        violations: &mut Vec<String>,
    ) {
        let state = session.state();
        let cfg = session.config();
        let now = state.event_count;
        let forced = event.decision_trace.pool_id == SELECTION_POOL_FALLBACK;

        if !forced && let Some(meta) = session.catalog().get(&event.name).map(|def| &def.meta) {
            if let Some(previous) = self.last_seen.get(&event.name)
                && now - previous < meta.cooldown
            {
                violations.push(format!(
                    "`{}` repeated after {} events (cooldown {})",
                    event.name,
                    now - previous,
                    meta.cooldown
                ));
            }

            let count = session.runtime().trigger_count(&event.name);
            if meta.once && count > 1 {
                violations.push(format!("once event `{}` triggered {count} times", event.name));
            }

            if event.is_negative {
                if state.choice_event_count < cfg.negative_min_choice_events {
                    violations.push(format!(
                        "negative event `{}` after only {} choice events",
                        event.name, state.choice_event_count
                    ));
                }
                if let Some(last) = self.last_negative
                    && now - last < cfg.negative_min_gap
                {
                    violations.push(format!(
                        "negative events {} apart (minimum {})",
                        now - last,
                        cfg.negative_min_gap
                    ));
                }
            }
        }

        if event.is_negative {
            self.last_negative = Some(now);
        }
        self.last_seen.insert(event.name.clone(), now);
    }

    fn check_state(&mut self, session: &GameSession, violations: &mut Vec<String>) {
        let state = session.state();
        if !(0..=state.max_health).contains(&state.health) {
            violations.push(format!(
                "health {} outside 0..={}",
                state.health, state.max_health
            ));
        }
        if !(0..=state.max_magic).contains(&state.magic) {
            violations.push(format!(
                "magic {} outside 0..={}",
                state.magic, state.max_magic
            ));
        }
        if state.level < self.previous_level {
            violations.push(format!(
                "level dropped from {} to {}",
                self.previous_level, state.level
            ));
        }
        if state.experience >= required_experience(state.level, session.config()) {
            violations.push(format!(
                "experience {} left unconverted at level {}",
                state.experience, state.level
            ));
        }
        let boss = session.boss();
        if !(0..=boss.max_health).contains(&boss.current_health) {
            violations.push(format!(
                "boss health {} outside 0..={}",
                boss.current_health, boss.max_health
            ));
        }
        self.previous_level = state.level;
    }
}
