//! Turn-based boss encounters.
//!
//! Player stats are derived from attributes when the encounter starts; the
//! boss keeps its health between encounters through [`BossState`].
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::attributes::{Attribute, Attributes};
use crate::config::EngineConfig;
use crate::constants::PERCENT_ROLL_MAX;
use crate::numbers::clamp_i64_to_i32;
use crate::progression::{LevelUp, check_level_ups};
use crate::state::{BossState, CharacterState};

/// Errors raised when an encounter is driven out of turn.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CombatError {
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("it is not the boss's turn")]
    NotBossTurn,
    #[error("the encounter has already ended")]
    Finished,
    #[error("the encounter is still in progress")]
    InProgress,
}

/// Encounter state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    PlayerTurn,
    BossTurn { defending: bool },
    Won,
    Lost,
}

impl CombatPhase {
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Player intent for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    Attack,
    Defend,
}

impl fmt::Display for CombatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attack => write!(f, "Attack"),
            Self::Defend => write!(f, "Defend"),
        }
    }
}

/// Display stats for one side of the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub health: i32,
    pub max_health: i32,
    pub magic: i32,
    pub max_magic: i32,
    pub attack: i32,
    pub dodge_percent: u32,
}

impl CombatStats {
    /// Derive player stats from attributes using the configured multipliers.
    /// Negative attributes yield zero rather than negative stats.
    #[must_use]
    pub fn for_player(attributes: &Attributes, cfg: &EngineConfig) -> Self {
        let scaled = |attribute: Attribute, factor: i32| {
            clamp_i64_to_i32(i64::from(attributes.get(attribute)) * i64::from(factor)).max(0)
        };
        let health = scaled(Attribute::Constitution, cfg.boss.health_per_constitution);
        let magic = scaled(Attribute::Intellect, cfg.boss.magic_per_intellect);
        let dodge = scaled(Attribute::Luck, cfg.boss.dodge_per_luck);
        Self {
            health,
            max_health: health,
            magic,
            max_magic: magic,
            attack: scaled(Attribute::Charisma, cfg.boss.attack_per_charisma),
            dodge_percent: u32::try_from(dodge).unwrap_or(0),
        }
    }

    #[must_use]
    pub fn for_boss(boss: &BossState, cfg: &EngineConfig) -> Self {
        Self {
            health: boss.current_health,
            max_health: boss.max_health,
            magic: 0,
            max_magic: 0,
            attack: cfg.boss.attack.max(0),
            dodge_percent: cfg.boss.dodge_percent,
        }
    }
}

/// Both combatants as shown after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub player: CombatStats,
    pub boss: CombatStats,
}

/// Log lines and display stats produced by one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub lines: Vec<String>,
    pub snapshot: CombatSnapshot,
    pub phase: CombatPhase,
}

/// A single boss encounter in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encounter {
    player: CombatStats,
    boss: CombatStats,
    phase: CombatPhase,
    rounds: u32,
    max_rounds: u32,
    timed_out: bool,
    log: Vec<String>,
}

impl Encounter {
    #[must_use]
    pub fn new(attributes: &Attributes, boss: &BossState, cfg: &EngineConfig) -> Self {
        let player = CombatStats::for_player(attributes, cfg);
        let boss = CombatStats::for_boss(boss, cfg);
        log::debug!(
            "encounter start | player hp:{} atk:{} dodge:{} boss hp:{}/{}",
            player.health,
            player.attack,
            player.dodge_percent,
            boss.health,
            boss.max_health
        );
        Self {
            player,
            boss,
            phase: CombatPhase::PlayerTurn,
            rounds: 0,
            max_rounds: cfg.max_combat_rounds.max(1),
            timed_out: false,
            log: Vec::new(),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> CombatPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.phase.is_over()
    }

    #[must_use]
    pub const fn player(&self) -> &CombatStats {
        &self.player
    }

    #[must_use]
    pub const fn boss(&self) -> &CombatStats {
        &self.boss
    }

    /// Completed player-and-boss exchanges.
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    /// True when the round cap ended the fight.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Every line logged so far.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    #[must_use]
    pub const fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            player: self.player,
            boss: self.boss,
        }
    }

    /// Resolve the player's action.
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter is over or waiting on the boss.
    pub fn player_turn<R: Rng + ?Sized>(
        &mut self,
        action: CombatAction,
        rng: &mut R,
    ) -> Result<TurnReport, CombatError> {
        match self.phase {
            CombatPhase::PlayerTurn => {}
            CombatPhase::BossTurn { .. } => return Err(CombatError::NotPlayerTurn),
            CombatPhase::Won | CombatPhase::Lost => return Err(CombatError::Finished),
        }
        let mut lines = Vec::new();
        match action {
            CombatAction::Attack => {
                let roll = rng.gen_range(1..=PERCENT_ROLL_MAX);
                if roll <= self.boss.dodge_percent {
                    lines.push(String::from("The boss evades your attack."));
                    self.phase = CombatPhase::BossTurn { defending: false };
                } else {
                    self.boss.health = self.boss.health.saturating_sub(self.player.attack);
                    if self.boss.health <= 0 {
                        self.boss.health = 0;
                        lines.push(format!(
                            "You strike for {} damage. The boss is defeated!",
                            self.player.attack
                        ));
                        self.phase = CombatPhase::Won;
                    } else {
                        lines.push(format!(
                            "You strike for {} damage (boss {}/{}).",
                            self.player.attack, self.boss.health, self.boss.max_health
                        ));
                        self.phase = CombatPhase::BossTurn { defending: false };
                    }
                }
            }
            CombatAction::Defend => {
                lines.push(String::from("You brace for the boss's attack."));
                self.phase = CombatPhase::BossTurn { defending: true };
            }
        }
        Ok(self.report(lines))
    }

    /// Resolve the boss's attack.
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter is over or waiting on the player.
    pub fn boss_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TurnReport, CombatError> {
        let defending = match self.phase {
            CombatPhase::BossTurn { defending } => defending,
            CombatPhase::PlayerTurn => return Err(CombatError::NotBossTurn),
            CombatPhase::Won | CombatPhase::Lost => return Err(CombatError::Finished),
        };
        let mut lines = Vec::new();
        let roll = rng.gen_range(1..=PERCENT_ROLL_MAX);
        if roll <= self.player.dodge_percent {
            lines.push(String::from("You dodge the boss's attack."));
            self.phase = CombatPhase::PlayerTurn;
        } else {
            let damage = if defending {
                self.boss.attack / 2
            } else {
                self.boss.attack
            };
            self.player.health = self.player.health.saturating_sub(damage);
            if self.player.health <= 0 {
                self.player.health = 0;
                lines.push(format!("The boss hits you for {damage} damage. You have fallen."));
                self.phase = CombatPhase::Lost;
            } else {
                lines.push(format!(
                    "The boss hits you for {damage} damage (you {}/{}).",
                    self.player.health, self.player.max_health
                ));
                self.phase = CombatPhase::PlayerTurn;
            }
        }
        if self.phase == CombatPhase::PlayerTurn {
            self.rounds = self.rounds.saturating_add(1);
            if self.rounds >= self.max_rounds {
                lines.push(format!(
                    "The fight drags on for {} rounds and you are forced to retreat.",
                    self.rounds
                ));
                self.timed_out = true;
                self.phase = CombatPhase::Lost;
            }
        }
        Ok(self.report(lines))
    }

    /// Play the player's action and, if the fight continues, the boss's reply.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the player's turn.
    pub fn play_round<R: Rng + ?Sized>(
        &mut self,
        action: CombatAction,
        rng: &mut R,
    ) -> Result<Vec<TurnReport>, CombatError> {
        let mut reports = vec![self.player_turn(action, rng)?];
        if matches!(self.phase, CombatPhase::BossTurn { .. }) {
            reports.push(self.boss_turn(rng)?);
        }
        Ok(reports)
    }

    fn report(&mut self, lines: Vec<String>) -> TurnReport {
        self.log.extend(lines.iter().cloned());
        TurnReport {
            lines,
            snapshot: self.snapshot(),
            phase: self.phase,
        }
    }
}

/// Drive `encounter` to completion, asking `intent` for each player action.
pub fn run_encounter<R, F>(encounter: &mut Encounter, rng: &mut R, mut intent: F) -> Vec<TurnReport>
where
    R: Rng + ?Sized,
    F: FnMut(&Encounter) -> CombatAction,
{
    let mut reports = Vec::new();
    while !encounter.is_over() {
        let step = match encounter.phase() {
            CombatPhase::PlayerTurn => {
                let action = intent(encounter);
                encounter.player_turn(action, rng)
            }
            CombatPhase::BossTurn { .. } => encounter.boss_turn(rng),
            CombatPhase::Won | CombatPhase::Lost => break,
        };
        match step {
            Ok(report) => reports.push(report),
            Err(err) => {
                log::warn!("encounter loop stopped: {err}");
                break;
            }
        }
    }
    reports
}

/// Result of a finished encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub victory: bool,
    pub timed_out: bool,
    pub rounds: u32,
    /// Boss health when the fight ended, before any respawn.
    pub boss_remaining_health: i32,
    pub experience_gained: i64,
    pub level_ups: Vec<LevelUp>,
}

/// Persist boss health, grant experience and run the progression check.
///
/// # Errors
///
/// Returns [`CombatError::InProgress`] if the encounter has not ended.
pub fn finish_encounter(
    encounter: &Encounter,
    state: &mut CharacterState,
    boss: &mut BossState,
    cfg: &EngineConfig,
) -> Result<EncounterSummary, CombatError> {
    let victory = match encounter.phase() {
        CombatPhase::Won => true,
        CombatPhase::Lost => false,
        CombatPhase::PlayerTurn | CombatPhase::BossTurn { .. } => {
            return Err(CombatError::InProgress);
        }
    };
    let remaining = encounter.boss().health;
    boss.persist(remaining);

    let experience_gained = if victory {
        cfg.victory_experience
    } else {
        cfg.defeat_experience
    };
    state.experience = state.experience.saturating_add(experience_gained);
    let level_ups = check_level_ups(state, cfg);
    log::info!(
        "encounter finished | victory:{victory} rounds:{} boss left:{remaining} exp:+{experience_gained}",
        encounter.rounds()
    );

    Ok(EncounterSummary {
        victory,
        timed_out: encounter.timed_out(),
        rounds: encounter.rounds(),
        boss_remaining_health: remaining,
        experience_gained,
        level_ups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn encounter(attributes: Attributes, boss_health: i32) -> Encounter {
        let cfg = EngineConfig::default();
        let mut boss = BossState::new(cfg.boss.max_health);
        boss.current_health = boss_health;
        Encounter::new(&attributes, &boss, &cfg)
    }

    #[test]
    fn derives_player_stats_from_attributes() {
        let fight = encounter(Attributes::new(6, 4, 12, 5), 100);
        assert_eq!(fight.player().health, 30);
        assert_eq!(fight.player().magic, 20);
        assert_eq!(fight.player().attack, 12);
        assert_eq!(fight.player().dodge_percent, 10);
        assert_eq!(fight.boss().attack, 10);
        assert_eq!(fight.phase(), CombatPhase::PlayerTurn);
    }

    #[test]
    fn twelve_attack_beats_thirty_health_boss_in_three_hits() {
        // Constitution 20 keeps the player alive through two boss hits.
        let mut fight = encounter(Attributes::new(20, 0, 12, 0), 30);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut attacks = 0;
        while !fight.is_over() {
            fight.play_round(CombatAction::Attack, &mut rng).unwrap();
            attacks += 1;
        }
        assert_eq!(fight.phase(), CombatPhase::Won);
        assert_eq!(attacks, 3);
        assert_eq!(fight.boss().health, 0);
    }

    #[test]
    fn defending_halves_boss_damage_rounding_down() {
        let cfg = EngineConfig {
            boss: crate::config::BossConfig {
                attack: 9,
                ..crate::config::BossConfig::default()
            },
            ..EngineConfig::default()
        };
        let boss = BossState::new(100);
        let mut fight = Encounter::new(&Attributes::new(10, 0, 1, 0), &boss, &cfg);
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        fight.player_turn(CombatAction::Defend, &mut rng).unwrap();
        assert_eq!(fight.phase(), CombatPhase::BossTurn { defending: true });
        fight.boss_turn(&mut rng).unwrap();
        assert_eq!(fight.player().health, 46);
    }

    #[test]
    fn out_of_turn_actions_are_rejected() {
        let mut fight = encounter(Attributes::new(10, 0, 1, 0), 100);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert_eq!(fight.boss_turn(&mut rng), Err(CombatError::NotBossTurn));
        fight.player_turn(CombatAction::Attack, &mut rng).unwrap();
        assert_eq!(
            fight.player_turn(CombatAction::Attack, &mut rng),
            Err(CombatError::NotPlayerTurn)
        );
    }

    #[test]
    fn zero_constitution_player_falls_to_first_hit() {
        let mut fight = encounter(Attributes::new(0, 0, 1, 0), 100);
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let reports = run_encounter(&mut fight, &mut rng, |_| CombatAction::Attack);
        assert_eq!(fight.phase(), CombatPhase::Lost);
        assert_eq!(reports.len(), 2);
        assert_eq!(fight.boss().health, 99);
    }

    #[test]
    fn round_cap_ends_stalemates_as_defeat() {
        let cfg = EngineConfig {
            max_combat_rounds: 5,
            ..EngineConfig::default()
        };
        let boss = BossState::new(100);
        // Luck 50 gives a 100% dodge; charisma 0 deals no damage.
        let mut fight = Encounter::new(&Attributes::new(5, 0, 0, 50), &boss, &cfg);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        run_encounter(&mut fight, &mut rng, |_| CombatAction::Attack);
        assert_eq!(fight.phase(), CombatPhase::Lost);
        assert!(fight.timed_out());
        assert_eq!(fight.rounds(), 5);

        let mut state = CharacterState::default();
        let mut boss_state = BossState::new(100);
        let summary = finish_encounter(&fight, &mut state, &mut boss_state, &cfg).unwrap();
        assert!(!summary.victory);
        assert!(summary.timed_out);
        assert_eq!(boss_state.current_health, 100);
        assert_eq!(state.experience, 20);
    }

    #[test]
    fn finishing_persists_boss_health_and_grants_experience() {
        let cfg = EngineConfig::default();
        let mut state = CharacterState::default();
        let mut boss = BossState::new(100);
        boss.current_health = 10;

        let mut fight = Encounter::new(&Attributes::new(10, 0, 12, 0), &boss, &cfg);
        assert_eq!(
            finish_encounter(&fight, &mut state, &mut boss, &cfg),
            Err(CombatError::InProgress)
        );
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        run_encounter(&mut fight, &mut rng, |_| CombatAction::Attack);

        let summary = finish_encounter(&fight, &mut state, &mut boss, &cfg).unwrap();
        assert!(summary.victory);
        assert_eq!(summary.boss_remaining_health, 0);
        assert_eq!(boss.current_health, boss.max_health);
        assert_eq!(state.experience, 50);
        assert!(!fight.log().is_empty());
    }
}
