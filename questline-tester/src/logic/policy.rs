use std::fmt;
use std::str::FromStr;

use questline_game::{CharacterState, Choice, CombatAction, EffectMap, EffectTarget, Encounter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the pending event's choices.
    fn pick_choice(&mut self, state: &CharacterState, choices: &[Choice]) -> PolicyDecision;

    /// Select the next combat action while it is the player's turn.
    fn combat_action(&mut self, encounter: &Encounter) -> CombatAction;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Balanced,
    Cautious,
    Bold,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Balanced, Self::Cautious, Self::Bold, Self::Random];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Balanced => "Balanced",
            GameplayStrategy::Cautious => "Cautious",
            GameplayStrategy::Bold => "Bold",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            GameplayStrategy::Balanced => "balanced",
            GameplayStrategy::Cautious => "cautious",
            GameplayStrategy::Bold => "bold",
            GameplayStrategy::Random => "random",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            GameplayStrategy::Balanced => "weighs expected gains against health and magic losses",
            GameplayStrategy::Cautious => "avoids damage, defends early in boss fights",
            GameplayStrategy::Bold => "chases experience and attributes, always attacks",
            GameplayStrategy::Random => "uniform choices and coin-flip combat actions",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Balanced => Box::new(BalancedPolicy),
            GameplayStrategy::Cautious => Box::new(CautiousPolicy),
            GameplayStrategy::Bold => Box::new(BoldPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown strategy `{wanted}`"))
    }
}

struct BalancedPolicy;
struct CautiousPolicy;
struct BoldPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_choice(&mut self, state: &CharacterState, choices: &[Choice]) -> PolicyDecision {
        let wounded = state.health * 2 < state.max_health;
        let (idx, score) = choices
            .iter()
            .enumerate()
            .map(|(idx, choice)| {
                let mut score = gain(&choice.effects) - risk(&choice.effects);
                if wounded {
                    score += healing(&choice.effects) * 2;
                }
                (idx, score)
            })
            .max_by_key(|(idx, score)| (*score, std::cmp::Reverse(*idx)))
            .unwrap_or((0, 0));

        PolicyDecision::new(idx, Some(format!("score {score}")))
    }

    fn combat_action(&mut self, encounter: &Encounter) -> CombatAction {
        let player = encounter.player();
        if player.health * 3 < player.max_health {
            CombatAction::Defend
        } else {
            CombatAction::Attack
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_choice(&mut self, _state: &CharacterState, choices: &[Choice]) -> PolicyDecision {
        let (idx, risk) = choices
            .iter()
            .enumerate()
            .map(|(idx, choice)| (idx, risk(&choice.effects) - healing(&choice.effects)))
            .min_by_key(|(_, risk)| *risk)
            .unwrap_or((0, 0));

        PolicyDecision::new(idx, Some(format!("risk {risk}")))
    }

    fn combat_action(&mut self, encounter: &Encounter) -> CombatAction {
        let player = encounter.player();
        if player.health * 2 < player.max_health {
            CombatAction::Defend
        } else {
            CombatAction::Attack
        }
    }
}

impl PlayerPolicy for BoldPolicy {
    fn name(&self) -> &'static str {
        "Bold"
    }

    fn pick_choice(&mut self, _state: &CharacterState, choices: &[Choice]) -> PolicyDecision {
        let (idx, reward) = choices
            .iter()
            .enumerate()
            .map(|(idx, choice)| (idx, gain(&choice.effects)))
            .max_by_key(|(idx, reward)| (*reward, std::cmp::Reverse(*idx)))
            .unwrap_or((0, 0));

        PolicyDecision::new(idx, Some(format!("reward {reward}")))
    }

    fn combat_action(&mut self, _encounter: &Encounter) -> CombatAction {
        CombatAction::Attack
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_choice(&mut self, _state: &CharacterState, choices: &[Choice]) -> PolicyDecision {
        if choices.is_empty() {
            return PolicyDecision::new(0, Some("no choices".to_string()));
        }
        let idx = self.rng.gen_range(0..choices.len());
        PolicyDecision::new(idx, None)
    }

    fn combat_action(&mut self, _encounter: &Encounter) -> CombatAction {
        if self.rng.gen_bool(0.5) {
            CombatAction::Attack
        } else {
            CombatAction::Defend
        }
    }
}

/// Expected upside: attributes count ten times an experience point.
fn gain(effects: &EffectMap) -> i64 {
    effects
        .iter()
        .map(|effect| {
            let (lo, hi) = effect.value.bounds();
            let mid = (i64::from(lo) + i64::from(hi)) / 2;
            match effect.target {
                EffectTarget::Attribute(_) => mid.max(0) * 10,
                EffectTarget::Experience => mid.max(0),
                EffectTarget::Health | EffectTarget::Magic | EffectTarget::Unknown => 0,
            }
        })
        .sum()
}

/// Worst-case health and magic loss, health weighted double.
fn risk(effects: &EffectMap) -> i64 {
    effects
        .iter()
        .map(|effect| {
            let (lo, _) = effect.value.bounds();
            let loss = i64::from(lo.min(0)).abs();
            match effect.target {
                EffectTarget::Health => loss * 2,
                EffectTarget::Magic => loss,
                EffectTarget::Attribute(_) => loss * 10,
                EffectTarget::Experience | EffectTarget::Unknown => 0,
            }
        })
        .sum()
}

fn healing(effects: &EffectMap) -> i64 {
    effects
        .iter()
        .filter(|effect| effect.target == EffectTarget::Health)
        .map(|effect| i64::from(effect.value.bounds().0.max(0)))
        .sum()
}
