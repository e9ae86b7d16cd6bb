//! Event selection logic
use rand::Rng;

use crate::config::EngineConfig;
use crate::constants::{
    PERCENT_ROLL_MAX, SELECTION_POOL_FALLBACK, SELECTION_POOL_NEGATIVE, SELECTION_POOL_POSITIVE,
};
use crate::data::{EventCatalog, EventDefinition, Requirements};
use crate::state::{CharacterState, EventRuntimeState};
use crate::trace::{EventDecisionTrace, WeightedCandidate};

/// Event chosen by [`select_next_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct EventSelection<'a> {
    pub event: &'a EventDefinition,
    pub is_negative: bool,
    /// True when no filtered candidate existed and the unweighted draw over
    /// every event was used.
    pub fallback: bool,
    pub decision_trace: EventDecisionTrace,
}

impl EventSelection<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.event.name
    }
}

/// Pick the next event and record the selection bookkeeping.
///
/// Only counters, flags and runtime history change; no gameplay effect is
/// applied. Returns `None` only for an empty catalog, which
/// [`EventCatalog`] never constructs.
pub fn select_next_event<'a, R: Rng + ?Sized>(
    state: &mut CharacterState,
    runtime: &mut EventRuntimeState,
    catalog: &'a EventCatalog,
    cfg: &EngineConfig,
    rng: &mut R,
) -> Option<EventSelection<'a>> {
    state.event_count = state.event_count.saturating_add(1);
    let level = state.progress_level();

    let (positive, negative) = partition_candidates(catalog, state, runtime, level);
    log::debug!(
        "event selection | event:{} level:{} positive:{} negative:{}",
        state.event_count,
        level,
        positive.len(),
        negative.len()
    );

    let mut pool_roll = None;
    if negative_window_open(state, cfg) && !negative.is_empty() {
        pool_roll = Some(rng.gen_range(1..=PERCENT_ROLL_MAX));
    }
    let prefer_negative = pool_roll.is_some_and(|roll| roll <= cfg.negative_chance_pct);

    let mut picked = None;
    if prefer_negative {
        picked = choose_weighted(&negative, rng).map(|pick| (pick, SELECTION_POOL_NEGATIVE, &negative));
    }
    if picked.is_none() {
        picked = choose_weighted(&positive, rng).map(|pick| (pick, SELECTION_POOL_POSITIVE, &positive));
    }

    let (event, fallback, decision_trace) = match picked {
        Some(((idx, roll), pool_id, weights)) => {
            let event = catalog.events().get(idx)?;
            let trace = build_decision_trace(catalog, weights, pool_id, pool_roll, roll, event);
            (event, false, trace)
        }
        None => {
            let events = catalog.events();
            if events.is_empty() {
                return None;
            }
            let idx = rng.gen_range(0..events.len());
            let event = events.get(idx)?;
            log::debug!("no eligible events, uniform fallback chose `{}`", event.name);
            let uniform: Vec<(usize, u32)> = (0..events.len()).map(|idx| (idx, 1)).collect();
            let roll = u64::try_from(idx).map_or(u64::MAX, |idx| idx + 1);
            let trace = build_decision_trace(
                catalog,
                &uniform,
                SELECTION_POOL_FALLBACK,
                pool_roll,
                roll,
                event,
            );
            (event, true, trace)
        }
    };

    let is_negative = catalog.is_negative(&event.name);
    state.mark_seen(&event.name);
    runtime.note_trigger(&event.name, state.event_count);
    if is_negative {
        state.last_negative_event = Some(state.event_count);
    }

    Some(EventSelection {
        event,
        is_negative,
        fallback,
        decision_trace,
    })
}

/// Whether negative events may compete at the current `event_count`.
fn negative_window_open(state: &CharacterState, cfg: &EngineConfig) -> bool {
    if state.choice_event_count < cfg.negative_min_choice_events {
        return false;
    }
    state
        .last_negative_event
        .is_none_or(|last| state.event_count.saturating_sub(last) >= cfg.negative_min_gap)
}

/// Split available events into `(positive, negative)` weight lists of
/// `(catalog index, weight)`, preserving catalog order.
fn partition_candidates(
    catalog: &EventCatalog,
    state: &CharacterState,
    runtime: &EventRuntimeState,
    level: u32,
) -> (Vec<(usize, u32)>, Vec<(usize, u32)>) {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for (idx, event) in catalog.events().iter().enumerate() {
        if !is_available(event, state, runtime, level) {
            continue;
        }
        let target = if catalog.is_negative(&event.name) {
            &mut negative
        } else {
            &mut positive
        };
        target.push((idx, event.meta.weight));
    }
    (positive, negative)
}

/// Availability filter: once, cooldown, level window and requirements.
#[must_use]
pub fn is_available(
    event: &EventDefinition,
    state: &CharacterState,
    runtime: &EventRuntimeState,
    level: u32,
) -> bool {
    let record = runtime.record(&event.name);
    if event.meta.once && record.trigger_count > 0 {
        return false;
    }
    let cooled_down = record
        .last_seen
        .is_none_or(|last| state.event_count.saturating_sub(last) >= event.meta.cooldown);
    if !cooled_down {
        return false;
    }
    if level < event.meta.min_level || level > event.meta.max_level {
        return false;
    }
    requirements_met(&event.meta.requires, state)
}

fn requirements_met(requires: &Requirements, state: &CharacterState) -> bool {
    requires
        .attributes
        .iter()
        .all(|requirement| requirement.holds(&state.attributes))
        && requires.flags_all.iter().all(|flag| state.has_flag(flag))
        && (requires.flags_any.is_empty()
            || requires.flags_any.iter().any(|flag| state.has_flag(flag)))
}

/// Draw from `[1, sum(weights)]` and return the first bracket containing it.
fn choose_weighted<R: Rng + ?Sized>(
    weights: &[(usize, u32)],
    rng: &mut R,
) -> Option<(usize, u64)> {
    let total_weight: u64 = weights.iter().map(|(_, weight)| u64::from(*weight)).sum();
    if total_weight == 0 {
        return None;
    }

    let roll = rng.gen_range(1..=total_weight);
    let mut current = 0_u64;
    for (idx, weight) in weights {
        current += u64::from(*weight);
        if roll <= current {
            return Some((*idx, roll));
        }
    }

    weights.first().map(|(idx, _)| (*idx, roll))
}

fn build_decision_trace(
    catalog: &EventCatalog,
    weights: &[(usize, u32)],
    pool_id: &str,
    pool_roll: Option<u32>,
    roll: u64,
    chosen: &EventDefinition,
) -> EventDecisionTrace {
    let candidates = weights
        .iter()
        .filter_map(|(idx, weight)| {
            let event = catalog.events().get(*idx)?;
            Some(WeightedCandidate {
                id: event.name.clone(),
                weight: *weight,
            })
        })
        .collect();

    EventDecisionTrace {
        pool_id: String::from(pool_id),
        pool_roll,
        roll,
        candidates,
        chosen_id: chosen.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attribute, Attributes};
    use crate::data::{
        AttributeRequirement, Choice, Comparison, EffectMap, EventMeta,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn choice() -> Choice {
        Choice {
            text: String::from("Go"),
            effects: EffectMap::new(),
            description: String::new(),
        }
    }

    fn event(name: &str, meta: EventMeta) -> EventDefinition {
        EventDefinition::with_choices(name, "", vec![choice()]).meta(meta)
    }

    #[test]
    fn weighted_choice_uses_inclusive_brackets() {
        struct Fixed(u64);
        impl rand::RngCore for Fixed {
            fn next_u32(&mut self) -> u32 {
                u32::try_from(self.0 & u64::from(u32::MAX)).unwrap()
            }
            fn next_u64(&mut self) -> u64 {
                self.0
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                dest.fill(0);
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
                dest.fill(0);
                Ok(())
            }
        }
        let weights = [(0, 1), (1, 3)];
        let mut rng = Fixed(0);
        let (idx, roll) = choose_weighted(&weights, &mut rng).unwrap();
        assert_eq!(roll, 1);
        assert_eq!(idx, 0);
        assert_eq!(choose_weighted(&[], &mut rng), None);
    }

    #[test]
    fn weighted_choice_prefers_higher_weight() {
        let weights = [(0, 1), (1, 9)];
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let heavy = (0..1000)
            .filter(|_| choose_weighted(&weights, &mut rng).unwrap().0 == 1)
            .count();
        assert!(heavy > 800, "heavy picked {heavy} times");
    }

    #[test]
    fn selection_records_bookkeeping_and_trace() {
        let catalog = EventCatalog::new(
            vec![
                event("A", EventMeta::default()),
                event(
                    "B",
                    EventMeta {
                        weight: 4,
                        ..EventMeta::default()
                    },
                ),
            ],
            Vec::<String>::new(),
        )
        .unwrap();
        let cfg = EngineConfig::default();
        let mut state = CharacterState::default();
        let mut runtime = EventRuntimeState::new();
        let mut rng = ChaCha20Rng::seed_from_u64(7);

        let selection =
            select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
        let name = selection.name().to_string();

        assert_eq!(state.event_count, 1);
        assert!(state.has_seen(&name));
        assert_eq!(runtime.trigger_count(&name), 1);
        assert_eq!(runtime.last_seen(&name), Some(1));
        assert!(!selection.is_negative);
        assert!(!selection.fallback);
        assert_eq!(selection.decision_trace.pool_id, SELECTION_POOL_POSITIVE);
        assert_eq!(selection.decision_trace.total_weight(), 5);
        assert_eq!(selection.decision_trace.chosen_id, name);
        assert_eq!(state.last_negative_event, None);
    }

    #[test]
    fn level_window_and_requirements_filter_events() {
        let gated = event(
            "Gated",
            EventMeta {
                min_level: 3,
                requires: Requirements {
                    attributes: vec![AttributeRequirement {
                        attribute: Attribute::Intellect,
                        comparison: Comparison::AtLeast,
                        value: 5,
                    }],
                    flags_all: vec![String::from("seen:Gate")],
                    flags_any: vec![],
                },
                ..EventMeta::default()
            },
        );
        let runtime = EventRuntimeState::new();
        let mut state = CharacterState::new(&EngineConfig::default(), Attributes::new(0, 5, 0, 0));

        assert!(!is_available(&gated, &state, &runtime, 2));
        assert!(!is_available(&gated, &state, &runtime, 3));
        state.mark_seen("Gate");
        assert!(is_available(&gated, &state, &runtime, 3));
        state.attributes.intellect = 4;
        assert!(!is_available(&gated, &state, &runtime, 3));
    }

    #[test]
    fn flags_any_needs_one_match() {
        let gated = event(
            "Either",
            EventMeta {
                requires: Requirements {
                    flags_any: vec![String::from("seen:X"), String::from("seen:Y")],
                    ..Requirements::default()
                },
                ..EventMeta::default()
            },
        );
        let runtime = EventRuntimeState::new();
        let mut state = CharacterState::default();
        assert!(!is_available(&gated, &state, &runtime, 1));
        state.mark_seen("Y");
        assert!(is_available(&gated, &state, &runtime, 1));
    }

    #[test]
    fn exhausted_pool_falls_back_to_uniform_draw() {
        let catalog = EventCatalog::new(
            vec![event(
                "Only",
                EventMeta {
                    once: true,
                    ..EventMeta::default()
                },
            )],
            Vec::<String>::new(),
        )
        .unwrap();
        let cfg = EngineConfig::default();
        let mut state = CharacterState::default();
        let mut runtime = EventRuntimeState::new();
        let mut rng = ChaCha20Rng::seed_from_u64(8);

        let first = select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
        assert!(!first.fallback);
        let second =
            select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
        assert!(second.fallback);
        assert_eq!(second.name(), "Only");
        assert_eq!(second.decision_trace.pool_id, SELECTION_POOL_FALLBACK);
    }

    #[test]
    fn negative_events_wait_for_choice_threshold() {
        let catalog = EventCatalog::new(
            vec![event("Calm", EventMeta::default()), event("Ambush", EventMeta::default())],
            ["Ambush"],
        )
        .unwrap();
        let cfg = EngineConfig {
            negative_chance_pct: 100,
            ..EngineConfig::default()
        };
        let mut state = CharacterState::default();
        let mut runtime = EventRuntimeState::new();
        let mut rng = ChaCha20Rng::seed_from_u64(12);

        state.choice_event_count = 4;
        for _ in 0..30 {
            let pick =
                select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
            assert!(!pick.is_negative);
        }

        state.choice_event_count = 5;
        let pick = select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
        assert!(pick.is_negative);
        assert_eq!(pick.decision_trace.pool_id, SELECTION_POOL_NEGATIVE);
        assert_eq!(state.last_negative_event, Some(state.event_count));
    }
}
