use questline_game::{
    Attributes, BossState, CharacterState, Choice, CombatAction, CombatPhase, EffectMap,
    EngineConfig, Encounter, EventCatalog, EventDefinition, EventMeta, EventRuntimeState,
    check_level_ups, finish_encounter, resolve_probability, run_encounter, select_next_event,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn plain_choice() -> Choice {
    Choice {
        text: String::from("Continue"),
        effects: EffectMap::new(),
        description: String::new(),
    }
}

fn event(name: &str, meta: EventMeta) -> EventDefinition {
    EventDefinition::with_choices(name, "", vec![plain_choice()]).meta(meta)
}

#[test]
fn cooldown_blocks_repeat_until_elapsed() {
    let cooldown = 4;
    let catalog = EventCatalog::new(
        vec![
            event(
                "Rare",
                EventMeta {
                    weight: 50,
                    cooldown,
                    ..EventMeta::default()
                },
            ),
            event("Filler A", EventMeta::default()),
            event("Filler B", EventMeta::default()),
        ],
        Vec::<String>::new(),
    )
    .unwrap();
    let cfg = EngineConfig::default();
    let mut state = CharacterState::default();
    let mut runtime = EventRuntimeState::new();
    let mut rng = ChaCha20Rng::seed_from_u64(0xC001);

    let mut last_rare: Option<u32> = None;
    let mut rare_hits = 0;
    for _ in 0..400 {
        let pick = select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
        if pick.name() == "Rare" {
            if let Some(previous) = last_rare {
                assert!(
                    state.event_count - previous >= cooldown,
                    "Rare repeated after {} events",
                    state.event_count - previous
                );
            }
            last_rare = Some(state.event_count);
            rare_hits += 1;
        }
    }
    assert!(rare_hits > 50, "heavy event should recur once cooled down");
}

#[test]
fn once_events_trigger_at_most_once() {
    let catalog = EventCatalog::new(
        vec![
            event(
                "Unique",
                EventMeta {
                    weight: 100,
                    once: true,
                    ..EventMeta::default()
                },
            ),
            event("Common", EventMeta::default()),
        ],
        Vec::<String>::new(),
    )
    .unwrap();
    let cfg = EngineConfig::default();
    let mut state = CharacterState::default();
    let mut runtime = EventRuntimeState::new();
    let mut rng = ChaCha20Rng::seed_from_u64(0x0CE);

    for _ in 0..200 {
        select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
        assert!(runtime.trigger_count("Unique") <= 1);
    }
    assert_eq!(runtime.trigger_count("Unique"), 1);
}

#[test]
fn probability_stays_in_percent_range() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xBEEF);
    let alphabet = [
        "luck", "intellect", "智力", "幸运", "+", "-", "*", "/", "(", ")", "0", "7", "2.5", "99",
        " ", "x", "%",
    ];
    for _ in 0..500 {
        let len = rng.gen_range(0..12);
        let formula: String = (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();
        let attributes = Attributes::new(
            rng.gen_range(-20..40),
            rng.gen_range(-20..40),
            rng.gen_range(-20..40),
            rng.gen_range(-20..40),
        );
        let chance = resolve_probability(&formula, &attributes);
        assert!((1..=100).contains(&chance), "`{formula}` gave {chance}");
    }
}

#[test]
fn two_hundred_fifty_experience_levels_once() {
    let cfg = EngineConfig::default();
    let mut state = CharacterState::new(&cfg, Attributes::new(2, 2, 2, 2));
    state.experience += 250;
    let ups = check_level_ups(&mut state, &cfg);
    assert_eq!(ups.len(), 1);
    assert_eq!(state.level, 2);
    assert_eq!(state.experience, 50);
    assert_eq!(state.attributes, Attributes::new(5, 5, 5, 5));
}

#[test]
fn twelve_attack_wins_against_thirty_health_in_three_attacks() {
    let cfg = EngineConfig::default();
    let mut boss = BossState::new(cfg.boss.max_health);
    boss.current_health = 30;
    let mut fight = Encounter::new(&Attributes::new(40, 0, 12, 0), &boss, &cfg);
    let mut rng = ChaCha20Rng::seed_from_u64(77);

    let mut attacks = 0;
    run_encounter(&mut fight, &mut rng, |_| {
        attacks += 1;
        CombatAction::Attack
    });
    assert_eq!(fight.phase(), CombatPhase::Won);
    assert_eq!(attacks, 3);
}

#[test]
fn defended_hit_of_nine_deals_four() {
    let mut cfg = EngineConfig::default();
    cfg.boss.attack = 9;
    let boss = BossState::new(100);
    let mut fight = Encounter::new(&Attributes::new(10, 0, 0, 0), &boss, &cfg);
    let mut rng = ChaCha20Rng::seed_from_u64(78);
    let reports = fight.play_round(CombatAction::Defend, &mut rng).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].snapshot.player.health, 50 - 4);
}

#[test]
fn depleted_boss_respawns_at_full_health() {
    let cfg = EngineConfig::default();
    let mut state = CharacterState::default();
    let mut boss = BossState::new(cfg.boss.max_health);
    boss.current_health = 5;
    let mut fight = Encounter::new(&Attributes::new(10, 0, 10, 0), &boss, &cfg);
    let mut rng = ChaCha20Rng::seed_from_u64(79);
    run_encounter(&mut fight, &mut rng, |_| CombatAction::Attack);
    let summary = finish_encounter(&fight, &mut state, &mut boss, &cfg).unwrap();
    assert!(summary.victory);
    assert_eq!(summary.boss_remaining_health, 0);
    assert_eq!(boss.current_health, boss.max_health);
}

#[test]
fn negative_events_respect_minimum_gap() {
    let catalog = EventCatalog::new(
        vec![
            event("Calm", EventMeta::default()),
            event("Market", EventMeta::default()),
            event("Ambush", EventMeta::default()),
            event("Storm", EventMeta::default()),
        ],
        ["Ambush", "Storm"],
    )
    .unwrap();
    for chance in [15, 100] {
        let cfg = EngineConfig {
            negative_chance_pct: chance,
            ..EngineConfig::default()
        };
        let mut state = CharacterState::default();
        let mut runtime = EventRuntimeState::new();
        let mut rng = ChaCha20Rng::seed_from_u64(0x5EED ^ u64::from(chance));
        let mut previous: Option<u32> = None;
        let mut negatives = 0;
        for _ in 0..1_000 {
            state.choice_event_count = 10;
            let pick =
                select_next_event(&mut state, &mut runtime, &catalog, &cfg, &mut rng).unwrap();
            if pick.is_negative {
                if let Some(last) = previous {
                    assert!(
                        state.event_count - last >= cfg.negative_min_gap,
                        "negatives {} apart",
                        state.event_count - last
                    );
                }
                previous = Some(state.event_count);
                negatives += 1;
            }
        }
        assert!(negatives > 0, "chance {chance} never produced a negative event");
    }
}
