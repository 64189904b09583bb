//! Bubble-Pop tests - combos, hit testing and the round clock

use minigames::core::bubble::{Bubble, BubbleConfig, BubbleEngine};
use minigames::core::machine::GameMachine;
use minigames::core::store::MemoryScoreStore;
use minigames::core::{GameEngine, SimpleRng};
use minigames::types::{ActivateTarget, BubbleKind, GameEvent, GamePhase, Intent};
use proptest::prelude::*;

fn bubble(id: u32, x: f32, y: f32, kind: BubbleKind) -> Bubble {
    Bubble {
        id,
        x,
        y,
        size: 50.0,
        kind,
        speed: 1.0,
        sway: 0.0,
        frozen_until_ms: 0,
    }
}

fn pop(id: u32) -> Intent {
    Intent::Activate {
        target: ActivateTarget::Bubble { id },
    }
}

#[test]
fn test_kind_change_resets_combo() {
    let mut rng = SimpleRng::new(1);
    let mut engine = BubbleEngine::with_bubbles(
        BubbleConfig::default(),
        vec![
            bubble(1, 100.0, 100.0, BubbleKind::Normal),
            bubble(2, 300.0, 100.0, BubbleKind::Normal),
            bubble(3, 500.0, 100.0, BubbleKind::Special),
        ],
    );
    let mut events = Vec::new();
    engine.apply_intent(pop(1), &mut rng, &mut events);
    engine.apply_intent(pop(2), &mut rng, &mut events);
    assert_eq!(engine.combo(), 2);

    engine.apply_intent(pop(3), &mut rng, &mut events);
    assert_eq!(engine.combo(), 0);
    // 1 + 1 + special pop doubled with no combo bonus
    assert_eq!(engine.score(), 4);
}

#[test]
fn test_overlapping_point_hits_latest_bubble() {
    let mut rng = SimpleRng::new(1);
    let mut engine = BubbleEngine::with_bubbles(
        BubbleConfig::default(),
        vec![
            bubble(1, 100.0, 100.0, BubbleKind::Normal),
            bubble(2, 110.0, 100.0, BubbleKind::Normal),
        ],
    );
    let mut events = Vec::new();
    let tap = Intent::Activate {
        target: ActivateTarget::Point { x: 105.0, y: 100.0 },
    };
    assert!(engine.apply_intent(tap, &mut rng, &mut events));
    let left: Vec<u32> = engine.bubbles().iter().map(|b| b.id).collect();
    assert_eq!(left, vec![1]);
}

#[test]
fn test_missing_bubble_is_ignored() {
    let mut m = GameMachine::new(
        BubbleEngine::with_bubbles(BubbleConfig::default(), vec![]),
        Box::new(MemoryScoreStore::new()),
        Box::new(SimpleRng::new(1)),
    );
    m.handle(Intent::Start);
    assert!(m.handle(pop(42)).is_noop());
}

#[test]
fn test_round_end_settles_high_score_once() {
    let config = BubbleConfig {
        round_ms: 200,
        ..BubbleConfig::default()
    };
    let mut m = GameMachine::new(
        BubbleEngine::with_bubbles(config, vec![bubble(1, 100.0, 300.0, BubbleKind::Normal)]),
        Box::new(MemoryScoreStore::new()),
        Box::new(SimpleRng::new(1)),
    );
    m.handle(Intent::Start);

    let popped = m.handle(pop(1));
    assert!(popped.events.contains(&GameEvent::BubblePopped {
        kind: BubbleKind::Normal
    }));
    assert!(popped.events.contains(&GameEvent::Scored { delta: 1 }));
    assert!(!popped
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::NewHighScore { .. })));

    for _ in 0..3 {
        m.tick();
        assert_eq!(m.phase(), GamePhase::Playing);
    }
    let last = m.tick();
    assert_eq!(m.phase(), GamePhase::GameOver);
    assert!(last.events.contains(&GameEvent::NewHighScore { value: 1 }));
    assert!(last.events.contains(&GameEvent::GameOver { final_score: 1 }));
    assert_eq!(m.high_score(), 1);
}

fn kind() -> impl Strategy<Value = BubbleKind> {
    prop_oneof![
        Just(BubbleKind::Normal),
        Just(BubbleKind::Special),
        Just(BubbleKind::Ice),
        Just(BubbleKind::Bomb),
    ]
}

proptest! {
    #[test]
    fn combo_counts_consecutive_same_kind(kinds in prop::collection::vec(kind(), 1..12)) {
        // Spread out so no bomb reaches a neighbour.
        let bubbles = kinds
            .iter()
            .enumerate()
            .map(|(i, &k)| bubble(i as u32 + 1, 300.0 * (i as f32 + 1.0), 100.0, k))
            .collect();
        let mut engine = BubbleEngine::with_bubbles(BubbleConfig::default(), bubbles);
        let mut rng = SimpleRng::new(1);

        let mut previous = BubbleKind::Normal;
        let mut expected = 0u32;
        for (i, &k) in kinds.iter().enumerate() {
            let mut events = Vec::new();
            prop_assert!(engine.apply_intent(pop(i as u32 + 1), &mut rng, &mut events));
            expected = if k == previous { expected + 1 } else { 0 };
            prop_assert_eq!(engine.combo(), expected);
            previous = k;
        }
    }
}
