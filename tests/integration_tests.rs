//! Integration tests for the game machine across engines and score stores

use std::sync::{Arc, Mutex};

use minigames::core::machine::{GameMachine, Schedule};
use minigames::core::merge::{MergeConfig, MergeEngine};
use minigames::core::snake::{Snake, SnakeConfig, SnakeEngine};
use minigames::core::store::{JsonFileScoreStore, MemoryScoreStore, ScoreStore, StoreError};
use minigames::core::{Board, GameEngine, Position, SimpleRng};
use minigames::types::{Direction, GameEvent, GamePhase, Intent};
use std::time::Duration;

/// Fails the first `failures` writes, then records values
struct FlakyStore {
    failures: u32,
    saved: Arc<Mutex<Vec<u32>>>,
}

impl ScoreStore for FlakyStore {
    fn get(&self, _game_id: &str) -> Result<u32, StoreError> {
        Ok(0)
    }

    fn set(&mut self, _game_id: &str, value: u32) -> Result<(), StoreError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(StoreError::Unavailable("disk busy".into()));
        }
        self.saved.lock().unwrap().push(value);
        Ok(())
    }
}

fn merge_board(rows: [[u32; 4]; 4]) -> Board<u32> {
    Board::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|&v| (v > 0).then_some(v)).collect())
            .collect(),
    )
    .unwrap()
}

fn snake_machine(store: Box<dyn ScoreStore + Send>) -> GameMachine<SnakeEngine> {
    let engine = SnakeEngine::from_parts(
        SnakeConfig::default(),
        vec![Snake::new([Position::new(2, 2)], Direction::Right)],
        Some(Position::new(3, 2)),
    );
    GameMachine::new(engine, store, Box::new(SimpleRng::new(3)))
}

#[test]
fn test_game_lifecycle() {
    let mut m = snake_machine(Box::new(MemoryScoreStore::new()));
    assert_eq!(m.phase(), GamePhase::Idle);
    assert!(m.tick().is_noop());

    let start = m.handle(Intent::Start);
    assert_eq!(
        start.events,
        vec![GameEvent::PhaseChanged {
            phase: GamePhase::Playing
        }]
    );
    assert_eq!(start.schedule, Schedule::Arm(Duration::from_millis(200)));

    m.tick();
    assert_eq!(m.score(), 1);

    m.handle(Intent::PauseToggle);
    assert_eq!(m.phase(), GamePhase::Paused);
    assert!(m.tick().is_noop());

    m.handle(Intent::PauseToggle);
    assert_eq!(m.phase(), GamePhase::Playing);

    m.handle(Intent::Reset);
    assert_eq!(m.phase(), GamePhase::Idle);
    assert_eq!(m.score(), 0);
    assert_eq!(m.high_score(), 1);
}

#[test]
fn test_high_score_survives_a_new_machine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    let mut m = GameMachine::new(
        MergeEngine::with_board(
            MergeConfig::default(),
            merge_board([[8, 8, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
        ),
        Box::new(JsonFileScoreStore::new(&path)),
        Box::new(SimpleRng::new(2)),
    );
    m.handle(Intent::Start);
    let frame = m.handle(Intent::step(Direction::Left));
    assert!(frame.events.contains(&GameEvent::NewHighScore { value: 16 }));

    let mut rng = SimpleRng::new(9);
    let fresh = GameMachine::new(
        MergeEngine::new(MergeConfig::default(), &mut rng),
        Box::new(JsonFileScoreStore::new(&path)),
        Box::new(rng),
    );
    assert_eq!(fresh.high_score(), 16);
    assert_eq!(fresh.score(), 0);
}

#[test]
fn test_failed_write_is_retried_with_latest_value() {
    let saved = Arc::new(Mutex::new(Vec::new()));
    let store = FlakyStore {
        failures: 1,
        saved: Arc::clone(&saved),
    };
    let mut m = GameMachine::new(
        MergeEngine::with_board(
            MergeConfig::default(),
            merge_board([[2, 2, 0, 0], [2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
        ),
        Box::new(store),
        Box::new(SimpleRng::new(2)),
    );
    m.handle(Intent::Start);

    let first = m.handle(Intent::step(Direction::Left));
    assert!(first
        .events
        .contains(&GameEvent::HighScoreNotSaved { value: 8 }));
    assert_eq!(m.phase(), GamePhase::Playing);
    assert!(saved.lock().unwrap().is_empty());

    // Column 0 now starts 4, 4 so Up always merges; the retry carries the newer value.
    let second = m.handle(Intent::step(Direction::Up));
    assert!(second.events.contains(&GameEvent::Scored { delta: 8 }));
    assert_eq!(m.score(), 16);
    assert_eq!(*saved.lock().unwrap(), vec![16]);
}

#[test]
fn test_snapshot_serializes_for_the_view() {
    let mut m = snake_machine(Box::new(MemoryScoreStore::new()));
    m.handle(Intent::Start);
    let json = serde_json::to_value(m.snapshot()).unwrap();
    assert_eq!(json["game"], "snake");
    assert_eq!(json["phase"], "playing");
    assert_eq!(json["score"], 0);
    assert!(json["board"]["cells"].is_object());

    let event = serde_json::to_value(GameEvent::GameOver { final_score: 3 }).unwrap();
    assert_eq!(event["event"], "gameOver");
}

#[test]
fn test_restart_after_game_over_uses_fresh_engine() {
    let mut m = GameMachine::new(
        MergeEngine::with_board(
            MergeConfig::default(),
            merge_board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]),
        ),
        Box::new(MemoryScoreStore::new()),
        Box::new(SimpleRng::new(4)),
    );
    m.handle(Intent::Start);
    assert_eq!(m.phase(), GamePhase::GameOver);

    let restart = m.handle(Intent::Start);
    assert_eq!(m.phase(), GamePhase::Playing);
    assert!(restart.events.contains(&GameEvent::PhaseChanged {
        phase: GamePhase::Playing
    }));
    assert_eq!(m.engine().board().count_occupied(), 2);
    assert!(!m.engine().is_terminal());
}
