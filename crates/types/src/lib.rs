//! Core types module - shared data structures and constants
//!
//! This module defines the vocabulary shared by every engine, the state machine,
//! the runtime and the view layer: decoded player intents, emitted game events,
//! game phases and the per-game tuning constants.
//! All types are plain data with serde derives so they can cross any boundary
//! (JSON frames, config files, test fixtures).
//!
//! # Default Dimensions
//!
//! | Game | Width | Height |
//! |------|-------|--------|
//! | Snake | 20 | 20 |
//! | Tetris | 10 | 20 |
//! | 2048 | 4 | 4 |
//! | Bubble-Pop | 800.0 px | 600.0 px (continuous canvas) |
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SNAKE_BASE_INTERVAL_MS` | 200 | Snake tick interval at score 0 |
//! | `SNAKE_SPEED_STEP` | 5 | Points per speed-up step |
//! | `SNAKE_SPEED_DECREMENT_MS` | 10 | Interval reduction per step |
//! | `SNAKE_MIN_INTERVAL_MS` | 50 | Snake interval floor |
//! | `TETRIS_BASE_INTERVAL_MS` | 1000 | Gravity interval |
//! | `BUBBLE_FRAME_MS` | 50 | Bubble-Pop simulation frame |
//! | `BUBBLE_ROUND_MS` | 60000 | Bubble-Pop round length |
//! | `BUBBLE_FREEZE_MS` | 3000 | Ice bubble freeze duration |
//!
//! # Examples
//!
//! ```
//! use minigames_types::{Direction, Intent, Player};
//!
//! assert_eq!(Direction::Up.opposite(), Direction::Down);
//! assert_eq!(Direction::from_str("left"), Some(Direction::Left));
//!
//! let intent = Intent::Move { player: Player::One, direction: Direction::Right };
//! assert_eq!(intent, Intent::step(Direction::Right));
//! ```

use serde::{Deserialize, Serialize};

/// Snake grid width and height (square board)
pub const SNAKE_GRID_SIZE: u16 = 20;

/// Snake tick interval at score 0
pub const SNAKE_BASE_INTERVAL_MS: u32 = 200;

/// Points needed for each snake speed-up step
pub const SNAKE_SPEED_STEP: u32 = 5;

/// Interval reduction applied per speed-up step
pub const SNAKE_SPEED_DECREMENT_MS: u32 = 10;

/// Snake interval floor
pub const SNAKE_MIN_INTERVAL_MS: u32 = 50;

/// Player one spawns at least this many cells away from every wall
pub const SNAKE_SAFE_MARGIN: u16 = 4;

/// Tetris board width in cells
pub const TETRIS_WIDTH: u16 = 10;

/// Tetris board height in cells
pub const TETRIS_HEIGHT: u16 = 20;

/// Tetris gravity interval
pub const TETRIS_BASE_INTERVAL_MS: u32 = 1000;

/// Line clear scoring table, indexed by simultaneous line count
///
/// - 0 lines: 0 points
/// - 1 line: 40 points
/// - 2 lines: 100 points
/// - 3 lines: 300 points
/// - 4 lines: 1200 points
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

/// 2048 board side length
pub const MERGE_SIZE: u16 = 4;

/// Probability that a spawned 2048 tile is a 4 instead of a 2
pub const MERGE_FOUR_PROBABILITY: f32 = 0.1;

/// Bubble-Pop simulation frame
pub const BUBBLE_FRAME_MS: u32 = 50;

/// Bubble-Pop round length
pub const BUBBLE_ROUND_MS: u32 = 60_000;

/// How long an ice pop freezes every live bubble
pub const BUBBLE_FREEZE_MS: u32 = 3000;

/// Bomb blast radius in canvas pixels
pub const BUBBLE_BOMB_RADIUS: f32 = 100.0;

/// Consecutive same-kind pops needed before combo bonuses apply
pub const COMBO_THRESHOLD: u32 = 3;

/// Default Bubble-Pop canvas width
pub const BUBBLE_CANVAS_WIDTH: f32 = 800.0;

/// Default Bubble-Pop canvas height
pub const BUBBLE_CANVAS_HEIGHT: f32 = 600.0;

/// Cardinal movement direction
///
/// Screen coordinates: `y` grows downward, so `Up` is `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, in the tie-break order used by the snake AI
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The direction pointing the other way
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit vector `(dx, dy)`
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// True for `Left` and `Right`
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Parse direction from string (case-insensitive)
    ///
    /// Accepts full names or single letters: "up" | "u", "down" | "d", ...
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Which seat an intent belongs to
///
/// Only Snake has a second seat (two-player or versus-AI modes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Zero-based seat index
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

/// Maximum number of seats in a single game instance
pub const MAX_PLAYERS: usize = 2;

/// What an `Activate` intent points at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActivateTarget {
    /// A live bubble by id
    Bubble { id: u32 },
    /// A canvas point; the topmost bubble under it is hit
    Point { x: f32, y: f32 },
}

/// A decoded player input
///
/// Produced by the view layer (arrow keys, WASD, swipes, clicks) and consumed by
/// the state machine. Engines never see raw device input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    Move { player: Player, direction: Direction },
    Rotate,
    HardDrop,
    Activate { target: ActivateTarget },
    PauseToggle,
    Start,
    Reset,
}

impl Intent {
    /// Shorthand for a player one move
    pub fn step(direction: Direction) -> Self {
        Intent::Move {
            player: Player::One,
            direction,
        }
    }
}

/// Lifecycle phase of a game instance
///
/// `Idle` is the only start phase; `GameOver` is terminal until `Reset` or `Start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    #[default]
    Idle,
    Playing,
    Paused,
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Playing => "playing",
            GamePhase::Paused => "paused",
            GamePhase::GameOver => "gameOver",
        }
    }
}

/// The seven tetromino kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    L,
    J,
}

impl PieceKind {
    /// All kinds in table order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::L,
        PieceKind::J,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use minigames_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("T"), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "l" => Some(PieceKind::L),
            "j" => Some(PieceKind::J),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::L => "l",
            PieceKind::J => "j",
        }
    }
}

/// Bubble variants
///
/// - **Normal**: one point
/// - **Special**: doubles the points of its pop
/// - **Ice**: freezes every live bubble for a while
/// - **Bomb**: clears every other bubble within the blast radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleKind {
    #[default]
    Normal,
    Special,
    Ice,
    Bomb,
}

impl BubbleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BubbleKind::Normal => "normal",
            BubbleKind::Special => "special",
            BubbleKind::Ice => "ice",
            BubbleKind::Bomb => "bomb",
        }
    }
}

/// Semantic events published to the view after every machine call
///
/// Collaborators translate these into sound, toasts or text; events are emitted
/// in the order they happened within the call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    /// Score grew by `delta`
    Scored { delta: u32 },
    /// Tetris rows removed by one lock
    LinesCleared { lines: u32 },
    /// A bubble was popped by the player
    BubblePopped { kind: BubbleKind },
    /// Combo bonus granted on a pop
    ComboBonus { combo: u32, points: u32 },
    /// Every live bubble is frozen until the given round time
    Frozen { until_ms: u64 },
    /// A snake reached the food
    FoodEaten { player: Player },
    /// 2048 spawned a tile
    TileSpawned { x: u16, y: u16, value: u32 },
    /// Whole seconds left in a timed round
    TimeLeft { secs: u32 },
    /// A snake collided
    PlayerLost { player: Player },
    /// The run beat the stored high score
    NewHighScore { value: u32 },
    /// The score store rejected a write; it will be retried
    HighScoreNotSaved { value: u32 },
    PhaseChanged { phase: GamePhase },
    GameOver { final_score: u32 },
}
