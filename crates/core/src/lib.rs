//! Core game logic - engines, scoring and the game state machine
//!
//! Everything here is synchronous and free of I/O apart from the optional
//! file-backed score store. Time only advances when the caller ticks a
//! [`GameMachine`]; randomness only comes from an injected [`RandomSource`].
//!
//! # Module Structure
//!
//! - [`board`]: fixed-size grid shared by the grid games
//! - [`engine`]: the [`GameEngine`] trait every game implements
//! - [`machine`]: phase handling, score accounting, intent buffering, timers
//! - [`scoring`]: point tables, speed curves, combo rule, high-score policy
//! - [`rng`]: deterministic and live random sources, tetromino queue
//! - [`store`]: high score persistence
//! - [`snake`], [`tetris`] (+ [`pieces`]), [`merge`] (2048), [`bubble`]: the games
//!
//! # Example
//!
//! ```
//! use minigames_core::{GameMachine, MemoryScoreStore, MergeConfig, MergeEngine, SimpleRng};
//! use minigames_core::types::{Direction, GamePhase, Intent};
//!
//! let mut rng = SimpleRng::new(7);
//! let engine = MergeEngine::new(MergeConfig::default(), &mut rng);
//! let mut machine = GameMachine::new(engine, Box::new(MemoryScoreStore::new()), Box::new(rng));
//!
//! machine.handle(Intent::Start);
//! assert_eq!(machine.phase(), GamePhase::Playing);
//!
//! for dir in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
//!     machine.handle(Intent::step(dir));
//! }
//! assert!(machine.snapshot().board.max_tile >= 2);
//! ```

pub mod board;
pub mod bubble;
pub mod engine;
pub mod machine;
pub mod merge;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snake;
pub mod snapshot;
pub mod store;
pub mod tetris;

pub use minigames_types as types;

pub use board::{Board, Position};
pub use bubble::{Bubble, BubbleConfig, BubbleEngine, BubbleSnapshot, Difficulty};
pub use engine::GameEngine;
pub use machine::{Frame, GameMachine, Schedule};
pub use merge::{MergeConfig, MergeEngine, MergeSnapshot};
pub use rng::{LiveRng, PieceQueue, PieceRandomizer, RandomSource, SimpleRng};
pub use scoring::{HighScorePolicy, Scoreboard, SpeedCurve};
pub use snake::{Snake, SnakeConfig, SnakeEngine, SnakeMode, SnakeSnapshot};
pub use snapshot::{FrameReport, GameSnapshot};
pub use store::{JsonFileScoreStore, MemoryScoreStore, ScoreStore, StoreError};
pub use tetris::{FallingPiece, TetrisConfig, TetrisEngine, TetrisSnapshot};
