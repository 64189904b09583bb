//! Simulator settings
//!
//! Read from `MINIGAMES_*` environment variables; the binary layers its
//! command line flags on top.

use std::path::PathBuf;

use minigames_core::bubble::Difficulty;
use minigames_core::snake::SnakeMode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown game '{0}' (expected snake, tetris, 2048 or bubble-pop)")]
    UnknownGame(String),
    #[error("unknown difficulty '{0}' (expected easy, normal or hard)")]
    UnknownDifficulty(String),
    #[error("unknown snake mode '{0}' (expected single, 2p or ai)")]
    UnknownMode(String),
    #[error("{name} must be a non-negative integer, got '{value}'")]
    NotANumber { name: &'static str, value: String },
}

/// Which engine to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameKind {
    #[default]
    Snake,
    Tetris,
    Merge,
    Bubble,
}

impl GameKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snake" => Some(GameKind::Snake),
            "tetris" => Some(GameKind::Tetris),
            "2048" | "merge" => Some(GameKind::Merge),
            "bubble-pop" | "bubble" | "bubblepop" => Some(GameKind::Bubble),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::Tetris => "tetris",
            GameKind::Merge => "2048",
            GameKind::Bubble => "bubble-pop",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub game: GameKind,
    /// Fixed seed for a reproducible run; live entropy when absent
    pub seed: Option<u64>,
    /// JSON high score file; scores stay in memory when absent
    pub store_path: Option<PathBuf>,
    pub difficulty: Difficulty,
    pub snake_mode: SnakeMode,
    /// Stop after this many published frames
    pub max_frames: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            game: GameKind::Snake,
            seed: None,
            store_path: None,
            difficulty: Difficulty::Normal,
            snake_mode: SnakeMode::Single,
            max_frames: Some(2000),
        }
    }
}

impl SimConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SimConfig::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let mut config = Self::default();

        if let Some(game) = var("MINIGAMES_GAME") {
            config.set_game(&game)?;
        }
        if let Some(seed) = var("MINIGAMES_SEED") {
            config.seed = Some(parse_number("MINIGAMES_SEED", &seed)?);
        }
        config.store_path = var("MINIGAMES_STORE_PATH").map(PathBuf::from);
        if let Some(difficulty) = var("MINIGAMES_DIFFICULTY") {
            config.set_difficulty(&difficulty)?;
        }
        if let Some(mode) = var("MINIGAMES_SNAKE_MODE") {
            config.set_snake_mode(&mode)?;
        }
        if let Some(frames) = var("MINIGAMES_MAX_FRAMES") {
            let n = parse_number("MINIGAMES_MAX_FRAMES", &frames)?;
            config.max_frames = (n > 0).then_some(n);
        }
        Ok(config)
    }

    pub fn set_game(&mut self, value: &str) -> Result<(), ConfigError> {
        self.game =
            GameKind::from_str(value).ok_or_else(|| ConfigError::UnknownGame(value.to_string()))?;
        Ok(())
    }

    pub fn set_difficulty(&mut self, value: &str) -> Result<(), ConfigError> {
        self.difficulty = Difficulty::from_str(value)
            .ok_or_else(|| ConfigError::UnknownDifficulty(value.to_string()))?;
        Ok(())
    }

    pub fn set_snake_mode(&mut self, value: &str) -> Result<(), ConfigError> {
        self.snake_mode =
            SnakeMode::from_str(value).ok_or_else(|| ConfigError::UnknownMode(value.to_string()))?;
        Ok(())
    }
}

pub fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        name,
        value: value.to_string(),
    })
}
