//! High score persistence
//!
//! The engines only ever need "load a number" and "save a number" per game, so
//! the store is a tiny key-value trait. Failures are reported, never fatal: the
//! state machine falls back to 0 on a failed read and retries failed writes.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store unavailable: {0}")]
    Unavailable(String),
    #[error("score store io error: {0}")]
    Io(#[from] io::Error),
    #[error("score store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persisted high score per game id
pub trait ScoreStore {
    fn get(&self, game_id: &str) -> Result<u32, StoreError>;
    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError>;
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    scores: HashMap<String, u32>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, game_id: &str, value: u32) -> Self {
        self.scores.insert(game_id.to_string(), value);
        self
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, game_id: &str) -> Result<u32, StoreError> {
        Ok(self.scores.get(game_id).copied().unwrap_or(0))
    }

    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError> {
        self.scores.insert(game_id.to_string(), value);
        Ok(())
    }
}

/// All high scores in one JSON object on disk, e.g. `{"snake": 12, "2048": 3400}`
///
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileScoreStore {
    path: PathBuf,
}

impl JsonFileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, u32>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) if json.trim().is_empty() => Ok(HashMap::new()),
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ScoreStore for JsonFileScoreStore {
    fn get(&self, game_id: &str) -> Result<u32, StoreError> {
        Ok(self.read_all()?.get(game_id).copied().unwrap_or(0))
    }

    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError> {
        let mut scores = self.read_all()?;
        scores.insert(game_id.to_string(), value);
        let json = serde_json::to_string_pretty(&scores)?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("high score {} = {} written to {}", game_id, value, self.path.display());
        Ok(())
    }
}

impl<S: ScoreStore + ?Sized> ScoreStore for Box<S> {
    fn get(&self, game_id: &str) -> Result<u32, StoreError> {
        (**self).get(game_id)
    }

    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError> {
        (**self).set(game_id, value)
    }
}
