use serde::Serialize;

use crate::types::{GameEvent, GamePhase};

/// Everything the view needs to draw one frame of a game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot<S> {
    pub game: &'static str,
    pub phase: GamePhase,
    pub score: u32,
    pub high_score: u32,
    pub board: S,
}

impl<S> GameSnapshot<S> {
    pub fn playable(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}

/// A snapshot together with the events that led to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport<S> {
    pub events: Vec<GameEvent>,
    pub snapshot: GameSnapshot<S>,
}
