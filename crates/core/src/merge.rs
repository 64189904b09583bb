//! 2048 engine - sliding and merging power-of-two tiles
//!
//! A move slides every row (Left/Right) or column (Up/Down) toward the leading
//! edge: tiles compact, equal neighbours merge pairwise starting from the edge
//! (each tile at most once per move), and the merged value is added to the
//! score. A move that changes nothing is rejected. Every accepted move spawns
//! exactly one new tile, after which the game is over if no move remains.
//!
//! The game has no clock: [`GameEngine::tick_interval`] is always `None`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::engine::GameEngine;
use crate::rng::{choose, RandomSource};
use crate::scoring::{apply_delta, HighScorePolicy};
use crate::types::{Direction, GameEvent, Intent, MERGE_FOUR_PROBABILITY, MERGE_SIZE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeConfig {
    pub size: u16,
    /// Chance that a spawned tile is a 4
    pub four_probability: f32,
    /// Tiles placed on a fresh board
    pub start_tiles: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            size: MERGE_SIZE,
            four_probability: MERGE_FOUR_PROBABILITY,
            start_tiles: 2,
        }
    }
}

/// Slide one line toward index 0
///
/// Returns the new line and the points scored by its merges.
pub fn slide_line(line: &[Option<u32>]) -> (Vec<Option<u32>>, u32) {
    let tiles: Vec<u32> = line.iter().flatten().copied().collect();
    let mut out = Vec::with_capacity(line.len());
    let mut points = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            let merged = tiles[i] * 2;
            points += merged;
            out.push(Some(merged));
            i += 2;
        } else {
            out.push(Some(tiles[i]));
            i += 1;
        }
    }
    out.resize(line.len(), None);
    (out, points)
}

/// Result of sliding a whole board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub board: Board<u32>,
    pub points: u32,
    pub moved: bool,
}

/// Cell coordinates of line `i` read from the leading edge of `direction`
fn line_coords(size_x: i32, size_y: i32, direction: Direction, i: i32) -> Vec<(i32, i32)> {
    match direction {
        Direction::Left => (0..size_x).map(|x| (x, i)).collect(),
        Direction::Right => (0..size_x).rev().map(|x| (x, i)).collect(),
        Direction::Up => (0..size_y).map(|y| (i, y)).collect(),
        Direction::Down => (0..size_y).rev().map(|y| (i, y)).collect(),
    }
}

/// Slide every line of the board in `direction`
pub fn slide(board: &Board<u32>, direction: Direction) -> Slide {
    let (w, h) = (board.width() as i32, board.height() as i32);
    let lines = if direction.is_horizontal() { h } else { w };
    let mut next = board.clone();
    let mut points = 0;

    for i in 0..lines {
        let coords = line_coords(w, h, direction, i);
        let line: Vec<Option<u32>> = coords
            .iter()
            .map(|&(x, y)| board.get(x, y).flatten())
            .collect();
        let (slid, gained) = slide_line(&line);
        points += gained;
        for (&(x, y), cell) in coords.iter().zip(slid) {
            next.set(x, y, cell);
        }
    }

    let moved = next != *board;
    Slide {
        board: next,
        points,
        moved,
    }
}

/// No empty cell and no equal orthogonal neighbours
pub fn is_stuck(board: &Board<u32>) -> bool {
    let (w, h) = (board.width() as i32, board.height() as i32);
    for y in 0..h {
        for x in 0..w {
            let Some(Some(value)) = board.get(x, y) else {
                return false;
            };
            if board.get(x + 1, y) == Some(Some(value)) || board.get(x, y + 1) == Some(Some(value))
            {
                return false;
            }
        }
    }
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSnapshot {
    pub size: u16,
    pub cells: Vec<Vec<Option<u32>>>,
    pub max_tile: u32,
}

pub struct MergeEngine {
    config: MergeConfig,
    board: Board<u32>,
    score: u32,
    over: bool,
}

impl MergeEngine {
    pub fn new(config: MergeConfig, rng: &mut dyn RandomSource) -> Self {
        let board = Board::new(config.size, config.size);
        let mut engine = Self {
            config,
            board,
            score: 0,
            over: false,
        };
        engine.fill_start(rng);
        engine
    }

    /// Start from a prepared board (no start tiles are added)
    pub fn with_board(config: MergeConfig, board: Board<u32>) -> Self {
        let over = is_stuck(&board);
        Self {
            config,
            board,
            score: 0,
            over,
        }
    }

    pub fn board(&self) -> &Board<u32> {
        &self.board
    }

    fn fill_start(&mut self, rng: &mut dyn RandomSource) {
        for _ in 0..self.config.start_tiles {
            self.spawn_tile(rng);
        }
        self.over = is_stuck(&self.board);
    }

    /// Place a 2 (or, rarely, a 4) on a random empty cell
    fn spawn_tile(&mut self, rng: &mut dyn RandomSource) -> Option<GameEvent> {
        let empty = self.board.empty_cells();
        let pos = *choose(rng, &empty)?;
        let value = if rng.chance(self.config.four_probability) {
            4
        } else {
            2
        };
        self.board.set_at(pos, Some(value));
        Some(GameEvent::TileSpawned {
            x: pos.x as u16,
            y: pos.y as u16,
            value,
        })
    }

    fn debug_check(&self) {
        debug_assert!(
            self.board.cells().iter().flatten().all(|v| v.is_power_of_two() && *v >= 2),
            "non power-of-two tile on the board"
        );
    }
}

impl GameEngine for MergeEngine {
    type Snapshot = MergeSnapshot;

    fn game_id(&self) -> &'static str {
        "2048"
    }

    fn high_score_policy(&self) -> HighScorePolicy {
        HighScorePolicy::Continuous
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.board = Board::new(self.config.size, self.config.size);
        self.score = 0;
        self.fill_start(rng);
    }

    fn apply_intent(
        &mut self,
        intent: Intent,
        rng: &mut dyn RandomSource,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let Intent::Move { direction, .. } = intent else {
            return false;
        };
        if self.over {
            return false;
        }
        let result = slide(&self.board, direction);
        if !result.moved {
            return false;
        }
        self.board = result.board;
        self.score = apply_delta(self.score, result.points);
        if let Some(event) = self.spawn_tile(rng) {
            events.push(event);
        }
        self.over = is_stuck(&self.board);
        self.debug_check();
        true
    }

    fn tick(&mut self, _buffered: &[Intent], _rng: &mut dyn RandomSource, _events: &mut Vec<GameEvent>) {}

    fn is_terminal(&self) -> bool {
        self.over
    }

    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn snapshot(&self) -> MergeSnapshot {
        MergeSnapshot {
            size: self.config.size,
            cells: self.board.to_rows(),
            max_tile: self.board.cells().iter().flatten().copied().max().unwrap_or(0),
        }
    }
}
