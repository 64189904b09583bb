//! Tetris engine - falling pieces, line clears and gravity
//!
//! Classic rules without the modern extras: matrix rotation with no kicks, no
//! hold, no lock delay, no drop points. A piece that cannot fall locks on the
//! spot, full rows are cleared and scored through the line table, and the next
//! piece spawns centred on row 0. A spawn that collides ends the run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::engine::GameEngine;
use crate::pieces::{shape, Shape};
use crate::rng::{PieceQueue, PieceRandomizer, RandomSource};
use crate::scoring::{apply_delta, default_line_table, line_clear_points, HighScorePolicy, SpeedCurve};
use crate::types::{
    Direction, GameEvent, Intent, PieceKind, TETRIS_BASE_INTERVAL_MS, TETRIS_HEIGHT, TETRIS_WIDTH,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TetrisConfig {
    pub width: u16,
    pub height: u16,
    /// Points indexed by simultaneous line count
    pub line_scores: Vec<u32>,
    pub randomizer: PieceRandomizer,
    /// Number of upcoming pieces shown in the snapshot
    pub preview: usize,
    /// Gravity interval over total lines cleared
    pub speed: SpeedCurve,
}

impl Default for TetrisConfig {
    fn default() -> Self {
        Self {
            width: TETRIS_WIDTH,
            height: TETRIS_HEIGHT,
            line_scores: default_line_table(),
            randomizer: PieceRandomizer::Uniform,
            preview: 1,
            speed: SpeedCurve::constant(TETRIS_BASE_INTERVAL_MS),
        }
    }
}

/// The piece under player control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallingPiece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl FallingPiece {
    /// A piece in spawn orientation with its matrix origin at `(x, y)`
    pub fn new(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            shape: shape(kind),
            x,
            y,
        }
    }

    /// Centred on the top row of a board `board_width` wide
    pub fn spawn(kind: PieceKind, board_width: u16) -> Self {
        let s = shape(kind);
        let x = board_width as i32 / 2 - s.width() as i32 / 2;
        Self {
            kind,
            shape: s,
            x,
            y: 0,
        }
    }

    /// Absolute board cells covered by the piece
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.shape
            .cells()
            .iter()
            .map(move |&(dx, dy)| Position::new(self.x + dx as i32, self.y + dy as i32))
    }

    fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }

    fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_cw(),
            ..self.clone()
        }
    }
}

/// True if any cell of the piece is outside the walls, below the floor, or on
/// an occupied cell. Cells above the top edge are allowed.
pub fn collides(board: &Board<PieceKind>, piece: &FallingPiece) -> bool {
    piece.cells().any(|p| {
        p.x < 0
            || p.x >= board.width() as i32
            || p.y >= board.height() as i32
            || (p.y >= 0 && board.is_occupied(p.x, p.y))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub cells: Vec<Position>,
    /// Row offset of the landing position relative to the piece origin
    pub ghost_drop: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TetrisSnapshot {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Vec<Option<PieceKind>>>,
    pub active: Option<ActiveSnapshot>,
    pub next: Vec<PieceKind>,
    pub lines: u32,
}

pub struct TetrisEngine {
    config: TetrisConfig,
    board: Board<PieceKind>,
    active: Option<FallingPiece>,
    queue: PieceQueue,
    score: u32,
    lines: u32,
    topped_out: bool,
}

impl TetrisEngine {
    pub fn new(config: TetrisConfig, rng: &mut dyn RandomSource) -> Self {
        let board = Board::new(config.width, config.height);
        let queue = PieceQueue::new(config.randomizer, config.preview, rng);
        let mut engine = Self {
            config,
            board,
            active: None,
            queue,
            score: 0,
            lines: 0,
            topped_out: false,
        };
        engine.spawn_next(rng);
        engine
    }

    /// Start from a prepared stack and piece
    pub fn with_layout(
        config: TetrisConfig,
        board: Board<PieceKind>,
        active: FallingPiece,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let queue = PieceQueue::new(config.randomizer, config.preview, rng);
        let topped_out = collides(&board, &active);
        Self {
            config,
            board,
            active: if topped_out { None } else { Some(active) },
            queue,
            score: 0,
            lines: 0,
            topped_out,
        }
    }

    pub fn board(&self) -> &Board<PieceKind> {
        &self.board
    }

    pub fn active(&self) -> Option<&FallingPiece> {
        self.active.as_ref()
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    fn spawn_next(&mut self, rng: &mut dyn RandomSource) {
        let piece = FallingPiece::spawn(self.queue.draw(rng), self.config.width);
        if collides(&self.board, &piece) {
            log::debug!("tetris: {:?} cannot spawn, stack topped out", piece.kind);
            self.active = None;
            self.topped_out = true;
        } else {
            self.active = Some(piece);
        }
    }

    /// Replace the active piece if the candidate fits
    fn try_place(&mut self, candidate: FallingPiece) -> bool {
        if collides(&self.board, &candidate) {
            return false;
        }
        self.active = Some(candidate);
        true
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        match &self.active {
            Some(piece) => {
                let candidate = piece.shifted(dx, dy);
                self.try_place(candidate)
            }
            None => false,
        }
    }

    fn try_rotate(&mut self) -> bool {
        match &self.active {
            Some(piece) => {
                let candidate = piece.rotated();
                self.try_place(candidate)
            }
            None => false,
        }
    }

    /// Rows the active piece can still fall
    fn drop_distance(&self, piece: &FallingPiece) -> i32 {
        let mut dy = 0;
        while !collides(&self.board, &piece.shifted(0, dy + 1)) {
            dy += 1;
        }
        dy
    }

    /// One row of gravity; locks when the piece is resting
    fn gravity_step(&mut self, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        if !self.try_shift(0, 1) {
            self.lock(rng, events);
        }
    }

    fn hard_drop(&mut self, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        if let Some(piece) = &self.active {
            let dy = self.drop_distance(piece);
            let landed = piece.shifted(0, dy);
            self.active = Some(landed);
        }
        self.lock(rng, events);
    }

    fn lock(&mut self, rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        let Some(piece) = self.active.take() else {
            return;
        };
        for p in piece.cells() {
            // Cells still above the top edge are lost.
            self.board.set_at(p, Some(piece.kind));
        }

        let cleared = self.board.clear_full_rows().len();
        if cleared > 0 {
            let points = line_clear_points(&self.config.line_scores, cleared);
            self.score = apply_delta(self.score, points);
            self.lines += cleared as u32;
            events.push(GameEvent::LinesCleared {
                lines: cleared as u32,
            });
        }
        self.spawn_next(rng);
        self.debug_check();
    }

    fn debug_check(&self) {
        if let Some(piece) = &self.active {
            debug_assert!(
                !collides(&self.board, piece),
                "active piece overlaps the stack"
            );
        }
    }
}

impl GameEngine for TetrisEngine {
    type Snapshot = TetrisSnapshot;

    fn game_id(&self) -> &'static str {
        "tetris"
    }

    fn high_score_policy(&self) -> HighScorePolicy {
        HighScorePolicy::EndOfRun
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        *self = TetrisEngine::new(self.config.clone(), rng);
    }

    fn apply_intent(
        &mut self,
        intent: Intent,
        rng: &mut dyn RandomSource,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if self.active.is_none() {
            return false;
        }
        match intent {
            Intent::Move { direction, .. } => match direction {
                Direction::Left => self.try_shift(-1, 0),
                Direction::Right => self.try_shift(1, 0),
                Direction::Down => {
                    self.gravity_step(rng, events);
                    true
                }
                Direction::Up => self.try_rotate(),
            },
            Intent::Rotate => self.try_rotate(),
            Intent::HardDrop => {
                self.hard_drop(rng, events);
                true
            }
            _ => false,
        }
    }

    fn tick(&mut self, _buffered: &[Intent], rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        if self.active.is_some() {
            self.gravity_step(rng, events);
        }
    }

    fn is_terminal(&self) -> bool {
        self.topped_out
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(
            self.config.speed.interval_ms(self.lines) as u64,
        ))
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn snapshot(&self) -> TetrisSnapshot {
        TetrisSnapshot {
            width: self.board.width(),
            height: self.board.height(),
            cells: self.board.to_rows(),
            active: self.active.as_ref().map(|piece| ActiveSnapshot {
                kind: piece.kind,
                cells: piece.cells().collect(),
                ghost_drop: self.drop_distance(piece),
            }),
            next: self.queue.preview(),
            lines: self.lines,
        }
    }
}
