//! Autoplayers for every game
//!
//! A pilot looks at the board part of one published snapshot and answers with
//! at most one intent. Plans that need several intents (Tetris placements) are
//! queued inside the pilot and handed out one observation at a time, so a pilot
//! never floods the intent channel.

use std::collections::VecDeque;

use minigames_core::bubble::{Bubble, BubbleSnapshot};
use minigames_core::merge::{slide, MergeSnapshot};
use minigames_core::snake::{ai_direction, Snake, SnakeSnapshot};
use minigames_core::tetris::TetrisSnapshot;
use minigames_core::types::{ActivateTarget, Direction, Intent, Player};
use minigames_core::{Board, Position};

use crate::place::best_place;

pub trait Autoplay {
    /// Board part of the snapshot this pilot understands
    type Board;

    /// Next intent to send after observing `board`, if any
    fn next_intent(&mut self, board: &Self::Board) -> Option<Intent>;
}

/// Steers player one with the same greedy rule the versus-AI seat uses
///
/// A turn only shows up in the snapshot after the next tick, so the last turn
/// is remembered together with the head it was chosen for and not repeated
/// until the snake has moved.
#[derive(Debug, Default)]
pub struct SnakePilot {
    sent: Option<(Direction, Position)>,
}

impl Autoplay for SnakePilot {
    type Board = SnakeSnapshot;

    fn next_intent(&mut self, board: &SnakeSnapshot) -> Option<Intent> {
        let snakes: Vec<(Player, Snake)> = board
            .snakes
            .iter()
            .map(|v| (v.player, Snake::new(v.segments.iter().copied(), v.direction)))
            .collect();
        let (_, me) = snakes.iter().find(|(p, _)| *p == Player::One)?;
        let others: Vec<&Snake> = snakes
            .iter()
            .filter(|(p, _)| *p != Player::One)
            .map(|(_, s)| s)
            .collect();

        let direction = ai_direction(me, board.food, &others, board.width, board.height);
        if direction == me.direction() || self.sent == Some((direction, me.head())) {
            return None;
        }
        self.sent = Some((direction, me.head()));
        Some(Intent::step(direction))
    }
}

/// Places each new piece at the best reachable spot
#[derive(Debug, Default)]
pub struct TetrisPilot {
    queued: VecDeque<Intent>,
}

impl Autoplay for TetrisPilot {
    type Board = TetrisSnapshot;

    fn next_intent(&mut self, board: &TetrisSnapshot) -> Option<Intent> {
        if self.queued.is_empty() {
            let placement = best_place(board)?;
            self.queued.extend(placement.intents);
        }
        self.queued.pop_front()
    }
}

/// Greedy 2048: keep the board as empty as possible, prefer bigger merges,
/// then the corner-friendly order Down, Left, Right, Up
#[derive(Debug, Default)]
pub struct MergePilot;

const MERGE_ORDER: [Direction; 4] = [
    Direction::Down,
    Direction::Left,
    Direction::Right,
    Direction::Up,
];

impl Autoplay for MergePilot {
    type Board = MergeSnapshot;

    fn next_intent(&mut self, board: &MergeSnapshot) -> Option<Intent> {
        let board = Board::from_rows(board.cells.clone())?;
        MERGE_ORDER
            .into_iter()
            .filter_map(|dir| {
                let result = slide(&board, dir);
                result.moved.then(|| {
                    let empty = result.board.empty_cells().len() as u32;
                    (dir, empty * 4 + result.points)
                })
            })
            .fold(None, |best: Option<(Direction, u32)>, (dir, value)| match best {
                Some((_, v)) if v >= value => best,
                _ => Some((dir, value)),
            })
            .map(|(dir, _)| Intent::step(dir))
    }
}

/// Pops the bubble closest to escaping, favouring the kind that keeps the
/// combo going, at most once every `cooldown` observations
#[derive(Debug)]
pub struct BubblePilot {
    cooldown: u32,
    wait: u32,
}

impl BubblePilot {
    pub fn new(cooldown: u32) -> Self {
        Self { cooldown, wait: 0 }
    }
}

impl Default for BubblePilot {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Autoplay for BubblePilot {
    type Board = BubbleSnapshot;

    fn next_intent(&mut self, board: &BubbleSnapshot) -> Option<Intent> {
        if self.wait > 0 {
            self.wait -= 1;
            return None;
        }
        let target = highest(board.bubbles.iter().filter(|b| b.kind == board.last_kind))
            .or_else(|| highest(board.bubbles.iter()))?;
        self.wait = self.cooldown;
        Some(Intent::Activate {
            target: ActivateTarget::Bubble { id: target },
        })
    }
}

/// Smallest y is nearest the top edge
fn highest<'a>(bubbles: impl Iterator<Item = &'a Bubble>) -> Option<u32> {
    bubbles.min_by(|a, b| a.y.total_cmp(&b.y)).map(|b| b.id)
}
