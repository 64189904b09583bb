//! Tetris placement planning
//!
//! Works purely from a [`TetrisSnapshot`]: the active piece's orientation is
//! recovered by matching its cells against the rotations of its kind, then a
//! route of `Rotate`, `Move` and `HardDrop` intents is checked step by step
//! against the collision rule before it is handed out.

use minigames_core::pieces::shape;
use minigames_core::tetris::{collides, FallingPiece, TetrisSnapshot};
use minigames_core::types::{Direction, Intent, PieceKind};
use minigames_core::Board;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    NoActive,
    InvalidBoard,
    UnknownOrientation,
    RotationBlocked,
    XOutOfBounds,
    XBlocked,
}

impl PlaceError {
    pub fn code(self) -> &'static str {
        match self {
            PlaceError::NoActive => "no_active",
            PlaceError::InvalidBoard | PlaceError::UnknownOrientation => "invalid_snapshot",
            PlaceError::RotationBlocked | PlaceError::XOutOfBounds | PlaceError::XBlocked => {
                "invalid_place"
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PlaceError::NoActive => "no active piece",
            PlaceError::InvalidBoard => "snapshot rows are ragged or empty",
            PlaceError::UnknownOrientation => "active cells match no rotation of the piece",
            PlaceError::RotationBlocked => "could not rotate to target rotation",
            PlaceError::XOutOfBounds => "target x would place piece out of bounds",
            PlaceError::XBlocked => "could not move to target x due to collision",
        }
    }
}

/// A scored landing spot together with the intents that reach it
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub x: i32,
    /// Clockwise quarter turns from the spawn orientation
    pub rotation: u8,
    pub intents: Vec<Intent>,
    pub lines: usize,
    pub score: f32,
}

fn sorted_offsets(cells: impl Iterator<Item = (i32, i32)>) -> Vec<(i32, i32)> {
    let mut cells: Vec<(i32, i32)> = cells.collect();
    let min_x = cells.iter().map(|c| c.0).min().unwrap_or(0);
    let min_y = cells.iter().map(|c| c.1).min().unwrap_or(0);
    for c in &mut cells {
        *c = (c.0 - min_x, c.1 - min_y);
    }
    cells.sort_unstable();
    cells
}

/// Rebuild the active piece and its rotation index from the snapshot
pub fn active_piece(snap: &TetrisSnapshot) -> Result<(FallingPiece, u8), PlaceError> {
    let active = snap.active.as_ref().ok_or(PlaceError::NoActive)?;
    let x = active.cells.iter().map(|p| p.x).min().ok_or(PlaceError::NoActive)?;
    let y = active.cells.iter().map(|p| p.y).min().ok_or(PlaceError::NoActive)?;
    let wanted = sorted_offsets(active.cells.iter().map(|p| (p.x, p.y)));

    let mut s = shape(active.kind);
    for rotation in 0..4u8 {
        let offsets = sorted_offsets(s.cells().iter().map(|&(dx, dy)| (dx as i32, dy as i32)));
        if offsets == wanted {
            let piece = FallingPiece {
                kind: active.kind,
                shape: s,
                x,
                y,
            };
            return Ok((piece, rotation));
        }
        s = s.rotated_cw();
    }
    Err(PlaceError::UnknownOrientation)
}

fn route(
    board: &Board<PieceKind>,
    mut piece: FallingPiece,
    rotation: u8,
    target_x: i32,
    target_rot: u8,
) -> Result<(FallingPiece, Vec<Intent>), PlaceError> {
    let mut intents = Vec::new();

    let turns = (target_rot % 4 + 4 - rotation % 4) % 4;
    for _ in 0..turns {
        let next = FallingPiece {
            shape: piece.shape.rotated_cw(),
            ..piece.clone()
        };
        if collides(board, &next) {
            return Err(PlaceError::RotationBlocked);
        }
        piece = next;
        intents.push(Intent::Rotate);
    }

    let width = piece.shape.width() as i32;
    if target_x < 0 || target_x + width > board.width() as i32 {
        return Err(PlaceError::XOutOfBounds);
    }

    let (step, direction) = if target_x >= piece.x {
        (1, Direction::Right)
    } else {
        (-1, Direction::Left)
    };
    while piece.x != target_x {
        let next = FallingPiece {
            x: piece.x + step,
            ..piece.clone()
        };
        if collides(board, &next) {
            return Err(PlaceError::XBlocked);
        }
        piece = next;
        intents.push(Intent::step(direction));
    }

    intents.push(Intent::HardDrop);
    Ok((piece, intents))
}

/// Intents that rotate the active piece to `target_rot` quarter turns, shift
/// it to column `target_x` and hard drop it
pub fn plan_place(
    snap: &TetrisSnapshot,
    target_x: i32,
    target_rot: u8,
) -> Result<Vec<Intent>, PlaceError> {
    let board = Board::from_rows(snap.cells.clone()).ok_or(PlaceError::InvalidBoard)?;
    let (piece, rotation) = active_piece(snap)?;
    route(&board, piece, rotation, target_x, target_rot).map(|(_, intents)| intents)
}

/// Column heights, holes and bumpiness folded into one number; higher is better
fn evaluate(board: &Board<PieceKind>, lines: usize) -> f32 {
    let (w, h) = (board.width() as i32, board.height() as i32);
    let mut heights = Vec::with_capacity(w as usize);
    let mut holes = 0;
    for x in 0..w {
        let top = (0..h).find(|&y| board.is_occupied(x, y)).unwrap_or(h);
        heights.push(h - top);
        holes += (top..h).filter(|&y| board.is_vacant(x, y)).count();
    }
    let aggregate: i32 = heights.iter().sum();
    let bumpiness: i32 = heights.windows(2).map(|p| (p[0] - p[1]).abs()).sum();

    -0.51 * aggregate as f32 + 0.76 * lines as f32 - 0.36 * holes as f32 - 0.18 * bumpiness as f32
}

/// Best reachable landing spot for the active piece, if any
pub fn best_place(snap: &TetrisSnapshot) -> Option<Placement> {
    let board = Board::from_rows(snap.cells.clone())?;
    let (piece, rotation) = active_piece(snap).ok()?;
    let mut best: Option<Placement> = None;

    for target_rot in 0..4u8 {
        for target_x in 0..board.width() as i32 {
            let Ok((mut landed, intents)) =
                route(&board, piece.clone(), rotation, target_x, target_rot)
            else {
                continue;
            };
            while !collides(
                &board,
                &FallingPiece {
                    y: landed.y + 1,
                    ..landed.clone()
                },
            ) {
                landed.y += 1;
            }

            let mut after = board.clone();
            for p in landed.cells() {
                after.set_at(p, Some(landed.kind));
            }
            let lines = after.clear_full_rows().len();
            let score = evaluate(&after, lines);

            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Placement {
                    x: target_x,
                    rotation: target_rot,
                    intents,
                    lines,
                    score,
                });
            }
        }
    }
    best
}
