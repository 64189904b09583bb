//! Board module - fixed-size 2D grid shared by the grid games
//!
//! Each cell is either empty (`None`) or occupied by a game-specific value
//! (`Some(T)`): a tetromino kind for Tetris, a tile value for 2048, a body or
//! food marker for Snake snapshots.
//! Uses a flat row-major vector sized once at construction.
//! Coordinates: (x, y) where x grows left to right and y grows top to bottom.

use serde::{Deserialize, Serialize};

/// A cell coordinate
///
/// Signed so that proposed positions just outside the board can be expressed
/// and rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by `(dx, dy)`
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// The game board - `width` columns x `height` rows using flat storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board<T> {
    width: u16,
    height: u16,
    /// Flat vector of cells, row-major order (y * width + x)
    cells: Vec<Option<T>>,
}

impl<T: Copy> Board<T> {
    /// Create a new empty board
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.within_bounds(x, y) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Check if (x, y) lies on the board
    pub fn within_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Option<T>> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Option<T>) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    pub fn get_at(&self, pos: Position) -> Option<Option<T>> {
        self.get(pos.x, pos.y)
    }

    pub fn set_at(&mut self, pos: Position, cell: Option<T>) -> bool {
        self.set(pos.x, pos.y, cell)
    }

    /// Check if position is within bounds and empty
    pub fn is_vacant(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(None))
    }

    /// Check if position is within bounds and filled
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y).is_some_and(|row| row.iter().all(|cell| cell.is_some()))
    }

    /// Borrow one row
    pub fn row(&self, y: usize) -> Option<&[Option<T>]> {
        if y >= self.height as usize {
            return None;
        }
        let width = self.width as usize;
        let start = y * width;
        Some(&self.cells[start..start + width])
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Option<T>]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Clear all full rows and return the row indices that were cleared (sorted bottom to top)
    ///
    /// Rows above each cleared row shift down to fill the gap; the freed rows
    /// at the top become empty. Uses a two-pointer pass, so any number of
    /// (possibly non-adjacent) full rows is handled in one call.
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let mut cleared_rows = Vec::new();
        let width = self.width as usize;
        let mut write_y = self.height as usize;

        // Scan from bottom to top
        for read_y in (0..self.height as usize).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * width;
                    let dst_start = write_y * width;
                    self.cells
                        .copy_within(src_start..src_start + width, dst_start);
                }
            }
        }

        // Clear the remaining rows at the top
        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared_rows
    }

    /// Every empty cell, row-major
    pub fn empty_cells(&self) -> Vec<Position> {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(idx, _)| Position::new((idx % width) as i32, (idx / width) as i32))
            .collect()
    }

    pub fn count_occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Get a reference to the internal cells
    pub fn cells(&self) -> &[Option<T>] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }

    /// Create from rows (top to bottom)
    ///
    /// Returns None if the rows are ragged or empty.
    pub fn from_rows(rows: Vec<Vec<Option<T>>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width: u16::try_from(width).ok()?,
            height: u16::try_from(height).ok()?,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Convert to rows (top to bottom)
    pub fn to_rows(&self) -> Vec<Vec<Option<T>>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_index_calculation() {
        let board: Board<u8> = Board::new(10, 20);
        assert_eq!(board.index(0, 0), Some(0));
        assert_eq!(board.index(9, 0), Some(9));
        assert_eq!(board.index(0, 1), Some(10));
        assert_eq!(board.index(9, 19), Some(199));
        assert_eq!(board.index(-1, 0), None);
        assert_eq!(board.index(10, 0), None);
        assert_eq!(board.index(0, 20), None);
    }

    #[test]
    fn test_board_flat_storage() {
        let mut board = Board::new(4, 4);
        board.set(0, 0, Some(2u32));
        board.set(3, 2, Some(8u32));

        assert_eq!(board.get(0, 0), Some(Some(2)));
        assert_eq!(board.get(3, 2), Some(Some(8)));
        assert_eq!(board.cells[2 * 4 + 3], Some(8));
    }

    #[test]
    fn test_board_from_rows_roundtrip() {
        let mut rows = vec![vec![None; 3]; 2];
        rows[1][2] = Some('x');
        let board = Board::from_rows(rows.clone()).unwrap();
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 2);
        assert_eq!(board.to_rows(), rows);
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows = vec![vec![None::<u8>; 3], vec![None; 2]];
        assert!(Board::from_rows(rows).is_none());
        assert!(Board::<u8>::from_rows(Vec::new()).is_none());
    }

    #[test]
    fn test_clear_non_adjacent_rows() {
        let mut board = Board::new(2, 4);
        for x in 0..2 {
            board.set(x, 3, Some(1u8));
            board.set(x, 1, Some(1u8));
        }
        board.set(0, 2, Some(7u8));
        board.set(1, 0, Some(9u8));

        let cleared = board.clear_full_rows();
        assert_eq!(cleared, vec![3, 1]);
        assert_eq!(board.get(0, 3), Some(Some(7)));
        assert_eq!(board.get(1, 2), Some(Some(9)));
        assert_eq!(board.count_occupied(), 2);
    }

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(Position::new(0, 0).manhattan(Position::new(3, -4)), 7);
    }
}
