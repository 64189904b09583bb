//! Pieces module - tetromino shapes as boolean matrices
//!
//! Shapes are stored as the list of filled cells of their bounding matrix,
//! `(column, row)` from the top-left corner. Rotation is a plain clockwise
//! matrix rotation (transpose, then reverse each row): there is no pivot
//! table and no wall kicks.

use arrayvec::ArrayVec;

use crate::types::PieceKind;

/// Offset of a single mino inside the shape matrix
pub type MinoOffset = (i8, i8);

/// Spawn matrices, row by row
const I_MATRIX: &[&[u8]] = &[&[1, 1, 1, 1]];
const O_MATRIX: &[&[u8]] = &[&[1, 1], &[1, 1]];
const T_MATRIX: &[&[u8]] = &[&[1, 1, 1], &[0, 1, 0]];
const S_MATRIX: &[&[u8]] = &[&[1, 1, 0], &[0, 1, 1]];
const Z_MATRIX: &[&[u8]] = &[&[0, 1, 1], &[1, 1, 0]];
const L_MATRIX: &[&[u8]] = &[&[1, 0, 0], &[1, 1, 1]];
const J_MATRIX: &[&[u8]] = &[&[0, 0, 1], &[1, 1, 1]];

/// A tetromino in one orientation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    width: u8,
    height: u8,
    cells: ArrayVec<MinoOffset, 4>,
}

impl Shape {
    fn from_matrix(matrix: &[&[u8]]) -> Self {
        let height = matrix.len() as u8;
        let width = matrix.first().map_or(0, |row| row.len()) as u8;
        let mut cells = ArrayVec::new();
        for (y, row) in matrix.iter().enumerate() {
            for (x, &filled) in row.iter().enumerate() {
                if filled != 0 {
                    cells.push((x as i8, y as i8));
                }
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn cells(&self) -> &[MinoOffset] {
        &self.cells
    }

    /// Clockwise rotation: `(x, y)` of a `w x h` matrix moves to `(h - 1 - y, x)`
    /// of the `h x w` result.
    pub fn rotated_cw(&self) -> Self {
        let h = self.height as i8;
        let cells = self.cells.iter().map(|&(x, y)| (h - 1 - y, x)).collect();
        Self {
            width: self.height,
            height: self.width,
            cells,
        }
    }

    /// Render back into a boolean matrix (rows of columns)
    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        let mut rows = vec![vec![false; self.width as usize]; self.height as usize];
        for &(x, y) in &self.cells {
            rows[y as usize][x as usize] = true;
        }
        rows
    }
}

/// Spawn orientation of a piece kind
pub fn shape(kind: PieceKind) -> Shape {
    let matrix = match kind {
        PieceKind::I => I_MATRIX,
        PieceKind::O => O_MATRIX,
        PieceKind::T => T_MATRIX,
        PieceKind::S => S_MATRIX,
        PieceKind::Z => Z_MATRIX,
        PieceKind::L => L_MATRIX,
        PieceKind::J => J_MATRIX,
    };
    Shape::from_matrix(matrix)
}
