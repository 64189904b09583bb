//! Pieces tests - spawn matrices and clockwise rotation

use minigames::core::pieces::shape;
use minigames::types::PieceKind;

fn matrix(rows: &[&str]) -> Vec<Vec<bool>> {
    rows.iter()
        .map(|row| row.chars().map(|c| c == '#').collect())
        .collect()
}

#[test]
fn test_spawn_matrices() {
    assert_eq!(shape(PieceKind::I).to_matrix(), matrix(&["####"]));
    assert_eq!(shape(PieceKind::O).to_matrix(), matrix(&["##", "##"]));
    assert_eq!(shape(PieceKind::T).to_matrix(), matrix(&["###", ".#."]));
    assert_eq!(shape(PieceKind::S).to_matrix(), matrix(&["##.", ".##"]));
    assert_eq!(shape(PieceKind::Z).to_matrix(), matrix(&[".##", "##."]));
    assert_eq!(shape(PieceKind::L).to_matrix(), matrix(&["#..", "###"]));
    assert_eq!(shape(PieceKind::J).to_matrix(), matrix(&["..#", "###"]));
}

#[test]
fn test_every_piece_has_four_cells() {
    for kind in PieceKind::ALL {
        let mut s = shape(kind);
        for _ in 0..4 {
            assert_eq!(s.cells().len(), 4, "{:?}", kind);
            s = s.rotated_cw();
        }
    }
}

#[test]
fn test_rotation_swaps_dimensions() {
    let t = shape(PieceKind::T).rotated_cw();
    assert_eq!((t.width(), t.height()), (2, 3));
    assert_eq!(t.to_matrix(), matrix(&[".#", "##", ".#"]));

    let i = shape(PieceKind::I).rotated_cw();
    assert_eq!(i.to_matrix(), matrix(&["#", "#", "#", "#"]));
}

#[test]
fn test_four_turns_return_to_spawn() {
    for kind in PieceKind::ALL {
        let spawn = shape(kind);
        let back = spawn.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(back, spawn, "{:?}", kind);
    }
}
