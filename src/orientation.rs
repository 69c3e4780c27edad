//! Per-color board orientation.
//!
//! Red's home arm sits at the bottom of the canonical grid, so red sees the
//! board as stored. Every other color gets a rotation that brings its own arm
//! to the bottom: blue 90° counter-clockwise, yellow 180°, green 90° clockwise.
//! `to_view` and `to_actual` are exact inverses for every color.

use crate::board::{Board, Position, BOARD_SIZE};
use crate::piece::{Color, Piece};

const LAST: usize = BOARD_SIZE - 1;

/// Map a square in canonical coordinates to where `color` sees it.
/// `None` if the square lies outside the 14×14 grid.
pub fn to_view(pos: Position, color: Color) -> Option<Position> {
    let (row, col) = in_grid(pos)?;
    Some(match color {
        Color::Red => (row, col),
        Color::Blue => (LAST - col, row),
        Color::Yellow => (LAST - row, LAST - col),
        Color::Green => (col, LAST - row),
    })
}

/// Map a square as `color` sees it back to canonical coordinates.
pub fn to_actual(pos: Position, color: Color) -> Option<Position> {
    let (row, col) = in_grid(pos)?;
    Some(match color {
        Color::Red => (row, col),
        Color::Blue => (col, LAST - row),
        Color::Yellow => (LAST - row, LAST - col),
        Color::Green => (LAST - col, row),
    })
}

fn in_grid(pos: Position) -> Option<Position> {
    (pos.0 <= LAST && pos.1 <= LAST).then_some(pos)
}

/// The grid of squares as `color` sees it, indexed by view coordinates.
pub fn board_for(board: &Board, color: Color) -> [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE] {
    let mut view = [[None; BOARD_SIZE]; BOARD_SIZE];
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            if let Some((vr, vc)) = to_view((row, col), color) {
                view[vr][vc] = board.squares[row][col];
            }
        }
    }
    view
}
