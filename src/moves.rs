use serde::{Deserialize, Serialize};

use crate::board::{Position, BOARD_SIZE};
use crate::piece::{Color, Piece};

/// One accepted move. Entries are appended to the match log and never mutated.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    /// The mover as it stood before the move (pre-promotion, `has_moved` unchanged).
    pub moving_piece: Piece,
    pub captured_piece: Option<Piece>,
    pub color: Color,
    /// 1 for the first move of the match, strictly increasing with no gaps.
    pub move_number: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Eliminated colors as of immediately after this move resolved.
    pub eliminated_after: Vec<Color>,
}

/// Square name for the move log: files `a`..`n` left to right, ranks counted
/// up from the bottom edge, e.g. (13, 3) is "d1".
pub fn square_name(pos: Position) -> String {
    let file = (b'a' + pos.1 as u8) as char;
    let rank = BOARD_SIZE - pos.0;
    format!("{file}{rank}")
}

impl Move {
    /// Short display form, e.g. "Nd1-e3" or "e3xf4".
    pub fn to_notation(&self) -> String {
        let piece = self.moving_piece.piece_type.letter();
        let sep = if self.captured_piece.is_some() { "x" } else { "-" };
        format!("{piece}{}{sep}{}", square_name(self.from), square_name(self.to))
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {} {}", self.move_number, self.color, self.to_notation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceType;

    #[test]
    fn notation_marks_captures() {
        let mut mv = Move {
            from: (13, 4),
            to: (11, 5),
            moving_piece: Piece::new(PieceType::Knight, Color::Red),
            captured_piece: None,
            color: Color::Red,
            move_number: 1,
            timestamp: 0,
            eliminated_after: Vec::new(),
        };
        assert_eq!(mv.to_notation(), "Ne1-f3");

        mv.moving_piece = Piece::new(PieceType::Pawn, Color::Red);
        mv.captured_piece = Some(Piece::new(PieceType::Bishop, Color::Blue));
        assert_eq!(mv.to_notation(), "e1xf3");
        assert_eq!(mv.to_string(), "1. red e1xf3");
    }
}
