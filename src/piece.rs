use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Yellow,
    Green,
}

/// Fixed cyclic turn order. Red opens the match.
pub const TURN_ORDER: [Color; 4] = [Color::Red, Color::Blue, Color::Yellow, Color::Green];

impl Color {
    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
            Color::Yellow => 2,
            Color::Green => 3,
        }
    }

    /// The color after this one in turn order, ignoring eliminations.
    pub fn next(self) -> Color {
        TURN_ORDER[(self.index() + 1) % TURN_ORDER.len()]
    }

    /// Unit step a pawn of this color advances by, as (row delta, col delta).
    ///
    /// Each color starts on one arm of the cross and marches toward the
    /// opposite arm: yellow down, red up, blue right, green left.
    pub fn forward(self) -> (i32, i32) {
        match self {
            Color::Yellow => (1, 0),
            Color::Red => (-1, 0),
            Color::Blue => (0, 1),
            Color::Green => (0, -1),
        }
    }

    /// True when this color's back rank runs along a row (yellow, red)
    /// rather than a column (blue, green).
    pub fn plays_vertically(self) -> bool {
        matches!(self, Color::Yellow | Color::Red)
    }

    /// Row (yellow/red) or column (blue/green) holding this color's pawns at the start.
    pub fn pawn_home_line(self) -> usize {
        match self {
            Color::Yellow => 1,
            Color::Red => 12,
            Color::Blue => 1,
            Color::Green => 12,
        }
    }

    /// Row (yellow/red) or column (blue/green) on which this color's pawns promote.
    pub fn promotion_line(self) -> usize {
        match self {
            Color::Yellow => 7,
            Color::Red => 6,
            Color::Blue => 7,
            Color::Green => 6,
        }
    }

    /// Directions along the back rank in which castling is searched.
    pub fn castling_directions(self) -> [(i32, i32); 2] {
        if self.plays_vertically() {
            [(0, 1), (0, -1)]
        } else {
            [(1, 0), (-1, 0)]
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Green => "green",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceType {
    /// Letter used by the move log; pawns have none.
    pub fn letter(self) -> &'static str {
        match self {
            PieceType::Pawn => "",
            PieceType::Rook => "R",
            PieceType::Knight => "N",
            PieceType::Bishop => "B",
            PieceType::Queen => "Q",
            PieceType::King => "K",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    /// Set on the first move of this piece and never cleared.
    #[serde(default)]
    pub has_moved: bool,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Piece {
            piece_type,
            color,
            has_moved: false,
        }
    }

    pub fn is(&self, piece_type: PieceType, color: Color) -> bool {
        self.piece_type == piece_type && self.color == color
    }
}
