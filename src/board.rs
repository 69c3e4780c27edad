use serde::{Deserialize, Serialize};

use crate::piece::{Color, Piece, PieceType};

/// Side length of the square grid the cross is cut from.
pub const BOARD_SIZE: usize = 14;

/// (row, col), 0-indexed from the top-left corner of the 14×14 grid.
pub type Position = (usize, usize);

/// How far along the back rank a castling rook may stand from its king.
const CASTLING_ROOK_REACH: i32 = 4;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const STRAIGHT_DIRS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL_DIRS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// True iff (row, col) lies on the playable cross: the 8-wide top and bottom
/// arms (rows 0-2 and 11-13, cols 3-10) or the full-width middle band (rows 3-10).
pub fn is_valid_position(row: i32, col: i32) -> bool {
    if !(0..BOARD_SIZE as i32).contains(&row) || !(0..BOARD_SIZE as i32).contains(&col) {
        return false;
    }
    let in_arm_columns = (3..=10).contains(&col);
    match row {
        0..=2 => in_arm_columns,
        3..=10 => true,
        _ => in_arm_columns,
    }
}

/// Offset a position by (dr, dc), returning it only if it lands on the cross.
fn step(pos: Position, dr: i32, dc: i32) -> Option<Position> {
    let r = pos.0 as i32 + dr;
    let c = pos.1 as i32 + dc;
    if is_valid_position(r, c) {
        Some((r as usize, c as usize))
    } else {
        None
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Board {
    pub squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Standard starting position: each color fills its own arm with the
    /// back rank on the outer line and pawns on the line inside it.
    pub fn new() -> Self {
        let mut board = Board::empty();
        for (i, &pt) in BACK_RANK.iter().enumerate() {
            let line = 3 + i;

            board.squares[0][line] = Some(Piece::new(pt, Color::Yellow));
            board.squares[1][line] = Some(Piece::new(PieceType::Pawn, Color::Yellow));

            board.squares[13][line] = Some(Piece::new(pt, Color::Red));
            board.squares[12][line] = Some(Piece::new(PieceType::Pawn, Color::Red));

            board.squares[line][0] = Some(Piece::new(pt, Color::Blue));
            board.squares[line][1] = Some(Piece::new(PieceType::Pawn, Color::Blue));

            board.squares[line][13] = Some(Piece::new(pt, Color::Green));
            board.squares[line][12] = Some(Piece::new(PieceType::Pawn, Color::Green));
        }
        board
    }

    /// Like `is_valid_position`, for unsigned coordinates of any magnitude.
    pub fn is_valid(pos: Position) -> bool {
        pos.0 < BOARD_SIZE && pos.1 < BOARD_SIZE && is_valid_position(pos.0 as i32, pos.1 as i32)
    }

    /// The piece on `pos`, or `None` for empty and off-cross squares.
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if Self::is_valid(pos) {
            self.squares[pos.0][pos.1]
        } else {
            None
        }
    }

    pub fn place(&mut self, pos: Position, piece: Piece) {
        debug_assert!(Self::is_valid(pos), "placing on off-board square {pos:?}");
        self.squares[pos.0][pos.1] = Some(piece);
    }

    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        if !Self::is_valid(pos) {
            return None;
        }
        self.squares[pos.0][pos.1].take()
    }

    /// Every occupied square, scanned row by row.
    pub fn occupied(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        (0..BOARD_SIZE).flat_map(move |r| {
            (0..BOARD_SIZE).filter_map(move |c| self.squares[r][c].map(|p| ((r, c), p)))
        })
    }

    pub fn pieces_of(&self, color: Color) -> Vec<Position> {
        self.occupied()
            .filter(|(_, p)| p.color == color)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.occupied()
            .find(|(_, p)| p.is(PieceType::King, color))
            .map(|(pos, _)| pos)
    }

    /// Strip every piece of `color` from the board. Returns how many were removed.
    pub fn remove_all_pieces_of(&mut self, color: Color) -> usize {
        let mut removed = 0;
        for row in self.squares.iter_mut() {
            for sq in row.iter_mut() {
                if sq.map(|p| p.color == color).unwrap_or(false) {
                    *sq = None;
                    removed += 1;
                }
            }
        }
        removed
    }

    // =========================================================================
    // Pseudo-legal move generation
    // =========================================================================

    /// Destinations the piece on `pos` could reach by its movement pattern,
    /// ignoring whether its own king is left in check. Castling destinations
    /// are only considered when `include_castling` is set.
    pub fn pseudo_legal_moves(&self, pos: Position, include_castling: bool) -> Vec<Position> {
        let piece = match self.get(pos) {
            Some(p) => p,
            None => return Vec::new(),
        };

        let mut moves = Vec::new();
        match piece.piece_type {
            PieceType::Pawn => self.generate_pawn_moves(pos, piece, &mut moves),
            PieceType::Knight => self.generate_step_moves(pos, piece.color, &KNIGHT_OFFSETS, &mut moves),
            PieceType::Bishop => self.generate_sliding_moves(pos, piece.color, &DIAGONAL_DIRS, &mut moves),
            PieceType::Rook => self.generate_sliding_moves(pos, piece.color, &STRAIGHT_DIRS, &mut moves),
            PieceType::Queen => {
                self.generate_sliding_moves(pos, piece.color, &STRAIGHT_DIRS, &mut moves);
                self.generate_sliding_moves(pos, piece.color, &DIAGONAL_DIRS, &mut moves);
            }
            PieceType::King => {
                self.generate_step_moves(pos, piece.color, &KING_OFFSETS, &mut moves);
                if include_castling && !piece.has_moved {
                    self.generate_castling_moves(pos, piece.color, &mut moves);
                }
            }
        }
        moves
    }

    fn generate_pawn_moves(&self, pos: Position, piece: Piece, moves: &mut Vec<Position>) {
        let color = piece.color;
        let (dr, dc) = color.forward();

        if let Some(one) = step(pos, dr, dc) {
            if self.get(one).is_none() {
                moves.push(one);

                let home = if color.plays_vertically() { pos.0 } else { pos.1 };
                if home == color.pawn_home_line() && !piece.has_moved {
                    if let Some(two) = step(pos, 2 * dr, 2 * dc) {
                        if self.get(two).is_none() {
                            moves.push(two);
                        }
                    }
                }
            }
        }

        // Diagonals are taken relative to the direction of travel.
        let captures = if color.plays_vertically() {
            [(dr, -1), (dr, 1)]
        } else {
            [(-1, dc), (1, dc)]
        };
        for (cr, cc) in captures {
            if let Some(target) = step(pos, cr, cc) {
                if self.get(target).map(|p| p.color != color).unwrap_or(false) {
                    moves.push(target);
                }
            }
        }
    }

    /// Single-hop movers (knight, king): any valid square not holding a friendly piece.
    fn generate_step_moves(&self, pos: Position, color: Color, offsets: &[(i32, i32)], moves: &mut Vec<Position>) {
        for &(dr, dc) in offsets {
            if let Some(target) = step(pos, dr, dc) {
                if self.get(target).map(|p| p.color != color).unwrap_or(true) {
                    moves.push(target);
                }
            }
        }
    }

    fn generate_sliding_moves(&self, pos: Position, color: Color, directions: &[(i32, i32)], moves: &mut Vec<Position>) {
        for &(dr, dc) in directions {
            let mut current = pos;
            while let Some(next) = step(current, dr, dc) {
                if let Some(p) = self.get(next) {
                    if p.color != color {
                        moves.push(next);
                    }
                    break;
                }
                moves.push(next);
                current = next;
            }
        }
    }

    // =========================================================================
    // Castling
    // =========================================================================

    fn generate_castling_moves(&self, pos: Position, color: Color, moves: &mut Vec<Position>) {
        if self.is_under_attack(pos, color) {
            return;
        }

        for (dr, dc) in color.castling_directions() {
            if self.find_castling_rook(pos, (dr, dc), color).is_none() {
                continue;
            }
            let (Some(mid), Some(dest)) = (step(pos, dr, dc), step(pos, 2 * dr, 2 * dc)) else {
                continue;
            };
            if [mid, dest].iter().all(|&sq| !self.king_passage_attacked(pos, sq, color)) {
                moves.push(dest);
            }
        }
    }

    /// Would the king of `color`, lifted from `from` and set down on `through`,
    /// be attacked there?
    fn king_passage_attacked(&self, from: Position, through: Position, color: Color) -> bool {
        let mut scratch = self.clone();
        let Some(king) = scratch.take(from) else {
            return true;
        };
        scratch.place(through, king);
        scratch.is_under_attack(through, color)
    }

    /// Walk up to four squares from the king along `dir` looking for an unmoved
    /// rook of `color`. Only empty squares may lie between, and the rook must be
    /// far enough away that the king's two transit squares are empty.
    pub fn find_castling_rook(&self, king_pos: Position, dir: (i32, i32), color: Color) -> Option<Position> {
        let mut current = king_pos;
        for distance in 1..=CASTLING_ROOK_REACH {
            current = step(current, dir.0, dir.1)?;
            if let Some(p) = self.get(current) {
                let usable = distance >= 3 && p.is(PieceType::Rook, color) && !p.has_moved;
                return usable.then_some(current);
            }
        }
        None
    }

    /// If moving the piece on `from` to `to` is a castling move, the direction
    /// along the back rank it travels in.
    pub fn castling_direction(&self, from: Position, to: Position) -> Option<(i32, i32)> {
        let king = self.get(from).filter(|p| p.piece_type == PieceType::King)?;
        king.color
            .castling_directions()
            .into_iter()
            .find(|&(dr, dc)| step(from, 2 * dr, 2 * dc) == Some(to))
    }

    /// Move the castling rook for a king leaving `king_from` along `dir` onto the
    /// square the king passes over, marking it moved. Returns false (leaving the
    /// board untouched) when no eligible rook is found.
    pub fn relocate_castling_rook(&mut self, king_from: Position, dir: (i32, i32), color: Color) -> bool {
        let Some(rook_pos) = self.find_castling_rook(king_from, dir, color) else {
            return false;
        };
        let Some(landing) = step(king_from, dir.0, dir.1) else {
            return false;
        };
        if let Some(mut rook) = self.take(rook_pos) {
            rook.has_moved = true;
            self.place(landing, rook);
        }
        true
    }

    // =========================================================================
    // Attacks and legality
    // =========================================================================

    /// True iff any piece of the three other colors has `pos` among its
    /// pseudo-legal destinations. Castling never counts as an attack.
    pub fn is_under_attack(&self, pos: Position, color: Color) -> bool {
        self.occupied()
            .filter(|(_, p)| p.color != color)
            .any(|(from, _)| self.pseudo_legal_moves(from, false).contains(&pos))
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king) => self.is_under_attack(king, color),
            None => false,
        }
    }

    /// Pseudo-legal moves of the piece on `pos` that do not leave its own king
    /// under attack. This is the single authority on move legality.
    pub fn legal_moves(&self, pos: Position) -> Vec<Position> {
        let piece = match self.get(pos) {
            Some(p) => p,
            None => return Vec::new(),
        };

        self.pseudo_legal_moves(pos, true)
            .into_iter()
            .filter(|&to| {
                let mut scratch = self.clone();
                if let Some(dir) = self.castling_direction(pos, to) {
                    if !scratch.relocate_castling_rook(pos, dir, piece.color) {
                        return false;
                    }
                }
                scratch.squares[pos.0][pos.1] = None;
                scratch.place(to, piece);
                match scratch.find_king(piece.color) {
                    Some(king) => !scratch.is_under_attack(king, piece.color),
                    None => false,
                }
            })
            .collect()
    }

    /// True if any piece of `color` has at least one legal move.
    pub fn has_any_legal_move(&self, color: Color) -> bool {
        self.pieces_of(color)
            .into_iter()
            .any(|pos| !self.legal_moves(pos).is_empty())
    }

    /// Count of pieces per color, indexed by `Color::index`.
    pub fn material(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for (_, p) in self.occupied() {
            counts[p.color.index()] += 1;
        }
        counts
    }
}
