// =============================================================================
// Match state: the Move Executor and the Turn/Elimination state machine.
//
// A MatchState is the single source of truth for one room's game. The only
// way to change it is apply_move(), which validates against Board::legal_moves,
// mutates the board, then re-evaluates every still-active color in turn order
// (red, blue, yellow, green): a color without a king, or in check with no legal
// move anywhere, is eliminated and its pieces are swept off the board.
// =============================================================================

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Position};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType, TURN_ORDER};

/// Why a move was refused. Board-level problems all collapse into
/// `InvalidMove` so a rejection says nothing about the position.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("Invalid move")]
    InvalidMove,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("You are eliminated")]
    PlayerEliminated,
    #[error("Game is already over")]
    GameOver,
}

/// Pieces each color has taken from its opponents.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, Debug)]
pub struct CapturedPieces {
    pub red: Vec<Piece>,
    pub blue: Vec<Piece>,
    pub yellow: Vec<Piece>,
    pub green: Vec<Piece>,
}

impl CapturedPieces {
    pub fn by(&self, color: Color) -> &[Piece] {
        match color {
            Color::Red => &self.red,
            Color::Blue => &self.blue,
            Color::Yellow => &self.yellow,
            Color::Green => &self.green,
        }
    }

    fn by_mut(&mut self, color: Color) -> &mut Vec<Piece> {
        match color {
            Color::Red => &mut self.red,
            Color::Blue => &mut self.blue,
            Color::Yellow => &mut self.yellow,
            Color::Green => &mut self.green,
        }
    }
}

/// Milliseconds since the Unix epoch.
/// Uses js_sys::Date in WASM builds, the system clock natively.
pub(crate) fn now_millis() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct MatchState {
    pub board: Board,
    pub current_player: Color,
    pub captured_pieces: CapturedPieces,
    pub players_in_check: Vec<Color>,
    pub eliminated_players: Vec<Color>,
    pub winner: Option<Color>,
    pub move_log: Vec<Move>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    /// Fresh match: starting position, red to move, empty logs.
    pub fn new() -> Self {
        Self::from_board(Board::new(), Color::Red)
    }

    /// A match starting from an arbitrary position. Useful for setting up test positions.
    pub fn from_board(board: Board, current_player: Color) -> Self {
        MatchState {
            board,
            current_player,
            captured_pieces: CapturedPieces::default(),
            players_in_check: Vec::new(),
            eliminated_players: Vec::new(),
            winner: None,
            move_log: Vec::new(),
        }
    }

    /// Throw away the board and log and start over.
    pub fn reset(&mut self) {
        *self = MatchState::new();
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn is_eliminated(&self, color: Color) -> bool {
        self.eliminated_players.contains(&color)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        self.players_in_check.contains(&color)
    }

    pub fn active_players(&self) -> Vec<Color> {
        TURN_ORDER
            .into_iter()
            .filter(|c| !self.is_eliminated(*c))
            .collect()
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.move_log.last()
    }

    /// Legal destinations for the piece on `pos`, whoever owns it.
    pub fn legal_moves(&self, pos: Position) -> Vec<Position> {
        self.board.legal_moves(pos)
    }

    /// Every legal (from, to) pair available to `color`.
    pub fn all_legal_moves(&self, color: Color) -> Vec<(Position, Position)> {
        self.board
            .pieces_of(color)
            .into_iter()
            .flat_map(|from| {
                self.board
                    .legal_moves(from)
                    .into_iter()
                    .map(move |to| (from, to))
            })
            .collect()
    }

    /// Apply a move on behalf of `requesting` after checking it is their turn.
    /// This is the entry point for moves submitted by a seat.
    pub fn apply_move_as(&mut self, requesting: Color, from: Position, to: Position) -> Result<Move, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        if self.is_eliminated(requesting) {
            return Err(MoveError::PlayerEliminated);
        }
        if requesting != self.current_player {
            return Err(MoveError::NotYourTurn);
        }
        self.apply_move(from, to)
    }

    /// Validate and execute a move for the color to move, resolve checks and
    /// eliminations, advance the turn and append the log record.
    pub fn apply_move(&mut self, from: Position, to: Position) -> Result<Move, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        let mover = self.current_player;

        let piece = match self.board.get(from) {
            Some(p) if p.color == mover => p,
            Some(p) => {
                debug!("rejecting {from:?}->{to:?}: piece belongs to {}, {mover} to move", p.color);
                return Err(MoveError::InvalidMove);
            }
            None => {
                debug!("rejecting {from:?}->{to:?}: origin is empty");
                return Err(MoveError::InvalidMove);
            }
        };
        if !self.board.legal_moves(from).contains(&to) {
            debug!("rejecting {from:?}->{to:?}: not a legal destination for {mover}");
            return Err(MoveError::InvalidMove);
        }

        let captured = self.board.get(to);
        if let Some(victim) = captured {
            self.captured_pieces.by_mut(mover).push(victim);
        }

        let mut moved = piece;
        moved.has_moved = true;

        if let Some(dir) = self.board.castling_direction(from, to) {
            if !self.board.relocate_castling_rook(from, dir, mover) {
                warn!("castling {from:?}->{to:?} for {mover} found no rook to move");
            }
        }

        if moved.piece_type == PieceType::Pawn && reaches_promotion_line(mover, to) {
            moved.piece_type = PieceType::Queen;
        }

        self.board.take(from);
        self.board.place(to, moved);

        self.update_status();

        let record = Move {
            from,
            to,
            moving_piece: piece,
            captured_piece: captured,
            color: mover,
            move_number: self.move_log.len() as u32 + 1,
            timestamp: now_millis(),
            eliminated_after: self.eliminated_players.clone(),
        };
        info!("move {}: {} {}", record.move_number, mover, record.to_notation());
        self.move_log.push(record.clone());
        Ok(record)
    }

    /// Re-evaluate check and elimination for every active color in turn
    /// order, then pick the winner or the next player to move.
    pub fn update_status(&mut self) {
        let mut in_check = Vec::new();

        for color in TURN_ORDER {
            if self.is_eliminated(color) {
                continue;
            }

            let king = match self.board.find_king(color) {
                Some(k) => k,
                None => {
                    warn!("{color} has no king on the board, eliminating");
                    self.eliminate(color);
                    continue;
                }
            };

            if !self.board.is_under_attack(king, color) {
                continue;
            }

            if self.board.has_any_legal_move(color) {
                in_check.push(color);
            } else {
                info!("{color} is checkmated");
                self.eliminate(color);
            }
        }

        self.players_in_check = in_check;

        let active = self.active_players();
        self.winner = if active.len() == 1 { Some(active[0]) } else { None };

        match self.winner {
            Some(winner) => {
                info!("{winner} wins the match");
                self.current_player = winner;
            }
            None => self.current_player = self.next_player(self.current_player),
        }
    }

    fn eliminate(&mut self, color: Color) {
        if !self.is_eliminated(color) {
            self.eliminated_players.push(color);
        }
        let removed = self.board.remove_all_pieces_of(color);
        debug!("swept {removed} {color} pieces from the board");
    }

    /// The next color after `from` in turn order that is still in play.
    /// Falls back to `from` if every other color is eliminated.
    pub fn next_player(&self, from: Color) -> Color {
        let mut candidate = from;
        for _ in 0..TURN_ORDER.len() {
            candidate = candidate.next();
            if !self.is_eliminated(candidate) {
                return candidate;
            }
        }
        from
    }
}

/// Has a pawn of `color` arriving on `to` reached its promotion line?
pub fn reaches_promotion_line(color: Color, to: Position) -> bool {
    let line = if color.plays_vertically() { to.0 } else { to.1 };
    line == color.promotion_line()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(pt: PieceType, color: Color) -> Piece {
        Piece::new(pt, color)
    }

    #[test]
    fn red_opens_and_turns_rotate() {
        let mut state = MatchState::new();
        assert_eq!(state.current_player, Color::Red);

        state.apply_move((12, 3), (10, 3)).expect("red pawn double step");
        assert_eq!(state.current_player, Color::Blue);
        state.apply_move((3, 1), (3, 3)).expect("blue pawn double step");
        assert_eq!(state.current_player, Color::Yellow);
        state.apply_move((1, 10), (2, 10)).expect("yellow pawn step");
        assert_eq!(state.current_player, Color::Green);
        state.apply_move((10, 12), (10, 11)).expect("green pawn step");
        assert_eq!(state.current_player, Color::Red);

        let numbers: Vec<u32> = state.move_log.iter().map(|m| m.move_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejections_leave_state_untouched() {
        let mut state = MatchState::new();
        let before = state.clone();

        assert_eq!(state.apply_move((5, 5), (6, 5)), Err(MoveError::InvalidMove));
        assert_eq!(state.apply_move((1, 3), (2, 3)), Err(MoveError::InvalidMove));
        assert_eq!(state.apply_move((12, 3), (9, 3)), Err(MoveError::InvalidMove));
        assert_eq!(state.apply_move_as(Color::Blue, (3, 1), (3, 2)), Err(MoveError::NotYourTurn));

        assert_eq!(state, before);
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut state = MatchState::new();
        let before = state.clone();

        assert_eq!(state.apply_move(((1usize << 32) | 12, 3), (10, 3)), Err(MoveError::InvalidMove));
        assert_eq!(state.apply_move((12, 3), (usize::MAX, 3)), Err(MoveError::InvalidMove));
        assert_eq!(state.apply_move((14, 14), (13, 13)), Err(MoveError::InvalidMove));
        assert!(state.legal_moves(((1usize << 32) | 5, 5)).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn eliminated_color_cannot_move() {
        let mut state = MatchState::new();
        state.apply_move((12, 3), (11, 3)).expect("red pawn step");
        state.eliminated_players = vec![Color::Blue];
        state.board.remove_all_pieces_of(Color::Blue);

        assert_eq!(
            state.apply_move_as(Color::Blue, (3, 1), (3, 2)),
            Err(MoveError::PlayerEliminated)
        );
        assert_eq!(state.move_log.len(), 1);
    }

    #[test]
    fn moving_marks_piece_and_snapshots_it() {
        let mut state = MatchState::new();
        let mv = state.apply_move((13, 4), (11, 5)).expect("knight out");
        assert!(!mv.moving_piece.has_moved);
        assert!(state.board.get((11, 5)).map(|p| p.has_moved).unwrap_or(false));
        assert!(state.board.get((13, 4)).is_none());
        assert_eq!(mv.color, Color::Red);
    }

    #[test]
    fn capture_goes_to_capturers_list() {
        let mut board = Board::empty();
        board.place((13, 7), piece(PieceType::King, Color::Red));
        board.place((7, 0), piece(PieceType::King, Color::Blue));
        board.place((0, 7), piece(PieceType::King, Color::Yellow));
        board.place((7, 13), piece(PieceType::King, Color::Green));
        board.place((9, 5), piece(PieceType::Rook, Color::Red));
        board.place((9, 9), piece(PieceType::Knight, Color::Green));
        let mut state = MatchState::from_board(board, Color::Red);

        let mv = state.apply_move((9, 5), (9, 9)).expect("rook takes knight");
        assert_eq!(mv.captured_piece.map(|p| p.piece_type), Some(PieceType::Knight));
        assert_eq!(state.captured_pieces.by(Color::Red).len(), 1);
        assert!(state.captured_pieces.by(Color::Green).is_empty());
    }

    #[test]
    fn pawns_promote_only_on_their_line() {
        for (color, from, to) in [
            (Color::Yellow, (6, 5), (7, 5)),
            (Color::Red, (7, 5), (6, 5)),
            (Color::Blue, (5, 6), (5, 7)),
            (Color::Green, (5, 7), (5, 6)),
        ] {
            let mut board = Board::empty();
            board.place((13, 7), piece(PieceType::King, Color::Red));
            board.place((7, 0), piece(PieceType::King, Color::Blue));
            board.place((0, 7), piece(PieceType::King, Color::Yellow));
            board.place((7, 13), piece(PieceType::King, Color::Green));
            let mut pawn = piece(PieceType::Pawn, color);
            pawn.has_moved = true;
            board.place(from, pawn);

            let mut state = MatchState::from_board(board, color);
            let mv = state.apply_move(from, to).expect("pawn push");
            assert_eq!(mv.moving_piece.piece_type, PieceType::Pawn);
            assert_eq!(state.board.get(to).map(|p| p.piece_type), Some(PieceType::Queen), "{color} should promote");
        }

        assert!(!reaches_promotion_line(Color::Yellow, (6, 5)));
        assert!(!reaches_promotion_line(Color::Red, (7, 5)));
        assert!(!reaches_promotion_line(Color::Blue, (7, 6)));
        assert!(!reaches_promotion_line(Color::Green, (6, 7)));
    }

    #[test]
    fn next_player_skips_eliminated() {
        let mut state = MatchState::new();
        state.eliminated_players = vec![Color::Blue, Color::Yellow];
        assert_eq!(state.next_player(Color::Red), Color::Green);
        assert_eq!(state.next_player(Color::Green), Color::Red);

        state.eliminated_players = vec![Color::Blue, Color::Yellow, Color::Green, Color::Red];
        assert_eq!(state.next_player(Color::Red), Color::Red);
    }

    #[test]
    fn missing_king_is_swept_defensively() {
        let mut board = Board::new();
        board.take((7, 13));
        let mut state = MatchState::from_board(board, Color::Red);
        state.apply_move((12, 7), (11, 7)).expect("red pawn step");

        assert_eq!(state.eliminated_players, vec![Color::Green]);
        assert_eq!(state.board.material()[Color::Green.index()], 0);
        assert_eq!(state.current_player, Color::Blue);
    }

    #[test]
    fn game_over_refuses_moves() {
        let mut state = MatchState::new();
        state.winner = Some(Color::Green);
        assert_eq!(state.apply_move((12, 3), (11, 3)), Err(MoveError::GameOver));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = MatchState::new();
        state.apply_move((12, 6), (10, 6)).expect("red pawn");
        let json = serde_json::to_string(&state).unwrap();
        let back: MatchState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
