use four_player_chess::board::Board;
use four_player_chess::engine;
use four_player_chess::game::{MatchState, MoveError};
use four_player_chess::piece::{Color, Piece, PieceType, TURN_ORDER};

fn piece(pt: PieceType, color: Color) -> Piece {
    Piece::new(pt, color)
}

#[test]
fn yellow_pawn_double_step_from_home_row() {
    let mut state = MatchState::from_board(Board::new(), Color::Yellow);
    assert!(state.legal_moves((1, 3)).contains(&(3, 3)));

    let mv = state.apply_move((1, 3), (3, 3)).expect("double step is legal");
    assert_eq!(mv.move_number, 1);
    assert!(state.board.get((1, 3)).is_none());
    assert_eq!(state.board.get((3, 3)).map(|p| p.piece_type), Some(PieceType::Pawn));
    assert_eq!(state.current_player, Color::Green);
}

#[test]
fn rook_capture_that_mates_eliminates_and_sweeps() {
    let mut board = Board::empty();
    board.place((13, 7), piece(PieceType::King, Color::Red));
    board.place((0, 7), piece(PieceType::King, Color::Yellow));
    board.place((7, 13), piece(PieceType::King, Color::Green));

    board.place((3, 0), piece(PieceType::King, Color::Blue));
    board.place((9, 1), piece(PieceType::Pawn, Color::Blue));
    board.place((10, 0), piece(PieceType::Knight, Color::Blue));

    board.place((9, 5), piece(PieceType::Rook, Color::Red));
    board.place((4, 9), piece(PieceType::Rook, Color::Red));
    board.place((3, 5), piece(PieceType::Knight, Color::Green));

    let mut state = MatchState::from_board(board, Color::Red);
    let mv = state.apply_move((9, 5), (3, 5)).expect("rook takes knight with mate");

    assert_eq!(mv.captured_piece.map(|p| (p.piece_type, p.color)), Some((PieceType::Knight, Color::Green)));
    assert_eq!(mv.eliminated_after, vec![Color::Blue]);
    assert_eq!(state.eliminated_players, vec![Color::Blue]);
    assert!(state.board.pieces_of(Color::Blue).is_empty());
    assert!(state.players_in_check.is_empty(), "eliminated colors are not reported in check twice");
    assert_eq!(state.current_player, Color::Yellow);
    assert_eq!(state.winner, None);
}

#[test]
fn last_color_standing_wins_and_play_stops() {
    let mut board = Board::empty();
    board.place((0, 3), piece(PieceType::King, Color::Yellow));
    board.place((7, 13), piece(PieceType::King, Color::Green));
    board.place((1, 10), piece(PieceType::Rook, Color::Green));
    board.place((5, 9), piece(PieceType::Rook, Color::Green));

    let mut state = MatchState::from_board(board, Color::Green);
    state.eliminated_players = vec![Color::Red, Color::Blue];

    state.apply_move((5, 9), (0, 9)).expect("mating move");
    assert_eq!(state.eliminated_players, vec![Color::Red, Color::Blue, Color::Yellow]);
    assert_eq!(state.winner, Some(Color::Green));
    assert_eq!(state.current_player, Color::Green);

    assert_eq!(state.apply_move((0, 9), (0, 8)), Err(MoveError::GameOver));
    assert_eq!(state.apply_move_as(Color::Green, (0, 9), (0, 8)), Err(MoveError::GameOver));
    assert_eq!(state.move_log.len(), 1);
}

#[test]
fn yellow_castles_and_rook_lands_beside_the_king() {
    let mut board = Board::empty();
    board.place((0, 7), piece(PieceType::King, Color::Yellow));
    board.place((0, 10), piece(PieceType::Rook, Color::Yellow));
    board.place((13, 7), piece(PieceType::King, Color::Red));
    board.place((7, 0), piece(PieceType::King, Color::Blue));
    board.place((7, 13), piece(PieceType::King, Color::Green));

    let mut state = MatchState::from_board(board, Color::Yellow);
    assert!(state.legal_moves((0, 7)).contains(&(0, 9)));

    state.apply_move((0, 7), (0, 9)).expect("castle");
    let king = state.board.get((0, 9)).expect("king on g-side square");
    let rook = state.board.get((0, 8)).expect("rook beside the king");
    assert!(king.is(PieceType::King, Color::Yellow) && king.has_moved);
    assert!(rook.is(PieceType::Rook, Color::Yellow) && rook.has_moved);
    assert!(state.board.get((0, 10)).is_none());
    assert!(state.board.get((0, 7)).is_none());
}

#[test]
fn green_castles_long_along_its_file() {
    let mut board = Board::empty();
    board.place((7, 13), piece(PieceType::King, Color::Green));
    board.place((3, 13), piece(PieceType::Rook, Color::Green));
    board.place((13, 7), piece(PieceType::King, Color::Red));

    let mut state = MatchState::from_board(board, Color::Green);
    state.apply_move((7, 13), (5, 13)).expect("castle toward row 3");
    assert!(state.board.get((5, 13)).map(|p| p.is(PieceType::King, Color::Green)).unwrap_or(false));
    assert!(state.board.get((6, 13)).map(|p| p.is(PieceType::Rook, Color::Green)).unwrap_or(false));
    assert!(state.board.get((3, 13)).is_none());
}

/// Random playouts: every legal move is pseudo-legal and keeps the mover's
/// king safe, eliminations only grow, and eliminated colors own no pieces.
#[test]
fn random_playouts_respect_rule_invariants() {
    for _ in 0..3 {
        let mut state = MatchState::new();
        let mut eliminated_before: Vec<Color> = Vec::new();

        for _ in 0..40 {
            let color = state.current_player;
            for from in state.board.pieces_of(color) {
                let pseudo = state.board.pseudo_legal_moves(from, true);
                for to in state.board.legal_moves(from) {
                    assert!(pseudo.contains(&to));
                    let mut scratch = state.clone();
                    scratch.apply_move(from, to).expect("legal move applies");
                    if let Some(king) = scratch.board.find_king(color) {
                        assert!(!scratch.board.is_under_attack(king, color));
                    }
                }
            }

            match engine::play_move(&mut state).expect("agent plays legal moves") {
                Some(_) => {}
                None => break,
            }

            for c in &eliminated_before {
                assert!(state.eliminated_players.contains(c), "{c} came back");
            }
            for c in TURN_ORDER {
                if state.is_eliminated(c) {
                    assert!(state.board.pieces_of(c).is_empty());
                    assert_ne!(state.current_player, c);
                }
            }
            eliminated_before = state.eliminated_players.clone();
            if state.is_over() {
                break;
            }
        }

        let numbers: Vec<u32> = state.move_log.iter().map(|m| m.move_number).collect();
        let expected: Vec<u32> = (1..=state.move_log.len() as u32).collect();
        assert_eq!(numbers, expected);
    }
}
