use crate::board::Position;
use crate::engine::play_move;
use crate::game::{MatchState, MoveError};
use crate::orientation::{board_for, to_actual, to_view};
use crate::piece::{Color, Piece, TURN_ORDER};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct LastMoveJson {
    from: [usize; 2],
    to: [usize; 2],
    notation: String,
}

/// Everything a client needs to draw the board from one seat.
/// Coordinates are in the viewer's orientation.
#[derive(Serialize)]
struct BoardState {
    viewer: Color,
    squares: Vec<Vec<Option<Piece>>>,
    current_player: Color,
    players_in_check: Vec<Color>,
    eliminated_players: Vec<Color>,
    winner: Option<Color>,
    captured: Vec<(Color, Vec<Piece>)>,
    last_move: Option<LastMoveJson>,
    move_count: usize,
}

#[derive(Serialize)]
struct MoveResult {
    #[serde(flatten)]
    board_state: Option<BoardState>,
    error: Option<String>,
}

fn pair(pos: Position) -> [usize; 2] {
    [pos.0, pos.1]
}

fn parse_color(name: &str) -> Option<Color> {
    TURN_ORDER.into_iter().find(|c| c.name() == name)
}

fn build_board_state(state: &MatchState, viewer: Color) -> BoardState {
    let squares = board_for(&state.board, viewer).iter().map(|row| row.to_vec()).collect();

    BoardState {
        viewer,
        squares,
        current_player: state.current_player,
        players_in_check: state.players_in_check.clone(),
        eliminated_players: state.eliminated_players.clone(),
        winner: state.winner,
        captured: TURN_ORDER
            .iter()
            .map(|&c| (c, state.captured_pieces.by(c).to_vec()))
            .collect(),
        last_move: state.last_move().and_then(|m| {
            Some(LastMoveJson {
                from: pair(to_view(m.from, viewer)?),
                to: pair(to_view(m.to, viewer)?),
                notation: m.to_notation(),
            })
        }),
        move_count: state.move_log.len(),
    }
}

#[wasm_bindgen]
pub struct Game {
    state: MatchState,
    viewer: Color,
}

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Game {
        Game {
            state: MatchState::new(),
            viewer: Color::Red,
        }
    }

    /// Switch the seat the board is drawn for. Unknown names are ignored.
    pub fn set_viewer(&mut self, color: &str) {
        if let Some(c) = parse_color(color) {
            self.viewer = c;
        }
    }

    pub fn get_board_state(&self) -> JsValue {
        let state = build_board_state(&self.state, self.viewer);
        serde_wasm_bindgen::to_value(&state).unwrap_or(JsValue::NULL)
    }

    pub fn make_move(&mut self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> JsValue {
        let squares = to_actual((from_row, from_col), self.viewer).zip(to_actual((to_row, to_col), self.viewer));
        let applied = match squares {
            Some((from, to)) => self.state.apply_move(from, to),
            None => Err(MoveError::InvalidMove),
        };

        let result = match applied {
            Ok(_) => MoveResult {
                board_state: Some(build_board_state(&self.state, self.viewer)),
                error: None,
            },
            Err(e) => MoveResult {
                board_state: None,
                error: Some(e.to_string()),
            },
        };
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    pub fn make_ai_move(&mut self) -> JsValue {
        if let Err(e) = play_move(&mut self.state) {
            let err = MoveResult {
                board_state: None,
                error: Some(e.to_string()),
            };
            return serde_wasm_bindgen::to_value(&err).unwrap_or(JsValue::NULL);
        }
        let state = build_board_state(&self.state, self.viewer);
        serde_wasm_bindgen::to_value(&state).unwrap_or(JsValue::NULL)
    }

    pub fn get_legal_moves_for_square(&self, row: usize, col: usize) -> JsValue {
        let targets: Vec<[usize; 2]> = to_actual((row, col), self.viewer)
            .map(|from| self.state.legal_moves(from))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|to| to_view(to, self.viewer).map(pair))
            .collect();
        serde_wasm_bindgen::to_value(&targets).unwrap_or(JsValue::NULL)
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}
