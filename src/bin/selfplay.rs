use four_player_chess::engine::play_move;
use four_player_chess::game::MatchState;
use four_player_chess::piece::TURN_ORDER;
use log::{info, warn};

const DEFAULT_MAX_MOVES: usize = 400;

/// Plays one match with the automated player in every seat.
/// Usage: selfplay [max_moves]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let max_moves = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_MOVES);

    let mut state = MatchState::new();
    while !state.is_over() && state.move_log.len() < max_moves {
        match play_move(&mut state) {
            Ok(Some(mv)) => info!("{mv}"),
            Ok(None) => {
                warn!("{} has no legal move, stopping", state.current_player);
                break;
            }
            Err(e) => {
                warn!("automated move rejected: {e}");
                break;
            }
        }
    }

    let result = match state.winner {
        Some(color) => format!("{color} wins"),
        None => "unfinished".to_string(),
    };
    eprintln!(
        "Game over after {} moves: {result} (eliminated: {:?})",
        state.move_log.len(),
        state.eliminated_players
    );
    let material = state.board.material();
    for color in TURN_ORDER {
        eprintln!("  {:<7} {:>2} pieces", color.name(), material[color.index()]);
    }
}
