// =============================================================================
// Automated player
//
// Fills seats that have no connected human. The agent is deliberately weak:
// it collects every legal (from, to) pair for the color to move and picks one
// uniformly at random. Pacing (the delay before it acts) belongs to the
// session layer; this module only chooses and plays.
// =============================================================================

use log::debug;

use crate::board::Position;
use crate::game::{MatchState, MoveError};
use crate::moves::Move;

/// Platform-appropriate random number in [0, 1).
/// Uses js_sys::Math::random() in WASM builds, rand crate natively.
fn random_f64() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Math::random()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use rand::Rng;
        rand::thread_rng().gen::<f64>()
    }
}

/// Choose a legal move for the color to move, or `None` if it has none or
/// the match is already decided.
pub fn pick_move(state: &MatchState) -> Option<(Position, Position)> {
    if state.is_over() {
        return None;
    }
    let candidates = state.all_legal_moves(state.current_player);
    if candidates.is_empty() {
        debug!("no legal moves for automated {}", state.current_player);
        return None;
    }
    let index = (random_f64() * candidates.len() as f64) as usize;
    Some(candidates[index.min(candidates.len() - 1)])
}

/// Pick and apply a move for the color to move. `Ok(None)` means the agent
/// had nothing to play and left the state alone.
pub fn play_move(state: &mut MatchState) -> Result<Option<Move>, MoveError> {
    match pick_move(state) {
        Some((from, to)) => state.apply_move(from, to).map(Some),
        None => Ok(None),
    }
}
