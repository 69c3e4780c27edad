use std::io::Write;

use four_player_chess::engine::play_move;
use four_player_chess::game::MatchState;
use four_player_chess::piece::{Color, TURN_ORDER};

const DEFAULT_GAMES: usize = 20;
const DEFAULT_MAX_MOVES: usize = 600;

#[derive(Debug, Default)]
struct Tally {
    wins: [u32; 4],
    unfinished: u32,
    stuck: u32,
    total_moves: usize,
    longest: usize,
    first_eliminated: [u32; 4],
}

enum Outcome {
    Won(Color),
    Stuck,
    MoveLimit,
}

fn play_game(max_moves: usize) -> (Outcome, MatchState) {
    let mut state = MatchState::new();
    while state.move_log.len() < max_moves {
        if let Some(winner) = state.winner {
            return (Outcome::Won(winner), state);
        }
        match play_move(&mut state) {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => return (Outcome::Stuck, state),
        }
    }
    match state.winner {
        Some(winner) => (Outcome::Won(winner), state),
        None => (Outcome::MoveLimit, state),
    }
}

/// Random-vs-random statistics: who wins, who goes out first, how long games run.
/// Usage: simulate [games] [max_moves]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let games = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_GAMES);
    let max_moves = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_MAX_MOVES);

    println!("=== Random agent self-play: {games} games, max {max_moves} moves ===\n");

    let mut tally = Tally::default();
    for game in 1..=games {
        let (outcome, state) = play_game(max_moves);
        let len = state.move_log.len();
        tally.total_moves += len;
        tally.longest = tally.longest.max(len);
        if let Some(first) = state.eliminated_players.first() {
            tally.first_eliminated[first.index()] += 1;
        }

        let label = match outcome {
            Outcome::Won(color) => {
                tally.wins[color.index()] += 1;
                format!("{color} wins")
            }
            Outcome::Stuck => {
                tally.stuck += 1;
                format!("{} stalemated", state.current_player)
            }
            Outcome::MoveLimit => {
                tally.unfinished += 1;
                "move limit".to_string()
            }
        };
        println!("  game {game:>3}: {label:<16} after {len:>4} moves");
        std::io::stdout().flush().ok();
    }

    println!("\n--- Results ---\n");
    for color in TURN_ORDER {
        println!(
            "  {:<7} wins {:>3}   first out {:>3}",
            color.name(),
            tally.wins[color.index()],
            tally.first_eliminated[color.index()]
        );
    }
    println!("  unfinished {:>3}   stalemated {:>3}", tally.unfinished, tally.stuck);
    if games > 0 {
        println!(
            "\n  average length {:.1} moves, longest {}",
            tally.total_moves as f64 / games as f64,
            tally.longest
        );
    }
}
