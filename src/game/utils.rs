use chess::Color;

use crate::models::{GameStateEvent, GameStatus, Outcome};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Side to move after `ply_count` half-moves
pub fn side_to_move(ply_count: usize) -> Color {
    if ply_count % 2 == 0 {
        Color::White
    } else {
        Color::Black
    }
}

/// Map a finished game state onto the result the display shows.
/// Returns `None` while the game is still running.
pub fn game_outcome(state: &GameStateEvent) -> Option<Outcome> {
    if !state.status.is_terminal() {
        return None;
    }

    if let Some(winner) = state.winner {
        return Some(Outcome::won_by(winner.into()));
    }

    match state.status {
        GameStatus::Draw | GameStatus::Stalemate => Some(Outcome::Drawn),
        // A timeout without a winner is the server's "insufficient material" draw
        GameStatus::OutOfTime | GameStatus::Timeout => Some(Outcome::Drawn),
        _ => Some(Outcome::Aborted),
    }
}
