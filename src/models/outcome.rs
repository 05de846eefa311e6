use chess::Color;

/// How a game ended, as far as the display is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WhiteWon,
    BlackWon,
    Drawn,
    /// Ended without a result (aborted, never started)
    Aborted,
}

impl Outcome {
    pub fn won_by(winner: Color) -> Self {
        match winner {
            Color::White => Outcome::WhiteWon,
            Color::Black => Outcome::BlackWon,
        }
    }

    /// The side that ran out of time loses
    pub fn flagged(loser: Color) -> Self {
        Outcome::won_by(!loser)
    }
}
