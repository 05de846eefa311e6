use chess::Color;
use serde::Deserialize;

use crate::error::Result;
use crate::models::RemainingTime;

/// One line of the remote board event stream
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RemoteEvent {
    GameStart {
        game: GameInfo,
    },
    GameFull {
        id: String,
        #[serde(default)]
        speed: Option<String>,
        state: GameStateEvent,
    },
    GameState(GameStateEvent),
    /// Chat lines, opponent-gone notices and anything else the clock ignores
    #[serde(other)]
    Other,
}

/// Game announced by a `gameStart` event
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GameInfo {
    pub id: String,
    #[serde(default)]
    pub speed: Option<String>,
}

impl GameInfo {
    /// Correspondence games have no running clock to show
    pub fn is_correspondence(&self) -> bool {
        self.speed.as_deref() == Some("correspondence")
    }
}

/// Authoritative clock snapshot sent after every move
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GameStateEvent {
    #[serde(default)]
    pub moves: String,
    /// White's remaining time in milliseconds
    pub wtime: u64,
    /// Black's remaining time in milliseconds
    pub btime: u64,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<Winner>,
}

impl GameStateEvent {
    /// Number of half-moves played so far
    pub fn ply_count(&self) -> usize {
        self.moves.split_whitespace().count()
    }

    pub fn white_time(&self) -> RemainingTime {
        millis(self.wtime)
    }

    pub fn black_time(&self) -> RemainingTime {
        millis(self.btime)
    }
}

fn millis(ms: u64) -> RemainingTime {
    RemainingTime::from_millis(i64::try_from(ms).unwrap_or(i64::MAX))
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Created,
    #[default]
    Started,
    Aborted,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    Draw,
    #[serde(rename = "outoftime")]
    OutOfTime,
    Cheat,
    NoStart,
    UnknownFinish,
    VariantEnd,
    #[serde(other)]
    Unknown,
}

impl GameStatus {
    /// Whether the server considers the game finished
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            GameStatus::Created | GameStatus::Started | GameStatus::Unknown
        )
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
}

impl From<Winner> for Color {
    fn from(winner: Winner) -> Color {
        match winner {
            Winner::White => Color::White,
            Winner::Black => Color::Black,
        }
    }
}

/// Parse one NDJSON line of the event stream
pub fn parse_event(line: &str) -> Result<RemoteEvent> {
    Ok(serde_json::from_str(line)?)
}
