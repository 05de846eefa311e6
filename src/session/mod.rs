pub mod game_session;
pub mod source;

pub use game_session::{GameSession, SessionPhase, SessionReport};
pub use source::spawn_reader;
