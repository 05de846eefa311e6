//! Drives a serial LCD chess clock from a remote game's sparse clock updates.
//!
//! The server only reports both clocks when a move is made. In between, the
//! live side's time is extrapolated from the last snapshot and pushed to the
//! display on a fixed refresh, and a flag is detected locally as soon as the
//! extrapolated time runs out.

pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod game;
pub mod models;
pub mod session;

pub use clock::{ClockSynchronizer, Tick, TimerEvent, TimerLoop};
pub use config::{Config, SessionConfig};
pub use display::{DurationFormatter, ProtocolCommand, ProtocolEncoder, Transport};
pub use error::{ClockError, Result};
pub use session::{GameSession, SessionPhase, SessionReport};
