use thiserror::Error;

/// Errors raised by the clock bridge
#[derive(Debug, Error)]
pub enum ClockError {
    /// Writing to the display link failed. Fatal to the current game.
    #[error("failed to write to the clock display: {0}")]
    Transport(#[from] std::io::Error),

    #[error("failed to open serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("failed to read remote events from {source_name}: {source}")]
    EventSource {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed remote event: {0}")]
    Event(#[from] serde_json::Error),

    #[error("game session stopped without reporting")]
    SessionLost,
}

pub type Result<T> = std::result::Result<T, ClockError>;
