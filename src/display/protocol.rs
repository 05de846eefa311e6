use log::{debug, info};
use std::io::Write;

use crate::error::Result;
use crate::models::{Outcome, RemainingTime};

use super::format::{DisplayFrame, DurationFormatter};

/// Byte sink the clock hardware is attached to
pub type Transport = Box<dyn Write + Send>;

/// Commands understood by the clock firmware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolCommand {
    GameOver,
    ShowText(DisplayFrame),
    NewGame,
    Splash,
    WhiteWon,
    BlackWon,
    Drawn,
    Hello,
}

impl ProtocolCommand {
    /// Leading byte on the wire
    pub fn code(&self) -> u8 {
        match self {
            ProtocolCommand::GameOver => b'2',
            ProtocolCommand::ShowText(_) => b'3',
            ProtocolCommand::NewGame => b'4',
            ProtocolCommand::Splash => b'5',
            ProtocolCommand::WhiteWon => b'6',
            ProtocolCommand::BlackWon => b'7',
            ProtocolCommand::Drawn => b'8',
            ProtocolCommand::Hello => b'@',
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            ProtocolCommand::ShowText(frame) => frame.as_bytes(),
            _ => &[],
        }
    }

    /// Command byte followed by the payload
    pub fn encode(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut bytes = Vec::with_capacity(1 + payload.len());
        bytes.push(self.code());
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Terminal command that puts `outcome` on the display
    pub fn for_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::WhiteWon => ProtocolCommand::WhiteWon,
            Outcome::BlackWon => ProtocolCommand::BlackWon,
            Outcome::Drawn => ProtocolCommand::Drawn,
            Outcome::Aborted => ProtocolCommand::GameOver,
        }
    }
}

/// Writes display commands to the clock.
///
/// Shared between the timer loop and the session behind one lock so frames
/// never interleave on the wire.
pub struct ProtocolEncoder {
    label: String,
    transport: Transport,
    formatter: DurationFormatter,
}

impl ProtocolEncoder {
    pub fn new(label: impl Into<String>, transport: Transport, formatter: DurationFormatter) -> Self {
        ProtocolEncoder {
            label: label.into(),
            transport,
            formatter,
        }
    }

    /// Show both clocks
    pub fn render(&mut self, white: RemainingTime, black: RemainingTime) -> Result<()> {
        let frame = self.formatter.frame(white, black);
        debug!("[{}] frame: {:?}", self.label, frame.as_str());
        self.send_command(&ProtocolCommand::ShowText(frame))
    }

    pub fn send_command(&mut self, command: &ProtocolCommand) -> Result<()> {
        if !matches!(command, ProtocolCommand::ShowText(_)) {
            info!("[{}] sending {:?}", self.label, command);
        }
        self.transport.write_all(&command.encode())?;
        self.transport.flush()?;
        Ok(())
    }
}
