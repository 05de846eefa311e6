pub mod format;
pub mod protocol;

pub use format::{DisplayFrame, DurationFormatter, DEFAULT_LCD_WIDTH};
pub use protocol::{ProtocolCommand, ProtocolEncoder, Transport};
