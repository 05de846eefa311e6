use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::clock::DEFAULT_REFRESH;
use crate::display::DEFAULT_LCD_WIDTH;

/// Command line and environment configuration of the clock bridge
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lcd-chess-clock",
    about = "Show a remote chess game's clocks on a serial LCD chess clock",
    version
)]
pub struct Config {
    #[arg(
        long,
        env = "CHESS_CLOCK_PORT",
        default_value = "/dev/ttyACM0",
        help = "Serial port the clock is attached to"
    )]
    pub port: String,

    #[arg(long, env = "CHESS_CLOCK_BAUD", default_value_t = 115_200)]
    pub baud: u32,

    #[arg(
        long,
        env = "CHESS_CLOCK_SERIAL_TIMEOUT",
        default_value = "100s",
        value_parser = humantime::parse_duration,
        help = "Serial write timeout, e.g. 100s or 500ms"
    )]
    pub serial_timeout: Duration,

    #[arg(
        long,
        env = "CHESS_CLOCK_REFRESH",
        default_value = "500ms",
        value_parser = humantime::parse_duration,
        help = "How often the display is refreshed between moves"
    )]
    pub refresh: Duration,

    #[arg(long, env = "CHESS_CLOCK_LCD_WIDTH", default_value_t = DEFAULT_LCD_WIDTH)]
    pub lcd_width: usize,

    #[arg(
        long,
        value_name = "PATH",
        help = "Newline-delimited JSON game events (reads stdin when omitted)"
    )]
    pub events: Option<PathBuf>,

    #[arg(
        long = "no-greeting",
        action = clap::ArgAction::SetTrue,
        help = "Do not send the hello and splash screens on startup"
    )]
    pub no_greeting: bool,
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh: self.refresh,
        }
    }
}

/// Settings a game session runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub refresh: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            refresh: DEFAULT_REFRESH,
        }
    }
}
