use clap::Parser;
use log::{error, info};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use lcd_chess_clock::display::{DurationFormatter, ProtocolCommand, ProtocolEncoder, Transport};
use lcd_chess_clock::session::{spawn_reader, GameSession, SessionReport};
use lcd_chess_clock::{ClockError, Config, Result};

fn open_serial(config: &Config) -> Result<Transport> {
    info!("Opening {} at {} baud", config.port, config.baud);
    let port = tokio_serial::new(&config.port, config.baud)
        .timeout(config.serial_timeout)
        .open()
        .map_err(|source| ClockError::Serial {
            port: config.port.clone(),
            source,
        })?;
    Ok(Box::new(port))
}

async fn run(config: Config) -> Result<SessionReport> {
    let transport = open_serial(&config)?;
    let encoder = Arc::new(Mutex::new(ProtocolEncoder::new(
        "display",
        transport,
        DurationFormatter::new(config.lcd_width),
    )));

    if !config.no_greeting {
        let mut encoder = encoder.lock();
        encoder.send_command(&ProtocolCommand::Hello)?;
        encoder.send_command(&ProtocolCommand::Splash)?;
    }

    let events = match &config.events {
        Some(path) => {
            let name = path.display().to_string();
            let file = File::open(path).map_err(|source| ClockError::EventSource {
                source_name: name.clone(),
                source,
            })?;
            spawn_reader(&name, BufReader::new(file))?
        }
        None => spawn_reader("stdin", BufReader::new(io::stdin()))?,
    };

    let (_session, report) = GameSession::start(config.session_config(), encoder, events);
    let mut report = report.await.map_err(|_| ClockError::SessionLost)?;
    match report.error.take() {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

#[actix_rt::main]
async fn main() -> ExitCode {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();
    info!("Starting chess clock bridge with {:?}", config);

    let code = match run(config).await {
        Ok(report) => {
            info!(
                "Session {} for game {:?} ended: {:?}",
                report.id, report.game_id, report.phase
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Chess clock bridge failed: {}", err);
            ExitCode::FAILURE
        }
    };

    log::logger().flush();
    code
}
