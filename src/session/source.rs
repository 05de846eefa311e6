use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use log::{debug, info, warn};
use std::io::BufRead;
use std::thread;

use crate::error::{ClockError, Result};
use crate::models::{parse_event, RemoteEvent};

/// Read newline-delimited JSON events on a dedicated thread.
///
/// The returned receiver is the session's event stream; it ends when the
/// input ends or a read fails. Malformed lines are logged and skipped.
pub fn spawn_reader<R>(source_name: &str, reader: R) -> Result<UnboundedReceiver<RemoteEvent>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded();
    let name = source_name.to_string();
    thread::Builder::new()
        .name("event-reader".to_string())
        .spawn(move || read_events(&name, reader, &tx))
        .map_err(|source| ClockError::EventSource {
            source_name: source_name.to_string(),
            source,
        })?;
    Ok(rx)
}

fn read_events<R: BufRead>(name: &str, reader: R, tx: &UnboundedSender<RemoteEvent>) {
    info!("reading events from {}", name);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("reading {} failed: {}", name, e);
                break;
            }
        };
        // keep-alive newlines
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_event(line) {
            Ok(event) => {
                debug!("event from {}: {:?}", name, event);
                if tx.unbounded_send(event).is_err() {
                    debug!("session gone, no longer reading {}", name);
                    break;
                }
            }
            Err(e) => warn!("skipping line from {}: {}", name, e),
        }
    }
    info!("event stream from {} closed", name);
}
