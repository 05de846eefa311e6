use actix::prelude::*;
use futures::channel::oneshot;
use futures::Stream;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::clock::{ClockSynchronizer, TimerEvent, TimerLoop};
use crate::config::SessionConfig;
use crate::display::{ProtocolCommand, ProtocolEncoder};
use crate::error::{ClockError, Result};
use crate::game::utils::{game_outcome, side_to_move};
use crate::models::{GameInfo, GameStateEvent, Outcome, RemoteEvent};

/// Where a session is in its game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the first clock snapshot
    Uninitialized,
    Active,
    /// The clock ran out locally before the server said anything
    Flagged(Outcome),
    /// The server ended the game
    Finished(Outcome),
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Flagged(_) | SessionPhase::Finished(_))
    }
}

/// Sent once when the session stops
#[derive(Debug)]
pub struct SessionReport {
    pub id: Uuid,
    pub game_id: Option<String>,
    pub phase: SessionPhase,
    pub error: Option<ClockError>,
}

/// Drives the clock for one game from the remote event stream
pub struct GameSession {
    id: Uuid,
    label: String,
    config: SessionConfig,
    clock: Arc<ClockSynchronizer>,
    encoder: Arc<Mutex<ProtocolEncoder>>,
    phase: SessionPhase,
    game_id: Option<String>,
    // set while the announced game is one we do not display
    skipping: bool,
    plies: usize,
    timer: Option<Addr<TimerLoop>>,
    error: Option<ClockError>,
    report: Option<oneshot::Sender<SessionReport>>,
}

impl GameSession {
    /// Start a session consuming `events`; the receiver yields its report
    pub fn start<S>(
        config: SessionConfig,
        encoder: Arc<Mutex<ProtocolEncoder>>,
        events: S,
    ) -> (Addr<GameSession>, oneshot::Receiver<SessionReport>)
    where
        S: Stream<Item = RemoteEvent> + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let label = id.to_string();

        let addr = GameSession::create(move |ctx| {
            ctx.add_stream(events);
            GameSession {
                id,
                clock: Arc::new(ClockSynchronizer::new(label.clone())),
                label,
                config,
                encoder,
                phase: SessionPhase::Uninitialized,
                game_id: None,
                skipping: false,
                plies: 0,
                timer: None,
                error: None,
                report: Some(tx),
            }
        });
        (addr, rx)
    }

    fn handle_event(&mut self, event: RemoteEvent, ctx: &mut Context<Self>) -> Result<()> {
        match event {
            RemoteEvent::GameStart { game } => {
                self.accept_game(&game);
                Ok(())
            }
            RemoteEvent::GameFull { id, speed, state } => {
                if self.accept_game(&GameInfo { id, speed }) {
                    self.handle_game_state(state, ctx)
                } else {
                    Ok(())
                }
            }
            RemoteEvent::GameState(state) => {
                if self.skipping {
                    debug!("[{}] ignoring state of a skipped game", self.label);
                    return Ok(());
                }
                self.handle_game_state(state, ctx)
            }
            RemoteEvent::Other => {
                debug!("[{}] ignoring event", self.label);
                Ok(())
            }
        }
    }

    /// Whether the events for `game` should drive the display
    fn accept_game(&mut self, game: &GameInfo) -> bool {
        if self.game_id.as_deref() == Some(game.id.as_str()) {
            return !self.skipping;
        }
        if self.phase != SessionPhase::Uninitialized {
            warn!(
                "[{}] already displaying game {:?}, ignoring game {}",
                self.label, self.game_id, game.id
            );
            return false;
        }

        self.game_id = Some(game.id.clone());
        self.skipping = game.is_correspondence();
        if self.skipping {
            info!("[{}] skipping correspondence game {}", self.label, game.id);
        } else {
            info!("[{}] displaying game {}", self.label, game.id);
        }
        !self.skipping
    }

    fn handle_game_state(&mut self, state: GameStateEvent, ctx: &mut Context<Self>) -> Result<()> {
        if self.phase.is_terminal() {
            debug!("[{}] game already ended, ignoring state", self.label);
            return Ok(());
        }

        let now = Instant::now();
        let (white, black) = (state.white_time(), state.black_time());
        let plies = state.ply_count();

        match self.phase {
            SessionPhase::Uninitialized => {
                self.clock.resume(white, black, side_to_move(plies));
                self.clock.on_move_made(now);
                self.plies = plies;
                self.phase = SessionPhase::Active;
                self.encoder.lock().render(white, black)?;
                self.start_timer(ctx);
            }
            SessionPhase::Active if plies > self.plies => {
                // one flip per half-move, in case an event was missed
                for _ in self.plies..plies {
                    self.clock.sync_move(now, white, black);
                }
                self.plies = plies;
            }
            SessionPhase::Active if plies < self.plies => {
                info!(
                    "[{}] move list shrank from {} to {} plies",
                    self.label, self.plies, plies
                );
                self.clock.take_back(now, white, black, side_to_move(plies));
                self.plies = plies;
            }
            _ => debug!("[{}] no new move in state event", self.label),
        }

        if let Some(outcome) = game_outcome(&state) {
            self.finish(outcome, ctx)?;
        }
        Ok(())
    }

    fn start_timer(&mut self, ctx: &mut Context<Self>) {
        let timer = TimerLoop::new(
            self.label.clone(),
            self.clock.clone(),
            self.encoder.clone(),
            self.config.refresh,
            ctx.address().recipient(),
        );
        self.timer = Some(timer.start());
    }

    /// The server ended the game. Loses silently to a flag already shown.
    fn finish(&mut self, outcome: Outcome, ctx: &mut Context<Self>) -> Result<()> {
        let ended_here = {
            let mut encoder = self.encoder.lock();
            if self.clock.finish() {
                encoder.send_command(&ProtocolCommand::for_outcome(outcome))?;
                true
            } else {
                false
            }
        };

        if ended_here {
            info!("[{}] game finished: {:?}", self.label, outcome);
            self.phase = SessionPhase::Finished(outcome);
            ctx.stop();
        } else {
            debug!("[{}] flag already ended the game", self.label);
        }
        Ok(())
    }

    fn fail(&mut self, err: ClockError, ctx: &mut Context<Self>) {
        error!("[{}] session failed: {}", self.label, err);
        self.clock.finish();
        self.error = Some(err);
        ctx.stop();
    }
}

impl Actor for GameSession {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!("[{}] game session started", self.label);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        if self.phase == SessionPhase::Active {
            // halt the timer without putting a result on the display
            self.clock.finish();
        }
        let timer_running = self.timer.as_ref().map_or(false, |timer| timer.connected());
        info!(
            "[{}] game session stopped in {:?} (timer running: {})",
            self.label, self.phase, timer_running
        );

        if let Some(report) = self.report.take() {
            let _ = report.send(SessionReport {
                id: self.id,
                game_id: self.game_id.clone(),
                phase: self.phase,
                error: self.error.take(),
            });
        }
    }
}

impl StreamHandler<RemoteEvent> for GameSession {
    fn handle(&mut self, event: RemoteEvent, ctx: &mut Self::Context) {
        if let Err(err) = self.handle_event(event, ctx) {
            self.fail(err, ctx);
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        info!("[{}] event stream ended", self.label);
        ctx.stop();
    }
}

impl Handler<TimerEvent> for GameSession {
    type Result = ();

    fn handle(&mut self, event: TimerEvent, ctx: &mut Self::Context) {
        match event {
            TimerEvent::Flagged(outcome) => {
                if self.phase.is_terminal() {
                    return;
                }
                info!("[{}] flag detected: {:?}", self.label, outcome);
                self.phase = SessionPhase::Flagged(outcome);
                ctx.stop();
            }
            TimerEvent::Failed(err) => self.fail(err, ctx),
            TimerEvent::Stopped => debug!("[{}] timer stopped", self.label),
        }
    }
}
