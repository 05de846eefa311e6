use actix::prelude::*;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::display::{ProtocolCommand, ProtocolEncoder};
use crate::error::{ClockError, Result};
use crate::models::Outcome;

use super::synchronizer::{ClockSynchronizer, Tick};

/// Refresh period of the LCD
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(500);

/// Why the timer loop stopped, sent to whoever started it
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub enum TimerEvent {
    /// The live side ran out of time; the terminal command is already on the display
    Flagged(Outcome),
    /// Writing to the display failed
    Failed(ClockError),
    /// The game ended elsewhere
    Stopped,
}

/// Periodically extrapolates the clock and keeps the display current.
///
/// There is no way to cancel it from outside: it checks the game-over flag
/// at every iteration and stops itself once the game has ended.
pub struct TimerLoop {
    label: String,
    clock: Arc<ClockSynchronizer>,
    encoder: Arc<Mutex<ProtocolEncoder>>,
    period: Duration,
    owner: Recipient<TimerEvent>,
}

impl TimerLoop {
    pub fn new(
        label: impl Into<String>,
        clock: Arc<ClockSynchronizer>,
        encoder: Arc<Mutex<ProtocolEncoder>>,
        period: Duration,
        owner: Recipient<TimerEvent>,
    ) -> Self {
        TimerLoop {
            label: label.into(),
            clock,
            encoder,
            period,
            owner,
        }
    }

    /// One iteration at `now`. `Break` carries the reason to stop.
    ///
    /// The encoder lock is held across the tick so that nothing else can be
    /// written between reading the clock and showing it.
    pub fn iterate(&self, now: Instant) -> Result<ControlFlow<TimerEvent>> {
        let mut encoder = self.encoder.lock();
        match self.clock.tick(now) {
            Tick::GameOver => Ok(ControlFlow::Break(TimerEvent::Stopped)),
            Tick::Unseeded => {
                debug!("[{}] clock not seeded yet, skipping", self.label);
                Ok(ControlFlow::Continue(()))
            }
            Tick::Running { white, black } => {
                encoder.render(white, black)?;
                Ok(ControlFlow::Continue(()))
            }
            Tick::Flagged { loser, .. } => {
                let outcome = Outcome::flagged(loser);
                encoder.send_command(&ProtocolCommand::for_outcome(outcome))?;
                Ok(ControlFlow::Break(TimerEvent::Flagged(outcome)))
            }
        }
    }

    // Sleeps a full period after each iteration; drift is not corrected.
    fn schedule(&self, ctx: &mut Context<Self>) {
        ctx.run_later(self.period, |act, ctx| act.step(ctx));
    }

    fn step(&mut self, ctx: &mut Context<Self>) {
        match self.iterate(Instant::now()) {
            Ok(ControlFlow::Continue(())) => self.schedule(ctx),
            Ok(ControlFlow::Break(event)) => {
                info!("[{}] timer finishing: {:?}", self.label, event);
                self.owner.do_send(event);
                ctx.stop();
            }
            Err(err) => {
                error!("[{}] display write failed: {}", self.label, err);
                self.owner.do_send(TimerEvent::Failed(err));
                ctx.stop();
            }
        }
    }
}

impl Actor for TimerLoop {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[{}] timer started, refreshing every {:?}", self.label, self.period);
        self.schedule(ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!("[{}] timer stopped", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DurationFormatter;
    use crate::models::RemainingTime;
    use std::io::{self, Write};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Sink;

    impl Actor for Sink {
        type Context = Context<Self>;
    }

    impl Handler<TimerEvent> for Sink {
        type Result = ();

        fn handle(&mut self, _: TimerEvent, _: &mut Context<Self>) {}
    }

    fn timer(clock: Arc<ClockSynchronizer>) -> (TimerLoop, Captured) {
        let captured = Captured::default();
        let encoder = ProtocolEncoder::new(
            "test",
            Box::new(captured.clone()),
            DurationFormatter::default(),
        );
        let owner = Sink.start().recipient();
        let timer = TimerLoop::new(
            "test",
            clock,
            Arc::new(Mutex::new(encoder)),
            DEFAULT_REFRESH,
            owner,
        );
        (timer, captured)
    }

    #[actix_rt::test]
    async fn unseeded_clock_is_skipped() {
        let clock = Arc::new(ClockSynchronizer::new("test"));
        clock.initialize(RemainingTime::from_secs(60), RemainingTime::from_secs(60));
        let (timer, captured) = timer(clock);

        assert!(matches!(
            timer.iterate(Instant::now()),
            Ok(ControlFlow::Continue(()))
        ));
        assert!(captured.0.lock().is_empty());
    }

    #[actix_rt::test]
    async fn running_clock_is_rendered() {
        let t0 = Instant::now();
        let clock = Arc::new(ClockSynchronizer::new("test"));
        clock.initialize(RemainingTime::from_secs(90), RemainingTime::from_secs(90));
        clock.on_move_made(t0);
        let (timer, captured) = timer(clock);

        assert!(matches!(
            timer.iterate(t0 + Duration::from_secs(10)),
            Ok(ControlFlow::Continue(()))
        ));
        assert_eq!(
            captured.0.lock().as_slice(),
            b"3W: 0:01:20      B: 0:01:30      "
        );
    }

    #[actix_rt::test]
    async fn flag_sends_the_result_and_stops() {
        let t0 = Instant::now();
        let clock = Arc::new(ClockSynchronizer::new("test"));
        clock.initialize(RemainingTime::from_secs(2), RemainingTime::from_secs(60));
        clock.on_move_made(t0);
        let (timer, captured) = timer(clock.clone());

        match timer.iterate(t0 + Duration::from_secs(3)) {
            Ok(ControlFlow::Break(TimerEvent::Flagged(outcome))) => {
                assert_eq!(outcome, Outcome::BlackWon)
            }
            other => panic!("expected a flag, got {:?}", other),
        }
        assert_eq!(captured.0.lock().as_slice(), b"7");
        assert!(clock.is_game_over());

        // the next iteration only notices the game is over
        assert!(matches!(
            timer.iterate(t0 + Duration::from_secs(4)),
            Ok(ControlFlow::Break(TimerEvent::Stopped))
        ));
        assert_eq!(captured.0.lock().as_slice(), b"7");
    }
}
