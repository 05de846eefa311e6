use chess::Color;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::time::Instant;

use crate::game::utils::color_to_string;
use crate::models::{ClockState, Countdown, RemainingTime};

/// Result of one extrapolation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown seeded yet; nothing to extrapolate
    Unseeded,
    /// The game is over and the clock is frozen
    GameOver,
    Running {
        white: RemainingTime,
        black: RemainingTime,
    },
    /// `loser` ran out of time on this tick. Reported exactly once per game.
    Flagged {
        loser: Color,
        white: RemainingTime,
        black: RemainingTime,
    },
}

impl Tick {
    /// Times to show for this tick, if any
    pub fn times(&self) -> Option<(RemainingTime, RemainingTime)> {
        match *self {
            Tick::Running { white, black } | Tick::Flagged { white, black, .. } => {
                Some((white, black))
            }
            Tick::Unseeded | Tick::GameOver => None,
        }
    }
}

/// Keeps the local clock in step with the server's sparse snapshots.
///
/// Both the event stream and the timer loop go through here; every read and
/// write of the clock state happens under the one lock.
pub struct ClockSynchronizer {
    label: String,
    state: Mutex<ClockState>,
}

impl ClockSynchronizer {
    /// `label` tags every log line from this clock
    pub fn new(label: impl Into<String>) -> Self {
        ClockSynchronizer {
            label: label.into(),
            state: Mutex::new(ClockState::default()),
        }
    }

    /// Start a new game from the server's first snapshot. White's clock runs first.
    pub fn initialize(&self, white: RemainingTime, black: RemainingTime) {
        self.resume(white, black, Color::White);
    }

    /// Like `initialize`, but for a game joined in progress where `to_move`
    /// is the side whose clock runs next.
    pub fn resume(&self, white: RemainingTime, black: RemainingTime, to_move: Color) {
        let mut state = self.state.lock();
        *state = ClockState {
            white_time: white,
            black_time: black,
            turn: to_move,
            countdown: None,
            game_over: false,
        };
        info!(
            "[{}] clock initialized: white {} black {}, {} to move",
            self.label,
            white,
            black,
            color_to_string(to_move)
        );
    }

    /// A move happened at `now`.
    ///
    /// The first call after `initialize` seeds the countdown for the side to
    /// move without flipping the turn. Every later call freezes the mover's
    /// clock at its extrapolated value and starts the opponent's.
    pub fn on_move_made(&self, now: Instant) {
        let mut state = self.state.lock();
        self.advance(&mut state, now);
    }

    /// A move happened at `now` and the server reported both clocks with it.
    /// The snapshot replaces the local values before the turn flips.
    pub fn sync_move(&self, now: Instant, white: RemainingTime, black: RemainingTime) {
        let mut state = self.state.lock();
        if state.game_over {
            debug!("[{}] ignoring snapshot after game over", self.label);
            return;
        }
        state.white_time = white;
        state.black_time = black;
        // advance() would otherwise overwrite the mover's snapshot with its extrapolation
        if state.countdown.is_some() {
            state.countdown = Some(Countdown {
                started: now,
                remaining: state.time_of(state.turn),
            });
        }
        self.advance(&mut state, now);
    }

    /// The server rolled the game back to an earlier position at `now`.
    ///
    /// Both clocks take the snapshot and `to_move` restarts from its own
    /// time. Unlike `resume` this leaves a finished game finished.
    pub fn take_back(
        &self,
        now: Instant,
        white: RemainingTime,
        black: RemainingTime,
        to_move: Color,
    ) {
        let mut state = self.state.lock();
        if state.game_over {
            debug!("[{}] ignoring takeback after game over", self.label);
            return;
        }
        state.white_time = white;
        state.black_time = black;
        state.turn = to_move;
        state.countdown = Some(Countdown {
            started: now,
            remaining: state.time_of(to_move),
        });
        info!(
            "[{}] takeback: white {} black {}, {} to move",
            self.label,
            white,
            black,
            color_to_string(to_move)
        );
    }

    fn advance(&self, state: &mut ClockState, now: Instant) {
        if state.game_over {
            debug!("[{}] ignoring move after game over", self.label);
            return;
        }

        if let Some(countdown) = state.countdown {
            let mover = state.turn;
            let left = countdown.remaining_at(now);
            state.set_time(mover, left);
            state.turn = !mover;
            debug!(
                "[{}] {} moved with {} left",
                self.label,
                color_to_string(mover),
                left
            );
        } else {
            debug!("[{}] seeding countdown", self.label);
        }

        state.countdown = Some(Countdown {
            started: now,
            remaining: state.time_of(state.turn),
        });
    }

    /// Extrapolate the live side's clock to `now` and check it for a flag.
    pub fn tick(&self, now: Instant) -> Tick {
        let mut state = self.state.lock();
        if state.game_over {
            return Tick::GameOver;
        }
        let countdown = match state.countdown {
            Some(countdown) => countdown,
            None => return Tick::Unseeded,
        };

        let live = state.turn;
        let remaining = countdown.remaining_at(now);
        state.set_time(live, remaining);
        let (white, black) = state.times();

        if Self::has_flagged(remaining) {
            state.game_over = true;
            warn!("[{}] {} flagged", self.label, color_to_string(live));
            return Tick::Flagged {
                loser: live,
                white,
                black,
            };
        }

        Tick::Running { white, black }
    }

    pub fn has_flagged(remaining: RemainingTime) -> bool {
        remaining.total_seconds() <= 0.0
    }

    /// Mark the game finished. Returns `true` only for the call that ended
    /// it, so a late second terminal signal can be told apart.
    pub fn finish(&self) -> bool {
        let mut state = self.state.lock();
        if state.game_over {
            return false;
        }
        state.game_over = true;
        info!("[{}] game over", self.label);
        true
    }

    pub fn is_game_over(&self) -> bool {
        self.state.lock().game_over
    }

    /// Copy of the whole state, read atomically
    pub fn snapshot(&self) -> ClockState {
        self.state.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn secs(s: i64) -> RemainingTime {
        RemainingTime::from_secs(s)
    }

    fn started(white: i64, black: i64, t0: Instant) -> ClockSynchronizer {
        let clock = ClockSynchronizer::new("test");
        clock.initialize(secs(white), secs(black));
        clock.on_move_made(t0);
        clock
    }

    #[test]
    fn tick_before_seeding_is_a_no_op() {
        let clock = ClockSynchronizer::new("test");
        assert_eq!(clock.tick(Instant::now()), Tick::Unseeded);

        clock.initialize(secs(60), secs(60));
        assert_eq!(clock.tick(Instant::now()), Tick::Unseeded);
        assert_eq!(clock.snapshot().times(), (secs(60), secs(60)));
    }

    #[test]
    fn initialize_leaves_countdown_empty() {
        let clock = ClockSynchronizer::new("test");
        clock.initialize(secs(60), secs(30));
        let state = clock.snapshot();
        assert_eq!(state.turn, Color::White);
        assert_eq!(state.countdown, None);
        assert!(!state.game_over);
    }

    #[test]
    fn immediate_tick_returns_the_snapshot() {
        let t0 = Instant::now();
        let clock = started(90, 75, t0);
        assert_eq!(
            clock.tick(t0),
            Tick::Running {
                white: secs(90),
                black: secs(75)
            }
        );
    }

    #[test]
    fn seeding_runs_whites_clock_then_moves_alternate() {
        let t0 = Instant::now();
        let clock = started(60, 60, t0);
        assert_eq!(clock.snapshot().turn, Color::White);
        assert_eq!(clock.snapshot().countdown.map(|c| c.remaining), Some(secs(60)));

        clock.on_move_made(t0 + Duration::from_secs(1));
        assert_eq!(clock.snapshot().turn, Color::Black);

        clock.on_move_made(t0 + Duration::from_secs(2));
        assert_eq!(clock.snapshot().turn, Color::White);
    }

    #[test]
    fn two_side_scenario() {
        let t0 = Instant::now();
        let clock = started(90, 90, t0);

        let tick = clock.tick(t0 + Duration::from_secs(10));
        assert_eq!(
            tick,
            Tick::Running {
                white: secs(80),
                black: secs(90)
            }
        );

        clock.on_move_made(t0 + Duration::from_secs(10));
        let tick = clock.tick(t0 + Duration::from_secs(15));
        assert_eq!(
            tick,
            Tick::Running {
                white: secs(80),
                black: secs(85)
            }
        );
    }

    #[test]
    fn flag_is_reported_once() {
        let t0 = Instant::now();
        let clock = started(2, 60, t0);

        match clock.tick(t0 + Duration::from_secs(3)) {
            Tick::Flagged { loser, white, black } => {
                assert_eq!(loser, Color::White);
                assert!(ClockSynchronizer::has_flagged(white));
                assert_eq!(black, secs(60));
            }
            other => panic!("expected a flag, got {:?}", other),
        }
        assert!(clock.is_game_over());
        assert_eq!(clock.tick(t0 + Duration::from_secs(4)), Tick::GameOver);
    }

    #[test]
    fn black_flag_uses_the_extrapolated_value() {
        let t0 = Instant::now();
        let clock = started(60, 5, t0);
        clock.on_move_made(t0 + Duration::from_secs(1));

        // black's stored time is still 5s; only the live value has run out
        assert_eq!(clock.snapshot().black_time, secs(5));
        match clock.tick(t0 + Duration::from_secs(7)) {
            Tick::Flagged { loser, .. } => assert_eq!(loser, Color::Black),
            other => panic!("expected a flag, got {:?}", other),
        }
    }

    #[test]
    fn exactly_zero_is_a_flag() {
        assert!(ClockSynchronizer::has_flagged(RemainingTime::ZERO));
        assert!(ClockSynchronizer::has_flagged(RemainingTime::from_millis(-1)));
        assert!(!ClockSynchronizer::has_flagged(RemainingTime::from_millis(1)));
    }

    #[test]
    fn sync_move_takes_the_server_snapshot() {
        let t0 = Instant::now();
        let clock = started(60, 60, t0);

        clock.sync_move(t0 + Duration::from_secs(5), secs(57), secs(60));
        let state = clock.snapshot();
        assert_eq!(state.turn, Color::Black);
        assert_eq!(state.white_time, secs(57));
        assert_eq!(state.countdown.map(|c| c.remaining), Some(secs(60)));

        assert_eq!(
            clock.tick(t0 + Duration::from_secs(8)),
            Tick::Running {
                white: secs(57),
                black: secs(57)
            }
        );
    }

    #[test]
    fn sync_move_seeds_an_unseeded_clock() {
        let t0 = Instant::now();
        let clock = ClockSynchronizer::new("test");
        clock.resume(secs(40), secs(30), Color::Black);
        clock.sync_move(t0, secs(40), secs(30));

        let state = clock.snapshot();
        assert_eq!(state.turn, Color::Black);
        assert_eq!(state.countdown.map(|c| c.remaining), Some(secs(30)));
    }

    #[test]
    fn finish_wins_only_once() {
        let t0 = Instant::now();
        let clock = started(60, 60, t0);
        assert!(clock.finish());
        assert!(!clock.finish());
        assert_eq!(clock.tick(t0 + Duration::from_secs(1)), Tick::GameOver);

        // moves after the end do not restart the clock
        clock.on_move_made(t0 + Duration::from_secs(2));
        assert_eq!(clock.snapshot().turn, Color::White);
    }

    #[test]
    fn take_back_hands_the_clock_to_the_side_to_move() {
        let t0 = Instant::now();
        let clock = started(60, 60, t0);
        clock.on_move_made(t0 + Duration::from_secs(2));
        clock.on_move_made(t0 + Duration::from_secs(4));
        assert_eq!(clock.snapshot().turn, Color::White);

        clock.take_back(t0 + Duration::from_secs(5), secs(58), secs(59), Color::Black);
        let state = clock.snapshot();
        assert_eq!(state.turn, Color::Black);
        assert_eq!(state.times(), (secs(58), secs(59)));
        assert_eq!(
            clock.tick(t0 + Duration::from_secs(8)),
            Tick::Running {
                white: secs(58),
                black: secs(56)
            }
        );
    }

    #[test]
    fn take_back_after_a_flag_changes_nothing() {
        let t0 = Instant::now();
        let clock = started(1, 60, t0);
        assert!(matches!(
            clock.tick(t0 + Duration::from_secs(2)),
            Tick::Flagged { .. }
        ));

        clock.take_back(t0 + Duration::from_secs(3), secs(30), secs(30), Color::White);
        assert!(clock.is_game_over());
        assert_eq!(clock.tick(t0 + Duration::from_secs(4)), Tick::GameOver);
    }

    #[test]
    fn initialize_starts_a_fresh_game() {
        let clock = ClockSynchronizer::new("test");
        clock.initialize(secs(1), secs(1));
        clock.finish();

        clock.initialize(secs(10), secs(10));
        assert!(!clock.is_game_over());
    }

    proptest! {
        #[test]
        fn live_side_never_gains_time(
            white in 1i64..10_000,
            black in 1i64..10_000,
            steps in proptest::collection::vec(0u64..5_000, 1..20),
        ) {
            let t0 = Instant::now();
            let clock = ClockSynchronizer::new("prop");
            clock.initialize(RemainingTime::from_millis(white), RemainingTime::from_millis(black));
            clock.on_move_made(t0);

            let mut steps = steps;
            steps.sort_unstable();
            let mut last_white = RemainingTime::from_millis(white);
            for offset in steps {
                match clock.tick(t0 + Duration::from_millis(offset)) {
                    Tick::Running { white: w, black: b } | Tick::Flagged { white: w, black: b, .. } => {
                        prop_assert!(w <= last_white);
                        prop_assert_eq!(b, RemainingTime::from_millis(black));
                        last_white = w;
                    }
                    Tick::GameOver => break,
                    Tick::Unseeded => prop_assert!(false, "seeded clock reported unseeded"),
                }
            }
        }
    }
}
