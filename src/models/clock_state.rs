use chess::Color;
use std::fmt;
use std::time::{Duration, Instant};

/// Remaining time on one side of the clock, in milliseconds.
///
/// Unlike `Duration` this can go below zero: an extrapolated clock that has
/// run past its budget is how a flag shows up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemainingTime(i64);

impl RemainingTime {
    pub const ZERO: RemainingTime = RemainingTime(0);

    pub fn from_millis(millis: i64) -> Self {
        RemainingTime(millis)
    }

    pub fn from_secs(secs: i64) -> Self {
        RemainingTime(secs.saturating_mul(1000))
    }

    pub fn total_seconds(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Time left after `elapsed` has run off the clock
    pub fn minus(self, elapsed: Duration) -> Self {
        let elapsed = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        RemainingTime(self.0.saturating_sub(elapsed))
    }
}

impl From<Duration> for RemainingTime {
    fn from(duration: Duration) -> Self {
        RemainingTime(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }
}

// Renders as `H:MM:SS`, with a six digit fraction only when there is one,
// e.g. `0:01:20` or `0:01:19.503000`.
impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        let millis = self.0.unsigned_abs();
        let hours = millis / 3_600_000;
        let minutes = (millis / 60_000) % 60;
        let seconds = (millis / 1000) % 60;
        let fraction = millis % 1000;

        write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)?;
        if fraction != 0 {
            write!(f, ".{:06}", fraction * 1000)?;
        }
        Ok(())
    }
}

/// A running countdown: the live side's time captured at the instant its
/// clock started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub started: Instant,
    pub remaining: RemainingTime,
}

impl Countdown {
    /// Extrapolated time left at `now`
    pub fn remaining_at(&self, now: Instant) -> RemainingTime {
        self.remaining.minus(now.saturating_duration_since(self.started))
    }
}

/// Clock state for the game on the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockState {
    pub white_time: RemainingTime,
    pub black_time: RemainingTime,
    /// Side whose clock is running once a countdown is seeded
    pub turn: Color,
    /// Absent until the first move seeds the clock
    pub countdown: Option<Countdown>,
    pub game_over: bool,
}

impl ClockState {
    pub fn time_of(&self, side: Color) -> RemainingTime {
        match side {
            Color::White => self.white_time,
            Color::Black => self.black_time,
        }
    }

    pub fn set_time(&mut self, side: Color, time: RemainingTime) {
        match side {
            Color::White => self.white_time = time,
            Color::Black => self.black_time = time,
        }
    }

    pub fn times(&self) -> (RemainingTime, RemainingTime) {
        (self.white_time, self.black_time)
    }
}

impl Default for ClockState {
    fn default() -> Self {
        ClockState {
            white_time: RemainingTime::ZERO,
            black_time: RemainingTime::ZERO,
            turn: Color::White,
            countdown: None,
            game_over: false,
        }
    }
}
