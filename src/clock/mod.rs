pub mod synchronizer;
pub mod timer;

pub use synchronizer::{ClockSynchronizer, Tick};
pub use timer::{TimerEvent, TimerLoop, DEFAULT_REFRESH};
