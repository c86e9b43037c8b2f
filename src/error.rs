//! Public error of tick-timer.

use crate::prelude::*;

/// Error enumeration for `Timer` and `TickSequence` operations.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
pub enum TimerError {
    /// The tick sequence was cancelled from outside while its run is still live.
    #[error("Cancellation of the tick sequence is not allowed while it is open, use `Timer::stop()` instead.")]
    IllegalOperation,
    /// A finite repeat limit has to be positive.
    #[error("Repeat limit must be greater than zero, got {0}.")]
    InvalidRepeatLimit(u64),
}
