//! Idle clock behind the automatic word hint
//!
//! The clock only counts; whoever owns the session feeds it elapsed time
//! (the trainer uses a 100 ms interval). It fires once and then stays
//! disarmed until it is re-armed for a new character position.

use std::time::Duration;

/// Idle time on one character before its word is revealed
pub const AUTO_HINT_DELAY: Duration = Duration::from_millis(5000);

/// Granularity the trainer ticks the clock with
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HintClock {
    elapsed: Duration,
    armed: bool,
}

impl HintClock {
    /// Start counting from zero
    pub fn arm(&mut self) {
        self.elapsed = Duration::ZERO;
        self.armed = true;
    }

    /// Stop counting and clear elapsed time
    pub fn disarm(&mut self) {
        self.elapsed = Duration::ZERO;
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed share of the delay (0.0-1.0), for progress bars
    pub fn fraction(&self) -> f64 {
        (self.elapsed.as_secs_f64() / AUTO_HINT_DELAY.as_secs_f64()).min(1.0)
    }

    /// Add `by` to the elapsed time; returns true exactly once, when the
    /// delay is reached
    pub fn advance(&mut self, by: Duration) -> bool {
        if !self.armed {
            return false;
        }
        self.elapsed += by;
        if self.elapsed >= AUTO_HINT_DELAY {
            self.elapsed = AUTO_HINT_DELAY;
            self.armed = false;
            return true;
        }
        false
    }
}
