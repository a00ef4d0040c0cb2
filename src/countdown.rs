//! Poll countdown advanced by the event loop's tick.
//!
//! Counting → Idle when the remaining time hits zero or a fetch is in
//! flight. Idle → Counting on [`Countdown::restart`], which the view calls
//! when the fetch resolves.

use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStatus {
    Counting,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    pub status: CountdownStatus,
    pub remaining: Duration,
}

impl CountdownState {
    /// Whole seconds left, for display.
    pub fn seconds(&self) -> u64 {
        self.remaining.as_secs()
    }

    /// A refresh is running or about to start.
    pub fn refreshing(&self) -> bool {
        self.status == CountdownStatus::Idle || self.remaining.is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct Countdown {
    duration: Duration,
    status: CountdownStatus,
    remaining: Duration,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            status: CountdownStatus::Counting,
            remaining: duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn state(&self) -> CountdownState {
        CountdownState {
            status: self.status,
            remaining: self.remaining,
        }
    }

    /// Decrement while counting. Returns `true` exactly on the tick that
    /// reaches zero; the countdown is Idle afterwards.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.status == CountdownStatus::Idle {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.status = CountdownStatus::Idle;
            return true;
        }
        false
    }

    /// Stop counting while a fetch is in flight.
    pub fn suspend(&mut self) {
        self.status = CountdownStatus::Idle;
    }

    /// Start a full interval.
    pub fn restart(&mut self) {
        self.status = CountdownStatus::Counting;
        self.remaining = self.duration;
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}
