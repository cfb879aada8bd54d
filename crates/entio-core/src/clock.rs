//! Game clock for the I/O core.
//!
//! The clock tracks the tick counter and elapsed game time. Delayed
//! deliveries are keyed by absolute game time, so the clock is the single
//! source of truth for "now".
//!
//! # Design Principles
//!
//! - All temporal arithmetic is checked (no silent overflow).
//! - Time never moves backwards. Within a tick the clock may step forward
//!   to each delivery's deadline so that work scheduled from a delivery is
//!   measured from the moment it ran.

use std::time::Duration;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Game time would overflow.
    #[error("game time overflow: cannot add {elapsed:?} to {now:?}")]
    TimeOverflow {
        /// Current game time.
        now: Duration,
        /// Requested step.
        elapsed: Duration,
    },
}

/// Tick counter plus elapsed game time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameClock {
    /// Number of completed ticks.
    tick: u64,
    /// Elapsed game time since the level started.
    now: Duration,
}

impl GameClock {
    /// A clock at tick 0, time 0.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            now: Duration::ZERO,
        }
    }

    /// Create a clock from explicit parameters (useful for tests).
    pub const fn from_parts(tick: u64, now: Duration) -> Self {
        Self { tick, now }
    }

    /// Number of completed ticks.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current game time.
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// The absolute time `delay` from now.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TimeOverflow`] if the sum overflows.
    pub fn deadline_after(&self, delay: Duration) -> Result<Duration, ClockError> {
        self.now
            .checked_add(delay)
            .ok_or(ClockError::TimeOverflow {
                now: self.now,
                elapsed: delay,
            })
    }

    /// Step forward to `time` inside a tick. Earlier times are ignored.
    pub fn step_to(&mut self, time: Duration) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Finish the current tick at `end` and return the new tick count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would
    /// exceed `u64::MAX`.
    pub fn complete_tick(&mut self, end: Duration) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.step_to(end);
        Ok(self.tick)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_zero() {
        let clock = GameClock::new();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn complete_tick_advances_counter_and_time() {
        let mut clock = GameClock::new();
        let end = clock.deadline_after(Duration::from_millis(100)).unwrap();
        assert_eq!(clock.complete_tick(end).unwrap(), 1);
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn time_never_moves_backwards() {
        let mut clock = GameClock::from_parts(3, Duration::from_secs(5));
        clock.step_to(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(5));
        clock.step_to(Duration::from_secs(6));
        assert_eq!(clock.now(), Duration::from_secs(6));
    }

    #[test]
    fn overflow_is_reported() {
        let mut clock = GameClock::from_parts(u64::MAX, Duration::MAX);
        assert!(matches!(
            clock.deadline_after(Duration::from_secs(1)),
            Err(ClockError::TimeOverflow { .. })
        ));
        assert_eq!(clock.complete_tick(Duration::MAX), Err(ClockError::TickOverflow));
    }
}
