//! One-tick-per-second countdown for a test session.
//!
//! `Countdown` only counts; something else decides when a tick happens. In the
//! services crate that is a tokio interval, in tests it is a plain loop.

/// Default session length: one hour.
pub const DEFAULT_SESSION_SECS: u32 = 3600;

/// Below this many seconds the presenter should flag the timer.
pub const LOW_TIME_THRESHOLD_SECS: u32 = 300;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting; carries the new remaining time.
    Running(u32),
    /// This tick reached zero. Reported exactly once.
    Expired,
    /// The countdown was not running; nothing changed.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    /// A countdown that has not been started.
    #[must_use]
    pub fn idle(initial_secs: u32) -> Self {
        Self {
            remaining: initial_secs,
            running: false,
        }
    }

    /// Start counting down from `initial_secs`.
    ///
    /// Starting from zero yields a countdown that is already expired and never ticks.
    #[must_use]
    pub fn start(initial_secs: u32) -> Self {
        Self {
            remaining: initial_secs,
            running: initial_secs > 0,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stopped;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    /// Halt ticking. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Render seconds as `HH:MM:SS`.
#[must_use]
pub fn format_remaining(secs: u32) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

#[must_use]
pub fn is_running_low(secs: u32) -> bool {
    secs < LOW_TIME_THRESHOLD_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut countdown = Countdown::start(3);
        assert_eq!(countdown.tick(), TickOutcome::Running(2));
        assert_eq!(countdown.tick(), TickOutcome::Running(1));
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Stopped);
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());
    }

    #[test]
    fn remaining_never_increases() {
        let mut countdown = Countdown::start(10);
        let mut last = countdown.remaining();
        for _ in 0..20 {
            countdown.tick();
            assert!(countdown.remaining() <= last);
            last = countdown.remaining();
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn stop_is_idempotent_and_freezes_time() {
        let mut countdown = Countdown::start(60);
        countdown.tick();
        countdown.stop();
        countdown.stop();
        assert_eq!(countdown.tick(), TickOutcome::Stopped);
        assert_eq!(countdown.remaining(), 59);
    }

    #[test]
    fn idle_and_zero_start_do_not_tick() {
        let mut idle = Countdown::idle(30);
        assert_eq!(idle.tick(), TickOutcome::Stopped);
        assert_eq!(idle.remaining(), 30);

        let mut zero = Countdown::start(0);
        assert!(zero.is_expired());
        assert_eq!(zero.tick(), TickOutcome::Stopped);
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_remaining(DEFAULT_SESSION_SECS), "01:00:00");
        assert_eq!(format_remaining(3599), "00:59:59");
        assert_eq!(format_remaining(0), "00:00:00");
        assert_eq!(format_remaining(36_061), "10:01:01");
    }

    #[test]
    fn low_time_threshold() {
        assert!(is_running_low(299));
        assert!(!is_running_low(300));
    }
}
