//! Pulse counting and the digit timeout.

use crate::timer::OneShotTimer;

/// Counts accepted pulses and tracks the "end of digit" deadline.
///
/// Every pulse pushes the digit deadline out to `pulse + timeout`, so a
/// burst of pulses closer together than the timeout is one digit.
#[derive(Debug, Clone, Copy)]
pub struct PulseCounter {
    count: u32,
    timer: OneShotTimer,
    timeout_ms: u64,
}

impl PulseCounter {
    pub const fn new(timeout_ms: u64) -> Self {
        Self {
            count: 0,
            timer: OneShotTimer::new(),
            timeout_ms,
        }
    }

    /// Count one accepted pulse at `now` and return the digit deadline.
    ///
    /// The first pulse of a digit arms the timer; later pulses rearm it.
    pub fn on_accepted_pulse(&mut self, now: u64) -> u64 {
        let deadline = if self.timer.is_armed() {
            self.timer.rearm(now, self.timeout_ms)
        } else {
            self.timer.arm(now, self.timeout_ms)
        };
        self.count = self.count.saturating_add(1);
        deadline
    }

    /// Fire the digit timer if it is due.
    ///
    /// Returns the completed digit (`count mod 10`) and the instant the
    /// timer expired, and resets the count to zero.
    pub fn complete_digit(&mut self, now: u64) -> Option<(u8, u64)> {
        let at = self.timer.fire(now)?;
        let digit = (self.count % 10) as u8;
        self.count = 0;
        Some((digit, at))
    }

    /// Pulses counted toward the digit in progress.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Expiry of the pending digit timer.
    pub fn deadline(&self) -> Option<u64> {
        self.timer.expiry()
    }

    /// Drop the digit in progress.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.count = 0;
    }
}
