//! Single-shot, rearmable timeout handle.
//!
//! A [`OneShotTimer`] is a deadline, not a running timer: the decoder
//! stores one per logical timeout and the timeout task sleeps until the
//! earliest of them. Because the handle is a single `Option`, there can
//! never be two live instances of the same timeout.

/// A single pending expiry, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneShotTimer {
    expiry: Option<u64>,
}

impl OneShotTimer {
    /// Create a disarmed timer.
    pub const fn new() -> Self {
        Self { expiry: None }
    }

    /// Arm a disarmed timer to expire `duration_ms` after `now`.
    ///
    /// Arming a timer that is still pending is a logic error (use
    /// [`rearm()`](Self::rearm)); debug builds assert on it.
    pub fn arm(&mut self, now: u64, duration_ms: u64) -> u64 {
        debug_assert!(self.expiry.is_none(), "timer armed while pending");
        self.set(now, duration_ms)
    }

    /// Move the expiry to `duration_ms` after `now`, arming if needed.
    pub fn rearm(&mut self, now: u64, duration_ms: u64) -> u64 {
        self.set(now, duration_ms)
    }

    /// Disarm. Returns `true` if an expiry was pending.
    pub fn cancel(&mut self) -> bool {
        self.expiry.take().is_some()
    }

    /// Disarm and return the expiry if it is due at `now`.
    pub fn fire(&mut self, now: u64) -> Option<u64> {
        match self.expiry {
            Some(at) if at <= now => {
                self.expiry = None;
                Some(at)
            }
            _ => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.expiry.is_some()
    }

    pub fn expiry(&self) -> Option<u64> {
        self.expiry
    }

    fn set(&mut self, now: u64, duration_ms: u64) -> u64 {
        let at = now.saturating_add(duration_ms);
        self.expiry = Some(at);
        at
    }
}
