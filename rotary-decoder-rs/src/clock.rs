//! Millisecond clock anchored to its first use.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// A free-running millisecond counter supplied by the platform.
///
/// Must never go backwards. The firmware implementation reads the Embassy
/// time driver; tests use a manually advanced counter.
pub trait TickSource {
    /// Current raw counter value in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Monotonic millisecond clock whose epoch is the first reading.
///
/// The first call to [`now()`](Self::now) (or
/// [`to_source()`](Self::to_source)) latches the raw counter as the
/// epoch. Every later timestamp is an offset from it, so the first
/// observed event is at `0`.
///
/// The epoch sits behind a blocking mutex so the clock can be shared as a
/// `static` between the edge task and the timeout task.
pub struct MonotonicClock<M: RawMutex, S> {
    source: S,
    epoch: Mutex<M, Cell<Option<u64>>>,
}

impl<M: RawMutex, S: TickSource> MonotonicClock<M, S> {
    /// Create an unanchored clock.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            epoch: Mutex::new(Cell::new(None)),
        }
    }

    /// Milliseconds since the epoch, anchoring it on first call.
    pub fn now(&self) -> u64 {
        let raw = self.source.now_ms();
        raw.saturating_sub(self.epoch(raw))
    }

    /// Convert an epoch-relative timestamp back to the raw counter.
    ///
    /// Used to hand decoder deadlines to the platform timer.
    pub fn to_source(&self, timestamp: u64) -> u64 {
        let epoch = self.epoch(self.source.now_ms());
        epoch.saturating_add(timestamp)
    }

    /// Returns `true` once the epoch has been latched.
    pub fn is_anchored(&self) -> bool {
        self.epoch.lock(|epoch| epoch.get().is_some())
    }

    fn epoch(&self, raw: u64) -> u64 {
        self.epoch.lock(|epoch| match epoch.get() {
            Some(anchored) => anchored,
            None => {
                epoch.set(Some(raw));
                raw
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    struct FakeTicks(Cell<u64>);

    impl TickSource for FakeTicks {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn first_reading_is_zero() {
        let clock: MonotonicClock<NoopRawMutex, _> = MonotonicClock::new(FakeTicks(Cell::new(12_345)));
        assert!(!clock.is_anchored());
        assert_eq!(clock.now(), 0);
        assert!(clock.is_anchored());
    }

    #[test]
    fn later_readings_are_offsets_from_epoch() {
        let clock: MonotonicClock<NoopRawMutex, _> = MonotonicClock::new(FakeTicks(Cell::new(1_000)));
        clock.now();

        clock.source.0.set(1_040);
        assert_eq!(clock.now(), 40);

        clock.source.0.set(4_000);
        assert_eq!(clock.now(), 3_000);
    }

    #[test]
    fn to_source_round_trips_deadlines() {
        let clock: MonotonicClock<NoopRawMutex, _> = MonotonicClock::new(FakeTicks(Cell::new(500)));
        clock.now();
        clock.source.0.set(900);

        // A deadline 1100 ms after the epoch is raw tick 1600.
        assert_eq!(clock.to_source(1_100), 1_600);
    }

    #[test]
    fn to_source_anchors_an_unused_clock() {
        let clock: MonotonicClock<NoopRawMutex, _> = MonotonicClock::new(FakeTicks(Cell::new(77)));
        assert_eq!(clock.to_source(10), 87);
        assert!(clock.is_anchored());
        assert_eq!(clock.now(), 0);
    }
}
