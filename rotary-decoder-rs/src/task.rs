//! Embassy tasks that drive a [`Dial`].
//!
//! Two loops, one per producer context:
//!
//! - [`edge_task`] waits for rising edges on the dial line and feeds them
//!   to [`Dial::on_edge()`]. It runs on the GPIO interrupt wake-up and
//!   never waits on anything but the line.
//! - [`timeout_task`] sleeps until the decoder's next deadline, or until
//!   the edge path moves it, then calls [`Dial::service_timers()`].
//!
//! Both are plain `async fn`s. Embassy tasks cannot be generic, so the
//! firmware wraps each one in a concrete `#[embassy_executor::task]`:
//!
//! ```ignore
//! #[embassy_executor::task]
//! async fn dial_timeout_task(
//!     dial: &'static Dial<CriticalSectionRawMutex, 2>,
//!     clock: &'static MonotonicClock<CriticalSectionRawMutex, EmbassyTicks>,
//! ) {
//!     timeout_task(dial, clock).await;
//! }
//! ```

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Instant, Timer};
use embedded_hal_async::digital::Wait;

use crate::clock::{MonotonicClock, TickSource};
use crate::decoder::EdgeOutcome;
use crate::dial::Dial;

/// [`TickSource`] backed by the Embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTicks;

impl TickSource for EmbassyTicks {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

// ── Edge task ────────────────────────────────────────────────────────────

/// Feed every rising edge on `line` to `dial`.
///
/// Timestamps are taken from `clock` as soon as the edge wait completes.
/// A line error is logged and the wait retried.
pub async fn edge_task<W, M, S, const READERS: usize>(
    mut line: W,
    dial: &Dial<M, READERS>,
    clock: &MonotonicClock<M, S>,
) -> !
where
    W: Wait,
    M: RawMutex,
    S: TickSource,
{
    loop {
        if line.wait_for_rising_edge().await.is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Edge wait failed, retrying");
            continue;
        }

        let now = clock.now();
        match dial.on_edge(now) {
            EdgeOutcome::Counted {
                pulses: _pulses,
                digit_deadline: _due,
            } => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Pulse {} at {} ms, digit due {} ms", _pulses, now, _due);
            }
            EdgeOutcome::Debounced => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Bounce at {} ms", now);
            }
            EdgeOutcome::Inactive => {}
        }
    }
}

// ── Timeout task ─────────────────────────────────────────────────────────

/// Fire the dial's timers as they come due.
///
/// # Control flow
///
/// 1. Ask the dial for its next deadline.
/// 2. Sleep until that deadline, or until the dial signals a reschedule.
///    With no deadline pending, only the reschedule can wake the task.
/// 3. Service whatever is due at the current time and go again.
///
/// A reschedule that lands after step 1 is not lost: the signal stays set
/// until the next wait consumes it.
pub async fn timeout_task<M, S, const READERS: usize>(
    dial: &Dial<M, READERS>,
    clock: &MonotonicClock<M, S>,
) -> !
where
    M: RawMutex,
    S: TickSource,
{
    loop {
        match dial.next_deadline() {
            Some(deadline) => {
                let at = Instant::from_millis(clock.to_source(deadline));
                if let Either::Second(()) = select(Timer::at(at), dial.rescheduled()).await {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("Deadlines moved");
                }
            }
            None => dial.rescheduled().await,
        }

        dial.service_timers(clock.now());
    }
}
