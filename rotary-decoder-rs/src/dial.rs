//! Shared decoder state for the edge, timeout and reader contexts.
//!
//! [`Dial`] is the single object every task is handed. It holds:
//!
//! - the [`Decoder`] behind a blocking (critical-section) mutex, so the
//!   edge path and the timer path take turns and neither can block the
//!   other for longer than one state update;
//! - a reschedule [`Signal`] the edge path raises after arming or
//!   extending the digit timer, so a sleeping timeout task re-reads the
//!   next deadline;
//! - the [`SequenceChannel`] readers wait on.
//!
//! Publication happens after the decoder lock is released.
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use rotary_decoder::{DecoderConfig, Dial};
//!
//! let dial: Dial<NoopRawMutex, 1> = Dial::new(DecoderConfig::default());
//! dial.start(&mut []).unwrap();
//! let mut reader = dial.reader().unwrap();
//!
//! dial.on_edge(0);
//! assert_eq!(dial.service_timers(500), Some(3_500));
//! assert_eq!(dial.service_timers(3_500), None);
//!
//! assert_eq!(reader.try_read().unwrap().as_bytes(), b"1\n\0");
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::channel::{SequenceChannel, SequenceReader};
use crate::config::DecoderConfig;
use crate::decoder::{Decoder, EdgeOutcome};
use crate::error::StartupError;
use crate::lifecycle::{bring_up, tear_down, Binding};
use crate::sequence::Sequence;

/// One rotary dial: decoder, timer wake-up and sequence channel.
///
/// `READERS` bounds the number of concurrent [`SequenceReader`]s.
pub struct Dial<M: RawMutex, const READERS: usize> {
    decoder: Mutex<M, RefCell<Decoder>>,
    reschedule: Signal<M, ()>,
    channel: SequenceChannel<M, READERS>,
}

impl<M: RawMutex, const READERS: usize> Dial<M, READERS> {
    /// Create a dial whose decoder is not yet in service.
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            decoder: Mutex::new(RefCell::new(Decoder::new(config))),
            reschedule: Signal::new(),
            channel: SequenceChannel::new(),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Acquire `bindings` in order, then put the decoder in service.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if any binding fails. Bindings acquired
    /// before it are released in reverse order and the decoder is left
    /// out of service.
    pub fn start(&self, bindings: &mut [&mut dyn Binding]) -> Result<(), StartupError> {
        bring_up(bindings)?;
        self.with_decoder_mut(Decoder::start);
        self.reschedule.signal(());
        Ok(())
    }

    /// Take the decoder out of service, then release `bindings` in
    /// reverse order.
    pub fn stop(&self, bindings: &mut [&mut dyn Binding]) {
        self.with_decoder_mut(Decoder::stop);
        self.reschedule.signal(());
        tear_down(bindings);
    }

    // ── Producer paths ───────────────────────────────────────────────

    /// Edge fast path: feed one rising edge stamped `now` (epoch ms).
    ///
    /// Never waits. Signals the timeout task when the digit deadline
    /// moved.
    pub fn on_edge(&self, now: u64) -> EdgeOutcome {
        let outcome = self.with_decoder_mut(|decoder| decoder.on_edge(now));
        if let EdgeOutcome::Counted { .. } = outcome {
            self.reschedule.signal(());
        }
        outcome
    }

    /// Timer path: fire due timers, publish completed sequences, and
    /// return the next deadline.
    pub fn service_timers(&self, now: u64) -> Option<u64> {
        while let Some(sequence) = self.with_decoder_mut(|decoder| decoder.poll(now)) {
            self.channel.publish(sequence);
        }
        self.next_deadline()
    }

    /// Earliest pending timer expiry (epoch ms).
    pub fn next_deadline(&self) -> Option<u64> {
        self.with_decoder(Decoder::next_deadline)
    }

    /// Wait until the edge path or a lifecycle change moves the deadlines.
    pub async fn rescheduled(&self) {
        self.reschedule.wait().await
    }

    // ── Consumer side ────────────────────────────────────────────────

    /// Register a reader, or `None` if `READERS` are already live.
    pub fn reader(&self) -> Option<SequenceReader<'_, M, READERS>> {
        self.channel.reader()
    }

    /// The most recently published sequence.
    pub fn latest(&self) -> Option<Sequence> {
        self.channel.latest()
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Run `f` against the decoder under the lock.
    pub fn with_decoder<R>(&self, f: impl FnOnce(&Decoder) -> R) -> R {
        self.decoder.lock(|decoder| f(&decoder.borrow()))
    }

    fn with_decoder_mut<R>(&self, f: impl FnOnce(&mut Decoder) -> R) -> R {
        self.decoder.lock(|decoder| f(&mut decoder.borrow_mut()))
    }
}
