//! The pulse → digit → sequence state machine.
//!
//! [`Decoder`] owns every piece of mutable decoding state: the debounce
//! watermark, the pulse count with its digit timer, the sequence buffer
//! with its sequence timer, and the lifecycle flag. It is a plain value
//! with `&mut self` methods and no notion of wall-clock time; callers
//! pass timestamps in.
//!
//! # Driving the decoder
//!
//! Two entry points, matching the two producer contexts:
//!
//! - [`Decoder::on_edge()`] is the edge fast path. Debounces, counts and
//!   arms the digit timer. Constant time, never publishes.
//! - [`Decoder::poll()`] is the timer path. Fires whichever timers are
//!   due at `now`, in expiry order, and returns a finalized
//!   [`Sequence`] when one completes. Call it until it returns `None`.
//!
//! [`Decoder::next_deadline()`] tells the timer path when to call again.
//!
//! ```
//! use rotary_decoder::{Decoder, DecoderConfig};
//!
//! let mut decoder = Decoder::new(DecoderConfig::default());
//! decoder.start();
//!
//! // Two pulses, the second 40 ms after the first is contact bounce.
//! decoder.on_edge(0);
//! decoder.on_edge(40);
//! decoder.on_edge(600);
//!
//! // Digit closes 500 ms after the last pulse, sequence 3 s after that.
//! assert_eq!(decoder.poll(1_100), None);
//! let sequence = decoder.poll(4_100).unwrap();
//! assert_eq!(sequence.as_bytes(), b"2\n\0");
//! ```

use crate::config::DecoderConfig;
use crate::debounce::EdgeDebouncer;
use crate::pulse::PulseCounter;
use crate::sequence::{Sequence, SequenceBuffer};
use crate::timer::OneShotTimer;

/// Lifecycle of a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    /// Constructed, never started. Edges are ignored.
    Created,
    /// In service.
    Running,
    /// Taken out of service. Edges are ignored; may be restarted.
    Stopped,
}

/// Where the decoder is within one decoding cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No pulses counted and no digits buffered.
    Idle,
    /// Pulses counted; the digit timer is pending.
    DigitAccumulating,
    /// Digits buffered, no pulse in flight; the sequence timer is pending.
    AwaitingSequenceEnd,
}

/// Result of feeding one edge to [`Decoder::on_edge()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// Edge accepted and counted.
    Counted {
        /// Pulses in the digit so far, this one included.
        pulses: u32,
        /// When the digit will close if no further pulse arrives.
        digit_deadline: u64,
    },
    /// Edge fell inside the debounce window and was dropped.
    Debounced,
    /// Decoder is not running; edge ignored.
    Inactive,
}

/// Running totals since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    pub accepted_edges: u32,
    pub debounced_edges: u32,
    pub digits: u32,
    pub dropped_digits: u32,
    pub sequences: u32,
    /// Sequences finalized because the buffer filled up.
    pub overflows: u32,
}

/// Rotary dial decoding state.
pub struct Decoder {
    config: DecoderConfig,
    state: LifecycleState,
    debouncer: EdgeDebouncer,
    pulses: PulseCounter,
    buffer: SequenceBuffer,
    sequence_timer: OneShotTimer,
    stats: DecoderStats,
}

impl Decoder {
    /// Create a decoder in [`LifecycleState::Created`].
    ///
    /// The configuration is normalised first, so the sequence length is
    /// always within `1..=60`.
    pub fn new(config: DecoderConfig) -> Self {
        let config = config.normalized();
        Self {
            config,
            state: LifecycleState::Created,
            debouncer: EdgeDebouncer::new(config.debounce_window_ms),
            pulses: PulseCounter::new(config.digit_timeout_ms),
            buffer: SequenceBuffer::new(config.max_number_len),
            sequence_timer: OneShotTimer::new(),
            stats: DecoderStats::default(),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Put the decoder in service. No-op if already running.
    pub fn start(&mut self) {
        if self.state != LifecycleState::Running {
            self.state = LifecycleState::Running;
            #[cfg(feature = "defmt")]
            defmt::info!("Rotary decoder running, max_number_len={}", self.config.max_number_len);
        }
    }

    /// Take the decoder out of service.
    ///
    /// Cancels both timers and discards the digit and sequence in
    /// progress. The debounce watermark is kept.
    pub fn stop(&mut self) {
        self.pulses.reset();
        self.sequence_timer.cancel();
        self.buffer.clear();
        if self.state == LifecycleState::Running {
            #[cfg(feature = "defmt")]
            defmt::info!("Rotary decoder stopped");
        }
        self.state = LifecycleState::Stopped;
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    // ── Edge path ────────────────────────────────────────────────────

    /// Feed one rising edge stamped `now`.
    ///
    /// Never publishes and never touches the sequence buffer.
    pub fn on_edge(&mut self, now: u64) -> EdgeOutcome {
        if self.state != LifecycleState::Running {
            return EdgeOutcome::Inactive;
        }

        if !self.debouncer.accept(now) {
            self.stats.debounced_edges = self.stats.debounced_edges.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::trace!("Edge at {} ms debounced", now);
            return EdgeOutcome::Debounced;
        }

        self.stats.accepted_edges = self.stats.accepted_edges.wrapping_add(1);
        let digit_deadline = self.pulses.on_accepted_pulse(now);
        EdgeOutcome::Counted {
            pulses: self.pulses.count(),
            digit_deadline,
        }
    }

    // ── Timer path ───────────────────────────────────────────────────

    /// Fire every timer due at `now`, stopping at the first completed
    /// sequence.
    ///
    /// Timers fire in expiry order, each one acting as if it ran at its
    /// own expiry instant, so a late call produces the same result as a
    /// punctual one. When the digit and sequence timers expire at the
    /// same instant the digit goes first and extends the sequence.
    ///
    /// Call repeatedly until it returns `None`.
    pub fn poll(&mut self, now: u64) -> Option<Sequence> {
        if self.state != LifecycleState::Running {
            return None;
        }

        loop {
            let digit_due = self.pulses.deadline().filter(|&at| at <= now);
            let sequence_due = self.sequence_timer.expiry().filter(|&at| at <= now);

            let sequence_first = match (digit_due, sequence_due) {
                (None, None) => return None,
                (None, Some(_)) => true,
                (Some(_), None) => false,
                (Some(digit_at), Some(sequence_at)) => sequence_at < digit_at,
            };

            if sequence_first {
                self.sequence_timer.fire(now);
                return Some(self.finalize_sequence());
            }

            if let Some((digit, at)) = self.pulses.complete_digit(now) {
                if let Some(sequence) = self.finalize_digit(digit, at) {
                    return Some(sequence);
                }
            }
        }
    }

    /// Earliest pending timer expiry.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.pulses.deadline(), self.sequence_timer.expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Append a completed digit and decide what happens to the sequence.
    fn finalize_digit(&mut self, digit: u8, at: u64) -> Option<Sequence> {
        if self.buffer.push_digit(digit) {
            self.stats.digits = self.stats.digits.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::debug!("Digit {} complete at {} ms", digit, at);
        } else {
            self.stats.dropped_digits = self.stats.dropped_digits.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("Sequence buffer full, digit {} dropped", digit);
        }

        if self.buffer.is_full() {
            self.sequence_timer.cancel();
            self.stats.overflows = self.stats.overflows.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::debug!("Sequence buffer reached {} digits", self.buffer.capacity());
            return Some(self.finalize_sequence());
        }

        if self.buffer.len() == 1 {
            self.sequence_timer.arm(at, self.config.sequence_timeout_ms);
        } else {
            self.sequence_timer.rearm(at, self.config.sequence_timeout_ms);
        }
        None
    }

    fn finalize_sequence(&mut self) -> Sequence {
        let sequence = self.buffer.terminate();
        self.stats.sequences = self.stats.sequences.wrapping_add(1);
        #[cfg(feature = "defmt")]
        defmt::info!("Rotary sequence: {}", sequence);
        sequence
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        if self.pulses.count() > 0 {
            Phase::DigitAccumulating
        } else if !self.buffer.is_empty() {
            Phase::AwaitingSequenceEnd
        } else {
            Phase::Idle
        }
    }

    /// Pulses counted toward the digit in progress.
    pub fn pulse_count(&self) -> u32 {
        self.pulses.count()
    }

    /// Digits buffered for the sequence in progress.
    pub fn buffered_digits(&self) -> &[u8] {
        self.buffer.digits()
    }

    pub fn digit_deadline(&self) -> Option<u64> {
        self.pulses.deadline()
    }

    pub fn sequence_deadline(&self) -> Option<u64> {
        self.sequence_timer.expiry()
    }

    /// Debounce watermark.
    pub fn last_accepted_edge(&self) -> Option<u64> {
        self.debouncer.last_accepted()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
