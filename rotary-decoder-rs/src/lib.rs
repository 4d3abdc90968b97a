//! Pulse-to-digit decoder for mechanical rotary dials, built on Embassy.
//!
//! A rotary dial interrupts a line once per unit of the digit dialled
//! (ten times for `0`). This crate turns the stream of rising edges on
//! that line into terminated digit sequences:
//!
//! 1. [`EdgeDebouncer`] drops contact bounce inside a 70 ms window.
//! 2. [`PulseCounter`] counts pulses; 500 ms without one closes a digit.
//! 3. [`SequenceBuffer`] collects digits; 3 s without one, or a full
//!    buffer, closes the sequence.
//! 4. [`SequenceChannel`] hands the sequence (`"<digits>\n\0"`) to every
//!    waiting [`SequenceReader`].
//!
//! [`Decoder`] ties steps 1 to 3 together as a plain state machine.
//! [`Dial`] wraps it for sharing between the edge, timeout and reader
//! contexts, and owns the channel.
//!
//! # Quick Start
//!
//! ```ignore
//! use rotary_decoder::{DecoderConfig, Dial, EmbassyTicks, MonotonicClock};
//!
//! static CLOCK: MonotonicClock<CriticalSectionRawMutex, EmbassyTicks> =
//!     MonotonicClock::new(EmbassyTicks);
//!
//! let dial = DIAL.init(Dial::new(DecoderConfig::default()));
//! dial.start(&mut [&mut edge_line, &mut sequence_port])?;
//!
//! // Thin task wrappers (Embassy tasks cannot be generic):
//! #[embassy_executor::task]
//! async fn dial_edge_task(line: Input<'static>, dial: &'static MyDial) {
//!     edge_task(line, dial, &CLOCK).await;
//! }
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`](https://docs.rs/defmt).
//! - **`task`**: the Embassy [`edge_task`] and [`timeout_task`] loops.

#![cfg_attr(not(test), no_std)]

pub mod channel;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod decoder;
pub mod dial;
pub mod error;
pub mod lifecycle;
pub mod pulse;
pub mod sequence;
#[cfg(feature = "task")]
pub mod task;
pub mod timer;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use channel::{copy_sequence, SequenceChannel, SequenceReader};
pub use clock::{MonotonicClock, TickSource};
pub use config::{
    DecoderConfig, DEBOUNCE_WINDOW_MS, DEFAULT_MAX_NUMBER_LEN, DIGIT_TIMEOUT_MS,
    MAX_NUMBER_LEN_CEILING, SEQUENCE_TIMEOUT_MS, SEQUENCE_WIRE_CAPACITY,
};
pub use debounce::EdgeDebouncer;
pub use decoder::{Decoder, DecoderStats, EdgeOutcome, LifecycleState, Phase};
pub use dial::Dial;
pub use error::{BindError, ReadError, StartupError};
pub use lifecycle::{bring_up, tear_down, Binding};
pub use pulse::PulseCounter;
pub use sequence::{Sequence, SequenceBuffer, RECORD_SEPARATOR, TERMINATOR};
#[cfg(feature = "task")]
pub use task::{edge_task, timeout_task, EmbassyTicks};
pub use timer::OneShotTimer;
