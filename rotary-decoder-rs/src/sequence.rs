//! Digit accumulation and the terminated sequence wire format.

use core::fmt;

use heapless::Vec;

use crate::config::{MAX_NUMBER_LEN_CEILING, SEQUENCE_WIRE_CAPACITY};

/// Record separator appended after the last digit.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// Terminator appended after the record separator.
pub const TERMINATOR: u8 = b'\0';

/// A finalized sequence as delivered to readers.
///
/// Holds the ASCII digits in arrival order followed by `'\n'` and `'\0'`.
/// Never longer than [`SEQUENCE_WIRE_CAPACITY`].
#[derive(Clone, PartialEq, Eq)]
pub struct Sequence {
    bytes: Vec<u8, SEQUENCE_WIRE_CAPACITY>,
}

impl Sequence {
    /// Terminate a run of ASCII digits.
    ///
    /// Returns `None` if `digits` is longer than the ceiling or holds
    /// anything other than `'0'..='9'`.
    pub fn from_digits(digits: &[u8]) -> Option<Self> {
        if digits.len() > MAX_NUMBER_LEN_CEILING || !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let mut bytes = Vec::new();
        bytes.extend_from_slice(digits).ok()?;
        bytes.push(RECORD_SEPARATOR).ok()?;
        bytes.push(TERMINATOR).ok()?;
        Some(Self { bytes })
    }

    /// Full wire form, separator and terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The digits alone.
    pub fn digits(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 2]
    }

    /// The digits as text.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.digits()).unwrap_or_default()
    }

    /// Number of digits.
    pub fn len(&self) -> usize {
        self.bytes.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length on the wire, separator and terminator included.
    pub fn wire_len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Sequence").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Sequence {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// The sequence being dialled.
///
/// Bounded by the configured length, which is itself bounded by
/// [`MAX_NUMBER_LEN_CEILING`]. A full buffer refuses further digits.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    digits: Vec<u8, MAX_NUMBER_LEN_CEILING>,
    capacity: usize,
}

impl SequenceBuffer {
    /// Create an empty buffer holding at most `capacity` digits
    /// (clamped into `1..=60`).
    pub fn new(capacity: usize) -> Self {
        Self {
            digits: Vec::new(),
            capacity: capacity.clamp(1, MAX_NUMBER_LEN_CEILING),
        }
    }

    /// Append digit `value mod 10` as ASCII.
    ///
    /// Returns `false` and leaves the buffer untouched when it is full.
    pub fn push_digit(&mut self, value: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.digits.push(b'0' + value % 10).is_ok()
    }

    /// Close the buffer: return its terminated contents and empty it.
    pub fn terminate(&mut self) -> Sequence {
        // Digits never exceed the ceiling, so the wire form always fits.
        let sequence = Sequence::from_digits(&self.digits).unwrap_or_else(|| Sequence {
            bytes: Vec::from_slice(&[RECORD_SEPARATOR, TERMINATOR]).unwrap_or_default(),
        });
        self.digits.clear();
        sequence
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.digits.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
