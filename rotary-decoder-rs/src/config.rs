//! Timing and length configuration for the decoder.
//!
//! All tunables live in [`DecoderConfig`]. The defaults reproduce the
//! reference dial timing (70 ms debounce, 500 ms digit gap, 3 s sequence
//! gap, 20 digit sequences).

/// Minimum spacing between two accepted edges.
pub const DEBOUNCE_WINDOW_MS: u64 = 70;

/// Quiet period after the last pulse that completes a digit.
pub const DIGIT_TIMEOUT_MS: u64 = 500;

/// Quiet period after the last digit that completes a sequence.
pub const SEQUENCE_TIMEOUT_MS: u64 = 3_000;

/// Default maximum number of digits in one sequence.
pub const DEFAULT_MAX_NUMBER_LEN: usize = 20;

/// Hard ceiling on the configured sequence length.
pub const MAX_NUMBER_LEN_CEILING: usize = 60;

/// Largest terminated sequence on the wire: digits plus `'\n'` and `'\0'`.
pub const SEQUENCE_WIRE_CAPACITY: usize = MAX_NUMBER_LEN_CEILING + 2;

/// Decoder configuration.
///
/// Build one from [`Default`] and adjust fields, or go through
/// [`with_max_number_len()`](Self::with_max_number_len) /
/// [`from_param()`](Self::from_param) when the length comes from an
/// untrusted integer parameter. [`Decoder::new()`](crate::Decoder::new)
/// normalises whatever it is given, so out-of-range lengths never reach
/// the sequence buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderConfig {
    /// Edges closer than this to the last accepted edge are dropped. Default: 70.
    pub debounce_window_ms: u64,
    /// Digit completes after this long without a pulse. Default: 500.
    pub digit_timeout_ms: u64,
    /// Sequence completes after this long without a digit. Default: 3000.
    pub sequence_timeout_ms: u64,
    /// Digits per sequence before a forced finalize. Default: 20, max: 60.
    pub max_number_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: DEBOUNCE_WINDOW_MS,
            digit_timeout_ms: DIGIT_TIMEOUT_MS,
            sequence_timeout_ms: SEQUENCE_TIMEOUT_MS,
            max_number_len: DEFAULT_MAX_NUMBER_LEN,
        }
    }
}

impl DecoderConfig {
    /// Apply a signed length parameter, clamping it into `1..=60`.
    ///
    /// Values above [`MAX_NUMBER_LEN_CEILING`] are clamped to the ceiling
    /// and values below 1 are raised to 1. Both emit a diagnostic.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotary_decoder::DecoderConfig;
    ///
    /// let config = DecoderConfig::default().with_max_number_len(100);
    /// assert_eq!(config.max_number_len, 60);
    /// ```
    pub fn with_max_number_len(mut self, len: i32) -> Self {
        self.max_number_len = clamp_len(i64::from(len));
        self
    }

    /// Parse a textual length parameter (e.g. from the build environment).
    ///
    /// Falls back to [`DEFAULT_MAX_NUMBER_LEN`] when the text is not an
    /// integer.
    pub fn from_param(param: &str) -> Self {
        match param.trim().parse::<i32>() {
            Ok(len) => Self::default().with_max_number_len(len),
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "max_number_len parameter {=str} is not an integer, using {}",
                    param,
                    DEFAULT_MAX_NUMBER_LEN
                );
                Self::default()
            }
        }
    }

    /// Return a copy whose length is guaranteed to be within `1..=60`.
    pub fn normalized(self) -> Self {
        Self {
            max_number_len: clamp_len(self.max_number_len as i64),
            ..self
        }
    }
}

fn clamp_len(len: i64) -> usize {
    if len > MAX_NUMBER_LEN_CEILING as i64 {
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "max_number_len {} greater than {}, clamped",
            len,
            MAX_NUMBER_LEN_CEILING
        );
        MAX_NUMBER_LEN_CEILING
    } else if len < 1 {
        #[cfg(feature = "defmt")]
        defmt::warn!("max_number_len {} below 1, clamped", len);
        1
    } else {
        len as usize
    }
}
