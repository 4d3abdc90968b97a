//! Error types for the rotary decoder.

use core::fmt;

/// A finalized sequence could not be delivered to the reader.
///
/// Delivery failures never touch decoder state: the sequence stays
/// published and is not queued again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// The caller's buffer cannot hold the terminated sequence.
    Transfer {
        /// Bytes in the terminated sequence.
        needed: usize,
        /// Bytes the caller offered.
        available: usize,
    },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadError::Transfer { needed, available } => write!(
                f,
                "Transfer error: sequence needs {} bytes, buffer holds {}",
                needed, available
            ),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ReadError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ReadError::Transfer { needed, available } => {
                defmt::write!(f, "Transfer error: need {} bytes, have {}", needed, available)
            }
        }
    }
}

/// Why a platform binding could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BindError {
    /// The resource is held elsewhere.
    Busy,
    /// The hardware behind the resource did not respond as expected.
    NotDetected,
    /// The platform refused the registration.
    Rejected,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BindError::Busy => write!(f, "resource busy"),
            BindError::NotDetected => write!(f, "hardware not detected"),
            BindError::Rejected => write!(f, "registration rejected"),
        }
    }
}

/// Bring-up failed; everything acquired before the failure was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupError {
    /// Name of the binding that failed.
    pub binding: &'static str,
    pub cause: BindError,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Startup failed at {}: {}", self.binding, self.cause)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StartupError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Startup failed at {=str}: {}", self.binding, self.cause)
    }
}
