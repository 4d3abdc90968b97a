//! Ordered acquisition and release of platform bindings.
//!
//! The decoder depends on collaborators it does not own: the input line,
//! the edge subscription, the device that hands sequences to readers.
//! Each one is a [`Binding`]. [`bring_up()`] acquires them in order and,
//! on the first failure, releases the ones already held in reverse order
//! so nothing is left half-registered.

use crate::error::{BindError, StartupError};

/// A platform resource acquired at startup and released at shutdown.
pub trait Binding {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Acquire the resource.
    fn acquire(&mut self) -> Result<(), BindError>;

    /// Release the resource. Only called after a successful
    /// [`acquire()`](Self::acquire).
    fn release(&mut self);
}

/// Acquire every binding in order.
///
/// # Errors
///
/// Returns [`StartupError`] naming the first binding that failed, after
/// releasing every binding acquired before it, last first.
pub fn bring_up(bindings: &mut [&mut dyn Binding]) -> Result<(), StartupError> {
    for idx in 0..bindings.len() {
        if let Err(cause) = bindings[idx].acquire() {
            let binding = bindings[idx].name();
            #[cfg(feature = "defmt")]
            defmt::error!("Failed to acquire {=str}: {}", binding, cause);

            for acquired in bindings[..idx].iter_mut().rev() {
                acquired.release();
            }
            return Err(StartupError { binding, cause });
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Acquired {=str}", bindings[idx].name());
    }
    Ok(())
}

/// Release every binding, last acquired first.
pub fn tear_down(bindings: &mut [&mut dyn Binding]) {
    for binding in bindings.iter_mut().rev() {
        binding.release();
        #[cfg(feature = "defmt")]
        defmt::debug!("Released {=str}", binding.name());
    }
}
