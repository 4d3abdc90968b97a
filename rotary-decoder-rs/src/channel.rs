//! Hand-off of finalized sequences to blocked readers.
//!
//! [`SequenceChannel`] keeps the most recent sequence in an
//! [`embassy_sync::watch::Watch`] slot. Each [`SequenceReader`] remembers
//! which publication it saw last, so:
//!
//! - a reader that starts waiting after a publication it has not seen
//!   returns immediately (no lost wake-up);
//! - every reader waiting on a publication wakes and gets the same
//!   contents (broadcast);
//! - a newer publication replaces an unread one.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::watch::{Receiver, Watch};

use crate::error::ReadError;
use crate::sequence::Sequence;

/// Latest-value broadcast slot for finalized sequences.
///
/// `READERS` bounds the number of live [`SequenceReader`]s.
pub struct SequenceChannel<M: RawMutex, const READERS: usize> {
    watch: Watch<M, Sequence, READERS>,
}

impl<M: RawMutex, const READERS: usize> SequenceChannel<M, READERS> {
    pub const fn new() -> Self {
        Self {
            watch: Watch::new(),
        }
    }

    /// Replace the pending sequence and wake every waiting reader.
    pub fn publish(&self, sequence: Sequence) {
        self.watch.sender().send(sequence);
    }

    /// Register a reader, or `None` if `READERS` are already live.
    pub fn reader(&self) -> Option<SequenceReader<'_, M, READERS>> {
        self.watch.receiver().map(|receiver| SequenceReader {
            channel: self,
            receiver,
        })
    }

    /// The pending sequence, without marking it read for anyone.
    pub fn latest(&self) -> Option<Sequence> {
        self.watch.sender().try_get()
    }
}

impl<M: RawMutex, const READERS: usize> Default for SequenceChannel<M, READERS> {
    fn default() -> Self {
        Self::new()
    }
}

/// A consumer of finalized sequences.
pub struct SequenceReader<'a, M: RawMutex, const READERS: usize> {
    channel: &'a SequenceChannel<M, READERS>,
    receiver: Receiver<'a, M, Sequence, READERS>,
}

impl<M: RawMutex, const READERS: usize> SequenceReader<'_, M, READERS> {
    /// Wait for a sequence this reader has not seen yet.
    pub async fn read(&mut self) -> Sequence {
        self.receiver.changed().await
    }

    /// Wait for an unseen sequence and copy its wire form into `buf`.
    ///
    /// Returns the number of bytes written, separator and terminator
    /// included.
    ///
    /// # Errors
    ///
    /// [`ReadError::Transfer`] if `buf` is too small. The sequence counts
    /// as read either way.
    pub async fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let sequence = self.read().await;
        copy_sequence(&sequence, buf)
    }

    /// Take an unseen sequence if one is pending.
    pub fn try_read(&mut self) -> Option<Sequence> {
        self.receiver.try_changed()
    }

    /// The pending sequence whether or not it was seen before.
    ///
    /// Does not mark it read: a following [`read()`](Self::read) still
    /// returns it if this reader had not seen it. Repeated calls without a
    /// new publication return identical contents.
    pub fn current(&self) -> Option<Sequence> {
        self.channel.latest()
    }
}

/// Copy the wire form of `sequence` into `buf`.
pub fn copy_sequence(sequence: &Sequence, buf: &mut [u8]) -> Result<usize, ReadError> {
    let bytes = sequence.as_bytes();
    let available = buf.len();
    let target = buf.get_mut(..bytes.len()).ok_or(ReadError::Transfer {
        needed: bytes.len(),
        available,
    })?;
    target.copy_from_slice(bytes);
    Ok(bytes.len())
}
