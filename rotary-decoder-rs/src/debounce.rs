//! Time-window edge debouncing.

/// Drops edges that arrive too soon after the last accepted one.
///
/// The watermark only moves forward: an edge stamped earlier than the
/// last accepted edge is rejected too.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDebouncer {
    window_ms: u64,
    last_accepted: Option<u64>,
}

impl EdgeDebouncer {
    /// Create a debouncer with no accepted edge yet.
    pub const fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_accepted: None,
        }
    }

    /// Accept or reject an edge stamped `timestamp` (ms).
    ///
    /// Returns `true` and moves the watermark when the edge is at least
    /// one window after the previous accepted edge. Constant time.
    pub fn accept(&mut self, timestamp: u64) -> bool {
        if let Some(last) = self.last_accepted {
            if timestamp < last || timestamp - last < self.window_ms {
                return false;
            }
        }
        self.last_accepted = Some(timestamp);
        true
    }

    /// Timestamp of the last accepted edge.
    pub fn last_accepted(&self) -> Option<u64> {
        self.last_accepted
    }
}
