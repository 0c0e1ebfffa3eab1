//! Device queue feedback tracking
//!
//! The playback device periodically reports how many frames it has
//! buffered. The tracker holds the last-reported count, which the façade
//! bumps speculatively after each accepted send until the next report
//! overwrites it.

use crate::error::TransportError;

/// Last-known buffered-frame count of the remote device
#[derive(Debug, Default)]
pub struct QueueTracker {
    depth: u32,
}

impl QueueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking snapshot of the current depth
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Apply an inbound feedback payload (ASCII decimal frame count)
    ///
    /// Reports are authoritative and may move the depth in either
    /// direction. A malformed payload leaves the depth unchanged.
    pub fn record(&mut self, payload: &[u8]) -> Result<u32, TransportError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| TransportError::InvalidFeedback(e.to_string()))?;
        let depth: u32 = text
            .trim()
            .parse()
            .map_err(|_| TransportError::InvalidFeedback(format!("{text:?}")))?;
        self.depth = depth;
        Ok(depth)
    }

    /// Speculatively count one sent frame as buffered
    pub fn bump(&mut self) {
        self.depth = self.depth.saturating_add(1);
    }
}
