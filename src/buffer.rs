//! Single-slot latest-frame buffer.
//!
//! Decouples frame arrival cadence from presentation cadence: the
//! receive task stores every payload it completes, the consumer
//! drains at its own rate, and a new arrival overwrites anything the
//! consumer has not yet taken (drop-oldest). Holding at most one
//! undelivered payload bounds memory regardless of how far the
//! consumer falls behind.

use std::sync::Mutex;

use bytes::Bytes;

/// Shared between exactly two tasks: the receive loop writes, the
/// presentation consumer takes-and-clears.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Bytes>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a newly received payload, discarding any undelivered one.
    pub fn store(&self, payload: Bytes) {
        *self.lock() = Some(payload);
    }

    /// Take and clear the buffered payload. Non-blocking; `None`
    /// means nothing new has arrived since the last take.
    pub fn take(&self) -> Option<Bytes> {
        self.lock().take()
    }

    /// Drop any buffered payload (session teardown).
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Bytes>> {
        // A poisoned lock only means a panicking peer task; the slot
        // itself is always a valid Option.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_on_empty_is_none() {
        let buf = LatestFrame::new();
        assert!(buf.take().is_none());
    }

    #[test]
    fn second_arrival_overwrites_first() {
        let buf = LatestFrame::new();
        buf.store(Bytes::from_static(b"first"));
        buf.store(Bytes::from_static(b"second"));

        assert_eq!(buf.take().unwrap(), Bytes::from_static(b"second"));
        assert!(buf.take().is_none());
    }

    #[test]
    fn clear_discards_pending_payload() {
        let buf = LatestFrame::new();
        buf.store(Bytes::from_static(b"pending"));
        buf.clear();
        assert!(buf.take().is_none());
    }
}
