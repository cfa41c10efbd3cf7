//! Structured session events.
//!
//! Worker tasks never touch presentation state directly; every
//! user-visible transition (listening, connected, error,
//! disconnected) is emitted as a [`SessionEvent`] on a bounded
//! channel the embedding layer drains at its own pace.

use std::net::SocketAddr;

use tokio::sync::mpsc;

/// Depth of the event queue. Overflow drops the event rather than
/// stalling a session loop.
pub const EVENT_QUEUE_DEPTH: usize = 64;

// ── Severity ─────────────────────────────────────────────────────

/// Presentation severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

// ── SessionEvent ─────────────────────────────────────────────────

/// A state transition or diagnostic from a session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host is bound and waiting for a peer.
    Listening { addr: SocketAddr },
    /// Host accepted a peer; streaming begins.
    PeerConnected { addr: SocketAddr },
    /// The active peer connection ended; host returns to accepting.
    PeerDisconnected,
    /// Host listener shut down.
    Stopped,

    /// Viewer is attempting a connection.
    Connecting { addr: String },
    /// Viewer connection established.
    Connected { addr: SocketAddr },
    /// Viewer session fully torn down.
    Disconnected,

    /// A streaming loop ended on an error.
    StreamEnded { reason: String },
    /// An input record was dropped without ending the channel.
    MalformedCommand { detail: String },
    /// A frame payload was dropped without ending the channel.
    FrameDropped { detail: String },
    /// A session-level failure.
    SessionError { detail: String },
}

impl SessionEvent {
    pub fn severity(&self) -> Severity {
        match self {
            SessionEvent::Listening { .. }
            | SessionEvent::PeerDisconnected
            | SessionEvent::Stopped
            | SessionEvent::Connecting { .. }
            | SessionEvent::Disconnected => Severity::Info,

            SessionEvent::PeerConnected { .. } | SessionEvent::Connected { .. } => {
                Severity::Success
            }

            SessionEvent::StreamEnded { .. }
            | SessionEvent::MalformedCommand { .. }
            | SessionEvent::FrameDropped { .. }
            | SessionEvent::SessionError { .. } => Severity::Error,
        }
    }
}

// ── EventSender ──────────────────────────────────────────────────

/// Create a bounded event channel for one session.
pub fn event_channel() -> (EventSender, mpsc::Receiver<SessionEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    (EventSender { tx }, rx)
}

/// Cloneable emitting half handed to each session task.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<SessionEvent>,
}

impl EventSender {
    /// Emit an event. Never blocks: a full queue or dropped receiver
    /// loses the event, which is acceptable for diagnostics.
    pub fn emit(&self, event: SessionEvent) {
        match event.severity() {
            Severity::Error => tracing::warn!(?event, "session event"),
            _ => tracing::debug!(?event, "session event"),
        }
        let _ = self.tx.try_send(event);
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_mapping() {
        assert_eq!(SessionEvent::PeerDisconnected.severity(), Severity::Info);
        assert_eq!(
            SessionEvent::Connected {
                addr: "127.0.0.1:9999".parse().unwrap()
            }
            .severity(),
            Severity::Success
        );
        assert_eq!(
            SessionEvent::MalformedCommand {
                detail: "bad".into()
            }
            .severity(),
            Severity::Error
        );
    }

    #[tokio::test]
    async fn emit_delivers_in_order() {
        let (tx, mut rx) = event_channel();
        tx.emit(SessionEvent::Stopped);
        tx.emit(SessionEvent::Disconnected);

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Stopped);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Disconnected);
    }

    #[tokio::test]
    async fn overflow_drops_instead_of_blocking() {
        let (tx, mut rx) = event_channel();
        for _ in 0..EVENT_QUEUE_DEPTH + 10 {
            tx.emit(SessionEvent::Stopped);
        }
        // The first EVENT_QUEUE_DEPTH made it; the rest were dropped.
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, EVENT_QUEUE_DEPTH);
    }

    #[tokio::test]
    async fn emit_survives_dropped_receiver() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.emit(SessionEvent::Stopped);
    }
}
