//! Session state shared across tasks.
//!
//! Two pieces replace the ad hoc booleans the loops would otherwise
//! scatter around:
//!
//! - [`SessionState`] — the running/streaming flags shared between a
//!   session's tasks, transitioned only through its methods and
//!   inspected at loop-iteration boundaries. A [`Notify`] rider wakes
//!   any task parked in a `select!` so stopping is observable within
//!   a bounded time even while a read is pending.
//! - [`SessionPhase`] — the viewer-side lifecycle value object with
//!   validated transitions that return `Result` instead of panicking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::Notify;

use crate::error::SpyglassError;

// ── SessionState ─────────────────────────────────────────────────

/// Shared flags for one session's tasks.
#[derive(Debug, Default)]
pub struct SessionState {
    running: AtomicBool,
    streaming: AtomicBool,
    stop_requested: AtomicBool,
    notify: Notify,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session as running (host listener up / viewer
    /// connected). A no-op once [`stop`](Self::stop) has been
    /// requested: stopping a state is permanent, so a handle stopped
    /// before its session starts stays stopped.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        if self.stop_requested.load(Ordering::SeqCst) {
            self.running.store(false, Ordering::SeqCst);
        }
    }

    /// Mark an active peer connection as streaming.
    pub fn start_streaming(&self) {
        self.streaming.store(true, Ordering::SeqCst);
    }

    /// End the active connection's streaming without stopping the
    /// session (host returns to accepting).
    pub fn stop_streaming(&self) {
        self.streaming.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Stop the whole session. Wakes every parked task. Permanent:
    /// a later [`start`](Self::start) on the same state is a no-op.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.streaming.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Resolves once the session stops running. Select against a
    /// pending read to make cancellation observable.
    pub async fn stopped(&self) {
        loop {
            // Register before checking so a concurrent stop() cannot
            // slip between the check and the await.
            let notified = self.notify.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    /// Resolves once streaming (or the whole session) stops.
    pub async fn stream_stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_streaming() || !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

// ── SessionPhase ─────────────────────────────────────────────────

/// Lifecycle phase of a viewer session.
///
/// ```text
///  Disconnected ──► Connecting ──► Connected
///       ▲               │              │
///       └──── Disconnecting ◄──────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No active connection. Initial / terminal state.
    #[default]
    Disconnected,

    /// TCP connection initiated but not yet established.
    Connecting,

    /// Connection established; frames and input flowing.
    Connected {
        /// When the connection entered the `Connected` state.
        since: Instant,
    },

    /// Teardown in progress.
    Disconnecting,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected { .. } => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

impl SessionPhase {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// How long the session has been connected, `None` in any other
    /// phase.
    pub fn connected_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Connected { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), SpyglassError> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(SpyglassError::PhaseViolation(
                "cannot connect: not in Disconnected state",
            )),
        }
    }

    /// Valid from: `Connecting`.
    pub fn complete_connect(&mut self) -> Result<(), SpyglassError> {
        match self {
            Self::Connecting => {
                *self = Self::Connected {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(SpyglassError::PhaseViolation(
                "cannot complete connect: not in Connecting state",
            )),
        }
    }

    /// Valid from: `Connecting` (failure), `Connected`.
    pub fn begin_disconnect(&mut self) -> Result<(), SpyglassError> {
        match self {
            Self::Connecting | Self::Connected { .. } => {
                *self = Self::Disconnecting;
                Ok(())
            }
            _ => Err(SpyglassError::PhaseViolation(
                "cannot disconnect: not in Connecting or Connected state",
            )),
        }
    }

    /// Valid from: `Disconnecting`, `Connecting` (failed attempt).
    pub fn finish_disconnect(&mut self) -> Result<(), SpyglassError> {
        match self {
            Self::Disconnecting | Self::Connecting => {
                *self = Self::Disconnected;
                Ok(())
            }
            _ => Err(SpyglassError::PhaseViolation(
                "cannot finish disconnect: not in a disconnectable state",
            )),
        }
    }

    /// Force-reset to `Disconnected` regardless of current state.
    /// For unrecoverable I/O failures mid-stream.
    pub fn force_disconnect(&mut self) {
        *self = Self::Disconnected;
    }
}

// ── Tests ────────────────────────────────────────────────────────
