//! Domain-specific error types for the spyglass engine.
//!
//! All fallible operations return `Result<T, SpyglassError>`.
//! No panics on invalid input — every error is typed, and the session
//! loops decide per variant whether the offending unit is dropped or
//! the connection is torn down.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the spyglass engine.
#[derive(Debug, Error)]
pub enum SpyglassError {
    // ── Connection Errors ────────────────────────────────────────
    /// The peer actively refused the TCP connection.
    #[error("connection refused by {0}")]
    ConnectionRefused(String),

    /// The connection attempt did not complete within the deadline.
    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// The server address could not be resolved to a socket address.
    #[error("could not resolve address {0}")]
    AddressResolution(String),

    /// The peer closed the connection (EOF mid-message or on an idle
    /// channel).
    #[error("peer closed the connection")]
    ConnectionClosed,

    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    // ── Resource Errors ──────────────────────────────────────────
    /// The listening socket could not be bound (port in use, no
    /// permission). Fatal to starting the host session.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    // ── Framing Errors ───────────────────────────────────────────
    /// A video frame length prefix exceeded the sanity limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u64, max: u64 },

    /// An input record length prefix exceeded the sanity limit.
    #[error("input record too large: {size} bytes (max {max})")]
    CommandTooLarge { size: u64, max: u64 },

    // ── Malformed-Data Errors (recoverable) ──────────────────────
    /// An input record failed the grammar: unknown type, wrong field
    /// count, or a non-integer coordinate. The command is dropped and
    /// the input channel continues.
    #[error("malformed input command: {0}")]
    MalformedCommand(String),

    /// A frame payload failed decompression or image decode. The
    /// frame is dropped and the video channel continues.
    #[error("corrupt frame payload: {0}")]
    CorruptFrame(String),

    // ── Codec Errors ─────────────────────────────────────────────
    /// The image codec rejected a raw frame on the encode path.
    #[error("image codec error: {0}")]
    ImageCodec(String),

    /// Lossless compression of an encoded frame failed.
    #[error("compression error: {0}")]
    Compression(String),

    // ── Session Errors ───────────────────────────────────────────
    /// A session phase transition was requested from the wrong state.
    #[error("invalid session phase transition: {0}")]
    PhaseViolation(&'static str),

    /// A spawned session task could not be joined.
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SpyglassError {
    /// Whether the error is recovered locally by dropping the
    /// offending unit (one command, one frame) rather than ending
    /// the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpyglassError::MalformedCommand(_) | SpyglassError::CorruptFrame(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = SpyglassError::FrameTooLarge {
            size: 1_000_000,
            max: 500,
        };
        assert!(e.to_string().contains("1000000"));
        assert!(e.to_string().contains("500"));

        let e = SpyglassError::ConnectionRefused("10.0.0.1:9999".into());
        assert!(e.to_string().contains("10.0.0.1:9999"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: SpyglassError = io_err.into();
        assert!(matches!(e, SpyglassError::Connection(_)));
        assert!(!e.is_recoverable());
    }

    #[test]
    fn recoverable_classification() {
        assert!(SpyglassError::MalformedCommand("MOUSE_MOVE|abc".into()).is_recoverable());
        assert!(SpyglassError::CorruptFrame("truncated".into()).is_recoverable());
        assert!(!SpyglassError::ConnectionClosed.is_recoverable());
    }
}
