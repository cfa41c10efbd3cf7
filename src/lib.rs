//! # spyglass
//!
//! Streaming-and-control engine for exposing one host's screen to a
//! single remote viewer over raw TCP, with remote input relayed back.
//!
//! One connection carries two independent logical channels: video
//! frames host→viewer behind a u64 length prefix, and input command
//! records viewer→host behind a u32 prefix. Capture, network I/O,
//! and presentation run as separate tasks decoupled by a single-slot
//! latest-frame buffer, and an adaptive bang-bang controller keeps
//! per-frame payload size inside a target window.
//!
//! This crate contains:
//! - **Transport**: `VideoFrameCodec` / `InputWireCodec` for framed
//!   TCP I/O via `tokio_util`
//! - **Commands**: `InputCommand` — typed input records and their
//!   text wire grammar
//! - **Video codec**: `FrameEncoder` / `FrameDecoder` (JPEG + zstd)
//! - **Quality**: `QualityController` bang-bang payload-size control
//! - **Sessions**: `Host` (accept/stream/input loops) and
//!   `ViewerSession` (receive/consume/send-input)
//! - **State**: `SessionState` shared flags, `SessionPhase` lifecycle
//! - **Events**: `SessionEvent` notifications on a bounded channel
//! - **Error**: `SpyglassError` — typed, `thiserror`-based hierarchy
//!
//! Screen capture, input injection, and presentation are external
//! collaborators behind the `provider` traits and the
//! `consume`/`SurfaceMapping` surface.

pub mod buffer;
pub mod command;
pub mod error;
pub mod event;
pub mod frame;
pub mod host;
pub mod mapping;
pub mod provider;
pub mod quality;
pub mod state;
pub mod transport;
pub mod video;
pub mod viewer;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use buffer::LatestFrame;
pub use command::{InputCommand, MouseButton};
pub use error::SpyglassError;
pub use event::{EventSender, SessionEvent, Severity, event_channel};
pub use frame::{PixelFormat, RawFrame};
pub use host::{Host, HostConfig};
pub use mapping::SurfaceMapping;
pub use provider::{InputSink, ScreenSource};
pub use quality::QualityController;
pub use state::{SessionPhase, SessionState};
pub use transport::{InputWireCodec, VideoFrameCodec};
pub use video::{FrameDecoder, FrameEncoder};
pub use viewer::{ViewerConfig, ViewerSession};
