//! Collaborator seams for the platform-specific providers.
//!
//! The engine is platform-agnostic: how a screen is sampled and how
//! an input event is replayed are behind these traits. Production
//! implementations wrap the OS capture and injection APIs; tests use
//! synthetic frames and recording sinks.

use async_trait::async_trait;

use crate::command::InputCommand;
use crate::error::SpyglassError;
use crate::frame::RawFrame;

/// Produces a raw pixel buffer of the full screen on demand.
///
/// Called once per streaming iteration by the host's capture loop.
/// An error is treated as fatal to the active connection — capture
/// failure on a live screen is not expected to be transient.
#[async_trait]
pub trait ScreenSource: Send {
    async fn capture(&mut self) -> Result<RawFrame, SpyglassError>;
}

/// Performs a semantic input event on the platform.
///
/// Injection failures are logged and skipped; a command that cannot
/// be replayed does not end the input channel.
#[async_trait]
pub trait InputSink: Send {
    async fn inject(&mut self, command: InputCommand) -> Result<(), SpyglassError>;
}
