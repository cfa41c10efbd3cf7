//! Adaptive JPEG quality controller.
//!
//! A bang-bang controller that nudges the quality one step per frame
//! to keep the compressed payload inside a target byte window. Frame
//! cadence already bounds worst-case throughput; this only smooths
//! burstiness from scene complexity. The step and bounds are fixed
//! configuration constants, not tunables.
//!
//! The state is owned exclusively by the host's streaming loop and
//! needs no locking.

/// Lowest quality the controller will ever select.
pub const QUALITY_MIN: u8 = 20;
/// Highest quality the controller will ever select.
pub const QUALITY_MAX: u8 = 90;
/// Adjustment applied per out-of-window frame.
pub const QUALITY_STEP: u8 = 5;
/// Payloads smaller than this invite a quality increase.
pub const TARGET_MIN_BYTES: usize = 50_000;
/// Payloads larger than this force a quality decrease.
pub const TARGET_MAX_BYTES: usize = 150_000;

/// Default quality before the first payload has been observed.
pub const INITIAL_QUALITY: u8 = 70;

// ── QualityController ────────────────────────────────────────────

/// Per-session quality state, mutated once per frame sent.
#[derive(Debug, Clone)]
pub struct QualityController {
    quality: u8,
    last_payload_size: usize,
}

impl QualityController {
    pub fn new() -> Self {
        Self::with_initial(INITIAL_QUALITY)
    }

    /// Start from an explicit quality, clamped into bounds.
    pub fn with_initial(quality: u8) -> Self {
        Self {
            quality: quality.clamp(QUALITY_MIN, QUALITY_MAX),
            last_payload_size: 0,
        }
    }

    /// Quality to use for the next frame.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Size of the most recently recorded payload.
    pub fn last_payload_size(&self) -> usize {
        self.last_payload_size
    }

    /// Record the payload size of the frame just encoded and adjust
    /// quality for the next one.
    pub fn record(&mut self, payload_size: usize) {
        self.last_payload_size = payload_size;

        if payload_size > TARGET_MAX_BYTES {
            self.quality = self.quality.saturating_sub(QUALITY_STEP).max(QUALITY_MIN);
        } else if payload_size < TARGET_MIN_BYTES && self.quality < QUALITY_MAX {
            self.quality = (self.quality + QUALITY_STEP).min(QUALITY_MAX);
        }
    }
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
