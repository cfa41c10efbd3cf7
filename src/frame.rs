//! Raw frame types shared between the capture, codec, and
//! presentation seams.

use std::borrow::Cow;

use crate::error::SpyglassError;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a raw captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 3 bytes per pixel: Red, Green, Blue. Presentation ordering.
    Rgb8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

// ── RawFrame ─────────────────────────────────────────────────────

/// A raw, uncompressed full-screen frame.
///
/// Rows are tightly packed: `data` holds exactly
/// `width * height * bytes_per_pixel` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Pixel data.
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Build a frame, validating that `data` matches the dimensions.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, SpyglassError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(SpyglassError::ImageCodec(format!(
                "raw frame size mismatch: {} bytes for {}x{} {:?} (expected {})",
                data.len(),
                width,
                height,
                format,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Total byte size of the pixel buffer.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Pixel data normalised to tightly packed RGB rows.
    ///
    /// This is the single place channel-order conversion happens;
    /// everything downstream of the codec sees RGB.
    pub fn rgb_bytes(&self) -> Cow<'_, [u8]> {
        match self.format {
            PixelFormat::Rgb8 => Cow::Borrowed(&self.data),
            PixelFormat::Rgba8 => {
                let mut out = Vec::with_capacity(self.data.len() / 4 * 3);
                for px in self.data.chunks_exact(4) {
                    out.extend_from_slice(&px[..3]);
                }
                Cow::Owned(out)
            }
            PixelFormat::Bgra8 => {
                let mut out = Vec::with_capacity(self.data.len() / 4 * 3);
                for px in self.data.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                }
                Cow::Owned(out)
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
