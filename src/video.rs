//! Video channel codec: raw frame ⇄ compressed wire payload.
//!
//! The wire payload is `zstd(jpeg(frame, quality))`. The JPEG stage
//! is lossy and driven by the adaptive quality controller; the zstd
//! stage is lossless and shaves the remaining redundancy. Channel
//! order is normalised to RGB on the encode path, so decoded frames
//! always come back in presentation ordering regardless of what the
//! capture provider produced.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};

use crate::error::SpyglassError;
use crate::frame::{PixelFormat, RawFrame};

// ── FrameEncoder ─────────────────────────────────────────────────

/// Host-side frame encoder. Tracks the size of the last payload it
/// produced, which the quality controller consumes once per frame.
#[derive(Debug)]
pub struct FrameEncoder {
    compression_level: i32,
    last_payload_len: usize,
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self {
            compression_level: zstd::DEFAULT_COMPRESSION_LEVEL,
            last_payload_len: 0,
        }
    }

    /// Encode a raw frame at the given JPEG quality.
    pub fn encode(&mut self, frame: &RawFrame, quality: u8) -> Result<Bytes, SpyglassError> {
        let rgb = frame.rgb_bytes();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|e| SpyglassError::ImageCodec(e.to_string()))?;

        let payload = zstd::encode_all(jpeg.as_slice(), self.compression_level)
            .map_err(|e| SpyglassError::Compression(e.to_string()))?;

        self.last_payload_len = payload.len();
        Ok(Bytes::from(payload))
    }

    /// Byte size of the most recently encoded payload.
    pub fn last_payload_len(&self) -> usize {
        self.last_payload_len
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

// ── FrameDecoder ─────────────────────────────────────────────────

/// Viewer-side frame decoder.
///
/// Corrupt or truncated payloads yield a recoverable
/// [`SpyglassError::CorruptFrame`]; the caller drops the frame and
/// keeps consuming.
#[derive(Debug, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decompress and decode a wire payload back into a raw RGB frame.
    pub fn decode(&self, payload: &[u8]) -> Result<RawFrame, SpyglassError> {
        let jpeg = zstd::decode_all(payload)
            .map_err(|e| SpyglassError::CorruptFrame(format!("decompress: {e}")))?;

        let img = image::load(Cursor::new(jpeg), ImageFormat::Jpeg)
            .map_err(|e| SpyglassError::CorruptFrame(format!("jpeg decode: {e}")))?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        RawFrame::new(width, height, PixelFormat::Rgb8, rgb.into_raw())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> RawFrame {
        let data = pixel.repeat(width as usize * height as usize);
        RawFrame::new(width, height, format, data).unwrap()
    }

    #[test]
    fn dimensions_survive_round_trip_across_qualities() {
        let frame = solid_frame(64, 48, PixelFormat::Rgb8, &[120, 80, 40]);
        let mut encoder = FrameEncoder::new();
        let decoder = FrameDecoder::new();

        for quality in [20u8, 55, 90] {
            let payload = encoder.encode(&frame, quality).unwrap();
            assert_eq!(encoder.last_payload_len(), payload.len());

            let decoded = decoder.decode(&payload).unwrap();
            assert_eq!(decoded.width, 64);
            assert_eq!(decoded.height, 48);
            assert_eq!(decoded.format, PixelFormat::Rgb8);
        }
    }

    #[test]
    fn bgra_capture_comes_back_as_rgb() {
        // Solid red in BGRA ordering.
        let frame = solid_frame(32, 32, PixelFormat::Bgra8, &[0, 0, 255, 255]);
        let mut encoder = FrameEncoder::new();
        let payload = encoder.encode(&frame, 90).unwrap();

        let decoded = FrameDecoder::new().decode(&payload).unwrap();
        // JPEG is lossy; check the dominant channel, not exact bytes.
        let px = &decoded.data[..3];
        assert!(px[0] > 200, "red channel weak: {px:?}");
        assert!(px[1] < 80 && px[2] < 80, "bleed into green/blue: {px:?}");
    }

    #[test]
    fn corrupt_payload_is_recoverable() {
        let err = FrameDecoder::new().decode(b"not a frame").unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn truncated_payload_is_recoverable() {
        let frame = solid_frame(16, 16, PixelFormat::Rgb8, &[1, 2, 3]);
        let payload = FrameEncoder::new().encode(&frame, 70).unwrap();

        let err = FrameDecoder::new()
            .decode(&payload[..payload.len() / 2])
            .unwrap_err();
        assert!(matches!(err, SpyglassError::CorruptFrame(_)));
    }
}
