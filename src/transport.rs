//! Length-prefixed framing for the two logical channels.
//!
//! One TCP connection carries two independent message streams, one
//! per direction:
//!
//! - **Video channel** (host → viewer): `[u64 size BE][payload]`.
//! - **Input channel** (viewer → host): `[u32 len BE][UTF-8 record]`.
//!   Commands are tiny compared to frames, so the input channel uses
//!   the smaller prefix.
//!
//! Both are implemented as `tokio_util` codecs; each direction is
//! owned by exactly one `FramedRead`/`FramedWrite` over one half of
//! the split stream, which gives the single-writer-per-direction
//! guarantee the framing contract requires. A peer close in the
//! middle of a message surfaces from the framed stream as a
//! connection error, never as a zero-length success.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::InputCommand;
use crate::error::SpyglassError;

// ── Constants ────────────────────────────────────────────────────

/// Sanity cap on a video frame payload. A length prefix beyond this
/// means a desynchronised or hostile peer, and fails the connection.
pub const MAX_FRAME_PAYLOAD: u64 = 64 * 1024 * 1024;

/// Sanity cap on an input record.
pub const MAX_COMMAND_PAYLOAD: u64 = 4 * 1024;

const VIDEO_PREFIX_LEN: usize = 8;
const INPUT_PREFIX_LEN: usize = 4;

// ── VideoFrameCodec ──────────────────────────────────────────────

/// Codec for the video channel: opaque compressed frame payloads
/// behind a u64 big-endian length prefix.
#[derive(Debug, Default)]
pub struct VideoFrameCodec;

impl Decoder for VideoFrameCodec {
    type Item = Bytes;
    type Error = SpyglassError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, SpyglassError> {
        if src.len() < VIDEO_PREFIX_LEN {
            return Ok(None);
        }

        let mut prefix = [0u8; VIDEO_PREFIX_LEN];
        prefix.copy_from_slice(&src[..VIDEO_PREFIX_LEN]);
        let size = u64::from_be_bytes(prefix);
        if size > MAX_FRAME_PAYLOAD {
            return Err(SpyglassError::FrameTooLarge {
                size,
                max: MAX_FRAME_PAYLOAD,
            });
        }

        let size = size as usize;
        if src.len() < VIDEO_PREFIX_LEN + size {
            src.reserve(VIDEO_PREFIX_LEN + size - src.len());
            return Ok(None);
        }

        src.advance(VIDEO_PREFIX_LEN);
        Ok(Some(src.split_to(size).freeze()))
    }
}

impl Encoder<Bytes> for VideoFrameCodec {
    type Error = SpyglassError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), SpyglassError> {
        dst.reserve(VIDEO_PREFIX_LEN + payload.len());
        dst.extend_from_slice(&(payload.len() as u64).to_be_bytes());
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

// ── InputWireCodec ───────────────────────────────────────────────

/// Codec for the input channel: UTF-8 command records behind a u32
/// big-endian length prefix.
///
/// Decoding yields the raw record bytes; parsing into a typed
/// [`InputCommand`] happens immediately at the session boundary so a
/// malformed record can be dropped without failing the framed stream.
#[derive(Debug, Default)]
pub struct InputWireCodec;

impl Decoder for InputWireCodec {
    type Item = Bytes;
    type Error = SpyglassError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, SpyglassError> {
        if src.len() < INPUT_PREFIX_LEN {
            return Ok(None);
        }

        let mut prefix = [0u8; INPUT_PREFIX_LEN];
        prefix.copy_from_slice(&src[..INPUT_PREFIX_LEN]);
        let len = u32::from_be_bytes(prefix) as u64;
        if len > MAX_COMMAND_PAYLOAD {
            return Err(SpyglassError::CommandTooLarge {
                size: len,
                max: MAX_COMMAND_PAYLOAD,
            });
        }

        let len = len as usize;
        if src.len() < INPUT_PREFIX_LEN + len {
            src.reserve(INPUT_PREFIX_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(INPUT_PREFIX_LEN);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl Encoder<InputCommand> for InputWireCodec {
    type Error = SpyglassError;

    fn encode(&mut self, command: InputCommand, dst: &mut BytesMut) -> Result<(), SpyglassError> {
        let record = command.encode();
        dst.reserve(INPUT_PREFIX_LEN + record.len());
        dst.extend_from_slice(&(record.len() as u32).to_be_bytes());
        dst.extend_from_slice(record.as_bytes());
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MouseButton;

    #[test]
    fn video_frame_round_trip() {
        let mut codec = VideoFrameCodec;
        let mut buf = BytesMut::new();
        let payload = Bytes::from(vec![0xAB; 5000]);

        codec.encode(payload.clone(), &mut buf).unwrap();
        assert_eq!(buf.len(), 8 + 5000);
        assert_eq!(&buf[..8], &5000u64.to_be_bytes());

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn video_partial_prefix_waits() {
        let mut codec = VideoFrameCodec;
        let mut buf = BytesMut::from(&[0u8, 0, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn video_partial_payload_waits() {
        let mut codec = VideoFrameCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&100u64.to_be_bytes());
        buf.extend_from_slice(&[0u8; 50]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[0u8; 50]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.len(), 100);
    }

    #[test]
    fn video_absurd_length_fails() {
        let mut codec = VideoFrameCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&(MAX_FRAME_PAYLOAD + 1).to_be_bytes());
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, SpyglassError::FrameTooLarge { .. }));
    }

    #[test]
    fn video_eof_mid_message_is_an_error() {
        let mut codec = VideoFrameCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&100u64.to_be_bytes());
        buf.extend_from_slice(&[0u8; 10]);
        // decode_eof models the peer closing with a partial message
        // still buffered.
        assert!(codec.decode_eof(&mut buf).is_err());
    }

    #[test]
    fn input_record_round_trip() {
        let mut codec = InputWireCodec;
        let mut buf = BytesMut::new();
        let cmd = InputCommand::MouseClick {
            button: MouseButton::Left,
            x: 100,
            y: 200,
        };

        codec.encode(cmd, &mut buf).unwrap();
        assert_eq!(&buf[..4], &24u32.to_be_bytes());

        let record = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&record[..], b"MOUSE_CLICK|left|100|200");
    }

    #[test]
    fn input_record_prefix_matches_body() {
        let mut codec = InputWireCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(InputCommand::MouseMove { x: 1, y: 2 }, &mut buf)
            .unwrap();
        let len = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
        assert_eq!(len, buf.len() - 4);
    }

    #[test]
    fn input_absurd_length_fails() {
        let mut codec = InputWireCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&u32::MAX.to_be_bytes());
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, SpyglassError::CommandTooLarge { .. }));
    }

    #[test]
    fn back_to_back_records_decode_individually() {
        let mut codec = InputWireCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(InputCommand::KeyDown { key: "a".into() }, &mut buf)
            .unwrap();
        codec
            .encode(InputCommand::KeyUp { key: "a".into() }, &mut buf)
            .unwrap();

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"KEY_DOWN|a");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"KEY_UP|a");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
