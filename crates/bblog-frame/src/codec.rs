use bytes::{BufMut, BytesMut};

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::error::{FrameError, Result};
use crate::history::DEFAULT_HISTORY_LEN;

/// Largest payload a one-byte length prefix can announce.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Frame decoder sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Packets buffered before [`FrameError::BufferFull`].
    pub buffer_capacity: usize,
    /// Frames kept for diagnostic dumps.
    pub history_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            history_len: DEFAULT_HISTORY_LEN,
        }
    }
}

/// Append one frame (length byte and payload) to `dst`.
///
/// The device side of the wire format, used to build captures and tests.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.is_empty() {
        return Err(FrameError::ZeroLengthFrame);
    }
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    dst.reserve(1 + payload.len());
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_payload_with_length() {
        let mut dst = BytesMut::new();
        encode_frame(b"abc", &mut dst).unwrap();
        encode_frame(&[9], &mut dst).unwrap();
        assert_eq!(dst.as_ref(), b"\x03abc\x01\x09");
    }

    #[test]
    fn rejects_empty_and_oversized_payloads() {
        let mut dst = BytesMut::new();
        assert!(matches!(
            encode_frame(&[], &mut dst),
            Err(FrameError::ZeroLengthFrame)
        ));
        assert!(matches!(
            encode_frame(&[0; 256], &mut dst),
            Err(FrameError::PayloadTooLarge { size: 256, max: 255 })
        ));
        encode_frame(&[0; 255], &mut dst).unwrap();
        assert_eq!(dst.len(), 256);
    }
}
