pub use crate::frame_shared::*;

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                           Frame Encoder
// —————————————————————————————————————————————————————————————————————————————————————————————————

use bytes::{BufMut, Bytes, BytesMut};

use crate::crc16::checksum;
use crate::error::{FrameError, Result};
use crate::field_selector::{FieldSelector, Sample};
use crate::scalar::{decode_u16_be, encode_u16_be};

/// A fully assembled frame, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Wire size, `payload_len() + FRAME_OVERHEAD`.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn payload_len(&self) -> usize {
        self.bytes[MARKER_LEN] as usize
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..HEADER_LEN + self.payload_len()]
    }

    /// Checksum field as carried on the wire.
    pub fn checksum(&self) -> u16 {
        let at = HEADER_LEN + self.payload_len();
        decode_u16_be([self.bytes[at], self.bytes[at + 1]])
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Wraps `payload` as `[':'][len][payload][crc hi][crc lo]['\n']`.
///
/// Payloads longer than [`MAX_PAYLOAD_LEN`] are rejected, the length byte is never truncated.
pub fn build_frame(payload: &[u8]) -> Result<Frame> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max:  MAX_PAYLOAD_LEN,
        });
    }

    Ok(assemble(payload))
}

/// Caller guarantees `payload.len() <= MAX_PAYLOAD_LEN`.
pub(crate) fn assemble(payload: &[u8]) -> Frame {
    debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);

    let mut bytes = BytesMut::with_capacity(FRAME_OVERHEAD + payload.len());
    bytes.put_u8(MARKER);
    bytes.put_u8(payload.len() as u8);
    bytes.put_slice(payload);
    bytes.put_slice(&encode_u16_be(checksum(payload)));
    bytes.put_u8(TERMINATOR);

    Frame {
        bytes: bytes.freeze(),
    }
}

// —————————————————————————————————————————— Sample Frames ————————————————————————————————————————

/// Turns samples into telemetry frames for a fixed field selection.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    selector: FieldSelector,
}

impl FrameEncoder {
    /// Fails if the selection can never fit in a frame.
    pub fn new(selector: FieldSelector) -> Result<Self> {
        if selector.payload_len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLarge {
                size: selector.payload_len(),
                max:  MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self { selector })
    }

    pub fn selector(&self) -> &FieldSelector {
        &self.selector
    }

    /// Wire size of every telemetry frame this encoder produces.
    pub fn frame_len(&self) -> usize {
        FRAME_OVERHEAD + self.selector.payload_len()
    }

    #[inline]
    pub fn encode_sample(&self, sample: &Sample) -> Frame {
        assemble(&self.selector.encode(sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_selector::FieldConfig;

    #[test]
    fn frame_shape() {
        for len in [0usize, 1, 2, 17, 128, 255] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let frame = build_frame(&payload).unwrap();
            let bytes = frame.as_bytes();

            assert_eq!(bytes.len(), len + 5);
            assert_eq!(bytes[0], 0x3A);
            assert_eq!(bytes[1] as usize, len);
            assert_eq!(&bytes[2..2 + len], &payload[..]);
            assert_eq!(bytes[bytes.len() - 1], 0x0A);
        }
    }

    #[test]
    fn checksum_follows_payload_high_byte_first() {
        let payload = b"123456789";
        let frame = build_frame(payload).unwrap();
        let n = payload.len();

        assert_eq!(&frame.as_bytes()[2 + n..4 + n], &[0x89, 0x21]);
        assert_eq!(frame.checksum(), checksum(payload));
        assert_eq!(frame.payload(), payload);
    }

    #[test]
    fn empty_payload() {
        let frame = build_frame(&[]).unwrap();
        assert_eq!(frame.as_bytes(), &[0x3A, 0x00, 0x00, 0x00, 0x0A]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = [0u8; 256];
        let err = build_frame(&payload).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 256, max: 255 }));
    }

    #[test]
    fn payload_is_left_untouched() {
        let payload = vec![0xAA; 32];
        let copy = payload.clone();
        let _ = build_frame(&payload).unwrap();
        assert_eq!(payload, copy);
    }

    #[test]
    fn sample_frame_length_matches_selection() {
        let encoder = FrameEncoder::new(FieldSelector::new(FieldConfig::ALL)).unwrap();
        let frame = encoder.encode_sample(&Sample::default());

        assert_eq!(frame.len(), encoder.frame_len());
        assert_eq!(frame.payload()[0], 0x3F);
    }
}
