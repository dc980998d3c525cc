// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                          Scalar Encoding
// —————————————————————————————————————————————————————————————————————————————————————————————————

use bytes::{Buf, BufMut};

/// Byte order of float fields on the wire.
///
/// Senders always use `Big`. `Little` exists for receivers talking to older firmware that copied
/// the in-memory float of a little-endian MCU straight into the frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FloatOrder {
    #[default]
    Big,
    Little,
}

impl FloatOrder {
    #[inline]
    pub fn put_f32(self, dst: &mut impl BufMut, value: f32) {
        match self {
            FloatOrder::Big => dst.put_slice(&encode_f32(value)),
            FloatOrder::Little => dst.put_f32_le(value),
        }
    }

    /// Caller guarantees at least 4 bytes remain.
    #[inline]
    pub fn get_f32(self, src: &mut impl Buf) -> f32 {
        match self {
            FloatOrder::Big => src.get_f32(),
            FloatOrder::Little => src.get_f32_le(),
        }
    }
}

/// Checksum field layout, high byte first.
#[inline]
pub fn encode_u16_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

#[inline]
pub fn decode_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// IEEE-754 single precision, big-endian. NaN and infinities pass through unchanged, signalling
/// NaN payloads included.
#[inline]
pub fn encode_f32(value: f32) -> [u8; 4] {
    value.to_be_bytes()
}

#[inline]
pub fn decode_f32(bytes: [u8; 4]) -> f32 {
    f32::from_be_bytes(bytes)
}
