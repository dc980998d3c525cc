// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                          Payload Decoding
// —————————————————————————————————————————————————————————————————————————————————————————————————

use std::fmt;

use bytes::Buf;

use crate::error::{FrameError, Result};
use crate::field_selector::FieldConfig;
use crate::frame_shared::*;
use crate::scalar::FloatOrder;
use crate::status::StatusReport;

/// Scale of the DMP's fixed point quaternion words (Q14).
pub const RAW_QUATERNION_SCALE: f32 = 16384.0;

/// A verified frame payload, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Status(StatusReport),
    Telemetry(Telemetry),
}

impl Message {
    /// Two byte payloads starting with a known event are status reports, everything else is
    /// telemetry. No telemetry selection encodes to two bytes, so the two never collide.
    pub fn decode(payload: &[u8], float_order: FloatOrder) -> Result<Self> {
        if let Some(report) = StatusReport::parse(payload) {
            return Ok(Message::Status(report));
        }
        Telemetry::decode(payload, float_order).map(Message::Telemetry)
    }
}

/// Decoded telemetry. Absent fields are `None`; angles are in degrees as sent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Telemetry {
    pub type_mask:      u8,
    pub raw:            Option<[u8; RAW_BUFFER_LEN]>,
    pub quaternion:     Option<[f32; 4]>,
    pub euler:          Option<[f32; 3]>,
    pub yaw_pitch_roll: Option<[f32; 3]>,
    pub linear_accel:   Option<[f32; 3]>,
    pub world_accel:    Option<[f32; 3]>,
}

impl Telemetry {
    pub fn decode(payload: &[u8], float_order: FloatOrder) -> Result<Self> {
        let mut src = payload;

        if !src.has_remaining() {
            return Err(FrameError::Truncated {
                field: "type mask",
                need:  MASK_LEN,
                have:  0,
            });
        }

        let type_mask = src.get_u8();
        let config = FieldConfig::from_mask(type_mask);

        if payload.len() > config.payload_len() {
            return Err(FrameError::LengthMismatch {
                expected: config.payload_len(),
                actual:   payload.len(),
            });
        }

        let mut telemetry = Telemetry {
            type_mask,
            ..Default::default()
        };

        for field in config.enabled() {
            if src.remaining() < field.wire_len() {
                return Err(FrameError::Truncated {
                    field: field.name(),
                    need:  field.wire_len(),
                    have:  src.remaining(),
                });
            }

            match field {
                Field::RawBuffer => {
                    let mut raw = [0u8; RAW_BUFFER_LEN];
                    src.copy_to_slice(&mut raw);
                    telemetry.raw = Some(raw);
                }
                Field::Quaternion => telemetry.quaternion = Some(floats(&mut src, float_order)),
                Field::Euler => telemetry.euler = Some(floats(&mut src, float_order)),
                Field::YawPitchRoll => {
                    telemetry.yaw_pitch_roll = Some(floats(&mut src, float_order))
                }
                Field::LinearAccel => telemetry.linear_accel = Some(floats(&mut src, float_order)),
                Field::WorldAccel => telemetry.world_accel = Some(floats(&mut src, float_order)),
            }
        }

        Ok(telemetry)
    }

    /// Quaternion decoded from the raw DMP buffer, `[w, x, y, z]`.
    pub fn raw_quaternion(&self) -> Option<[f32; 4]> {
        let raw = self.raw?;
        let mut src = &raw[..];
        Some(std::array::from_fn(|_| f32::from(src.get_i16()) / RAW_QUATERNION_SCALE))
    }
}

fn floats<const N: usize>(src: &mut &[u8], float_order: FloatOrder) -> [f32; N] {
    std::array::from_fn(|_| float_order.get_f32(&mut *src))
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = self.quaternion.or_else(|| self.raw_quaternion()) {
            writeln!(f, "quaternion:\tw:{:.3}\tx:{:.3}\ty:{:.3}\tz:{:.3}", q[0], q[1], q[2], q[3])?;
        }
        if let Some([x, y, z]) = self.euler {
            writeln!(f, "euler:\t\tx:{x:.2}\ty:{y:.2}\tz:{z:.2}")?;
        }
        if let Some([yaw, pitch, roll]) = self.yaw_pitch_roll {
            writeln!(f, "ypr:\t\tyaw:{yaw:.2}\tpitch:{pitch:.2}\troll:{roll:.2}")?;
        }
        if let Some([x, y, z]) = self.linear_accel {
            writeln!(f, "linear:\t\tx:{x:.3}\ty:{y:.3}\tz:{z:.3}")?;
        }
        if let Some([x, y, z]) = self.world_accel {
            writeln!(f, "world:\t\tx:{x:.3}\ty:{y:.3}\tz:{z:.3}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_selector::{FieldSelector, Sample};
    use std::f32::consts::PI;

    #[test]
    fn decode_all_fields() {
        let sample = Sample {
            quaternion: [1.0, 0.0, 0.0, 0.0],
            euler: [PI, 0.0, -PI / 2.0],
            yaw_pitch_roll: [PI / 4.0, 0.0, 0.0],
            linear_accel: [0.1, 0.2, 0.3],
            world_accel: [-1.0, -2.0, 9.81],
            raw: [0x40, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x20, 0x00],
        };
        let payload = FieldSelector::new(FieldConfig::ALL).encode(&sample);

        let t = Telemetry::decode(&payload, FloatOrder::Big).unwrap();

        assert_eq!(t.type_mask, 0x3F);
        assert_eq!(t.quaternion, Some(sample.quaternion));
        assert_eq!(t.raw, Some(sample.raw));
        assert_eq!(t.linear_accel, Some(sample.linear_accel));
        assert_eq!(t.world_accel, Some(sample.world_accel));

        let [psi, _, phi] = t.euler.unwrap();
        assert!((psi - 180.0).abs() < 1e-5);
        assert!((phi + 90.0).abs() < 1e-5);
        assert!((t.yaw_pitch_roll.unwrap()[0] - 45.0).abs() < 1e-5);
    }

    #[test]
    fn absent_fields_are_none() {
        let cfg = FieldConfig::from_fields(&[Field::WorldAccel]);
        let payload = FieldSelector::new(cfg).encode(&Sample::default());

        let t = Telemetry::decode(&payload, FloatOrder::Big).unwrap();

        assert_eq!(t.world_accel, Some([0.0; 3]));
        assert!(t.quaternion.is_none());
        assert!(t.euler.is_none());
        assert!(t.raw.is_none());
    }

    #[test]
    fn raw_quaternion_fixed_point() {
        let t = Telemetry {
            raw: Some([0x40, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x20, 0x00]),
            ..Default::default()
        };
        assert_eq!(t.raw_quaternion(), Some([1.0, 0.0, -1.0, 0.5]));
    }

    #[test]
    fn little_endian_floats() {
        let mut payload = vec![Field::LinearAccel.bit()];
        for v in [1.5f32, -2.0, 0.25] {
            payload.extend_from_slice(&v.to_le_bytes());
        }

        let t = Telemetry::decode(&payload, FloatOrder::Little).unwrap();
        assert_eq!(t.linear_accel, Some([1.5, -2.0, 0.25]));
    }

    #[test]
    fn truncated_field() {
        let payload = [Field::Quaternion.bit(), 0, 0, 0, 0];
        let err = Telemetry::decode(&payload, FloatOrder::Big).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                field: "quaternion",
                need: 16,
                have: 4
            }
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let payload = [0x00, 0xAA, 0xBB, 0xCC];
        let err = Telemetry::decode(&payload, FloatOrder::Big).unwrap_err();
        assert!(matches!(err, FrameError::LengthMismatch { expected: 1, actual: 4 }));
    }

    #[test]
    fn empty_payload_is_truncated() {
        assert!(matches!(
            Telemetry::decode(&[], FloatOrder::Big),
            Err(FrameError::Truncated { field: "type mask", .. })
        ));
    }

    #[test]
    fn classify_messages() {
        let status = Message::decode(&[0x03, 0x00], FloatOrder::Big).unwrap();
        assert!(matches!(status, Message::Status(r) if r.event == StatusEvent::InterruptConfig));

        let telemetry = Message::decode(&[0x00], FloatOrder::Big).unwrap();
        assert!(matches!(telemetry, Message::Telemetry(t) if t.type_mask == 0));
    }
}
