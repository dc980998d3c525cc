// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                          Field Selector
// —————————————————————————————————————————————————————————————————————————————————————————————————

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::frame_shared::*;
use crate::scalar::FloatOrder;

const RAD_TO_DEG: f32 = 180.0 / PI;

/// Which telemetry fields a sender emits. Fixed for the lifetime of a [`FieldSelector`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldConfig {
    pub quaternion:     bool,
    pub euler:          bool,
    pub yaw_pitch_roll: bool,
    pub linear_accel:   bool,
    pub world_accel:    bool,
    pub raw_buffer:     bool,
}

impl FieldConfig {
    pub const NONE: Self = Self {
        quaternion:     false,
        euler:          false,
        yaw_pitch_roll: false,
        linear_accel:   false,
        world_accel:    false,
        raw_buffer:     false,
    };

    pub const ALL: Self = Self {
        quaternion:     true,
        euler:          true,
        yaw_pitch_roll: true,
        linear_accel:   true,
        world_accel:    true,
        raw_buffer:     true,
    };

    pub fn from_fields(fields: &[Field]) -> Self {
        fields.iter().fold(Self::NONE, |cfg, &f| cfg.with(f))
    }

    /// Fields whose bit is set in `mask`. Undefined bits are ignored.
    pub fn from_mask(mask: u8) -> Self {
        Field::WIRE_ORDER
            .iter()
            .filter(|f| mask & f.bit() != 0)
            .fold(Self::NONE, |cfg, &f| cfg.with(f))
    }

    #[must_use]
    pub fn with(mut self, field: Field) -> Self {
        *self.flag_mut(field) = true;
        self
    }

    pub fn is_enabled(&self, field: Field) -> bool {
        match field {
            Field::Quaternion => self.quaternion,
            Field::Euler => self.euler,
            Field::YawPitchRoll => self.yaw_pitch_roll,
            Field::LinearAccel => self.linear_accel,
            Field::WorldAccel => self.world_accel,
            Field::RawBuffer => self.raw_buffer,
        }
    }

    /// Enabled fields in wire order.
    pub fn enabled(&self) -> impl Iterator<Item = Field> + '_ {
        Field::WIRE_ORDER.into_iter().filter(|&f| self.is_enabled(f))
    }

    pub fn type_mask(&self) -> u8 {
        self.enabled().fold(0, |mask, f| mask | f.bit())
    }

    /// Mask byte plus every enabled field.
    pub fn payload_len(&self) -> usize {
        MASK_LEN + self.enabled().map(Field::wire_len).sum::<usize>()
    }

    fn flag_mut(&mut self, field: Field) -> &mut bool {
        match field {
            Field::Quaternion => &mut self.quaternion,
            Field::Euler => &mut self.euler,
            Field::YawPitchRoll => &mut self.yaw_pitch_roll,
            Field::LinearAccel => &mut self.linear_accel,
            Field::WorldAccel => &mut self.world_accel,
            Field::RawBuffer => &mut self.raw_buffer,
        }
    }
}

/// Parses a comma separated list such as `quat,euler,world`, or `all` / `none`.
impl FromStr for FieldConfig {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cfg = Self::NONE;

        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let field = match name.to_ascii_lowercase().as_str() {
                "all" => {
                    cfg = Self::ALL;
                    continue;
                }
                "none" => continue,
                "quat" | "quaternion" => Field::Quaternion,
                "euler" => Field::Euler,
                "ypr" | "yaw-pitch-roll" => Field::YawPitchRoll,
                "linear" | "real" | "linear-accel" => Field::LinearAccel,
                "world" | "world-accel" => Field::WorldAccel,
                "raw" | "buffer" => Field::RawBuffer,
                _ => return Err(FrameError::UnknownField(name.to_string())),
            };
            cfg = cfg.with(field);
        }

        Ok(cfg)
    }
}

impl fmt::Display for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.enabled().map(Field::name).peekable();
        if names.peek().is_none() {
            return write!(f, "none");
        }
        for (i, name) in names.enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————— Sample ————————————————————————————————————————————

/// One reading handed over by the acquisition layer. Angles are in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Sample {
    /// w, x, y, z
    pub quaternion:     [f32; 4],
    /// psi, theta, phi
    pub euler:          [f32; 3],
    /// yaw, pitch, roll
    pub yaw_pitch_roll: [f32; 3],
    pub linear_accel:   [f32; 3],
    pub world_accel:    [f32; 3],
    pub raw:            [u8; RAW_BUFFER_LEN],
}

// ——————————————————————————————————————————— Selector ————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    config:      FieldConfig,
    float_order: FloatOrder,
    type_mask:   u8,
    payload_len: usize,
}

impl FieldSelector {
    pub fn new(config: FieldConfig) -> Self {
        Self::with_float_order(config, FloatOrder::Big)
    }

    pub fn with_float_order(config: FieldConfig, float_order: FloatOrder) -> Self {
        Self {
            config,
            float_order,
            type_mask: config.type_mask(),
            payload_len: config.payload_len(),
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn type_mask(&self) -> u8 {
        self.type_mask
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Encodes the enabled fields of `sample` into a fresh payload of exactly
    /// [`payload_len`](Self::payload_len) bytes.
    pub fn encode(&self, sample: &Sample) -> Bytes {
        let mut payload = BytesMut::with_capacity(self.payload_len);
        payload.put_u8(self.type_mask);

        for field in self.config.enabled() {
            match field {
                Field::RawBuffer => payload.put_slice(&sample.raw),
                Field::Quaternion => self.put_floats(&mut payload, &sample.quaternion),
                Field::Euler => self.put_degrees(&mut payload, &sample.euler),
                Field::YawPitchRoll => self.put_degrees(&mut payload, &sample.yaw_pitch_roll),
                Field::LinearAccel => self.put_floats(&mut payload, &sample.linear_accel),
                Field::WorldAccel => self.put_floats(&mut payload, &sample.world_accel),
            }
        }

        debug_assert_eq!(payload.len(), self.payload_len);
        payload.freeze()
    }

    /// Values go out bit for bit, NaN payloads included.
    #[inline]
    fn put_floats(&self, dst: &mut BytesMut, values: &[f32]) {
        for &v in values {
            self.float_order.put_f32(dst, v);
        }
    }

    #[inline]
    fn put_degrees(&self, dst: &mut BytesMut, radians: &[f32]) {
        for &v in radians {
            self.float_order.put_f32(dst, v * RAD_TO_DEG);
        }
    }
}
