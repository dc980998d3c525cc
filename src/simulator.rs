//! Synthetic IMU
//!
//! Stands in for the motion sensor when exercising a link without hardware: a slow yaw rotation
//! with a little pitch/roll wobble, optional stage failures and periodic FIFO overflows.

use std::f32::consts::{PI, TAU};

use imu_frame_link::frame_shared::RAW_BUFFER_LEN;
use imu_frame_link::telemetry::RAW_QUATERNION_SCALE;
use imu_frame_link::{Reading, STATUS_FAILURE, STATUS_OK, Sample, SampleSource, StatusEvent};

/// Yaw advance per sample, in radians.
const YAW_STEP: f32 = 0.01;
const WOBBLE: f32 = 0.1;

#[derive(Debug, Default)]
pub struct SyntheticImu {
    tick:           u64,
    samples:        u64,
    fail_stage:     Option<StatusEvent>,
    overflow_every: Option<u64>,
}

impl SyntheticImu {
    pub fn new(fail_stage: Option<StatusEvent>, overflow_every: Option<u64>) -> Self {
        Self {
            fail_stage,
            overflow_every: overflow_every.filter(|&n| n > 0),
            ..Default::default()
        }
    }

    /// Samples handed out so far, overflows excluded.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn sample_at(tick: u64) -> Sample {
        let t = tick as f32;
        let yaw = wrap_angle(t * YAW_STEP);
        let pitch = WOBBLE * (t * YAW_STEP * 3.0).sin();
        let roll = WOBBLE * (t * YAW_STEP * 5.0).cos();

        let (half_sin, half_cos) = (yaw / 2.0).sin_cos();
        let quaternion = [half_cos, 0.0, 0.0, half_sin];

        Sample {
            quaternion,
            euler: [yaw, pitch, roll],
            yaw_pitch_roll: [yaw, pitch, roll],
            linear_accel: [pitch.sin(), roll.sin(), 0.0],
            world_accel: [0.0, 0.0, pitch.cos() - 1.0],
            raw: raw_quaternion(quaternion),
        }
    }
}

impl SampleSource for SyntheticImu {
    fn init_stage(&mut self, stage: StatusEvent) -> u8 {
        if self.fail_stage == Some(stage) { STATUS_FAILURE } else { STATUS_OK }
    }

    fn read(&mut self) -> Reading {
        self.tick += 1;

        if let Some(every) = self.overflow_every {
            if self.tick % every == 0 {
                return Reading::Overflow;
            }
        }

        self.samples += 1;
        Reading::Sample(Self::sample_at(self.tick))
    }
}

fn wrap_angle(rad: f32) -> f32 {
    (rad + PI).rem_euclid(TAU) - PI
}

/// Q14 fixed point, big-endian, the way the DMP FIFO lays it out.
fn raw_quaternion(q: [f32; 4]) -> [u8; RAW_BUFFER_LEN] {
    let mut raw = [0u8; RAW_BUFFER_LEN];
    for (chunk, v) in raw.chunks_exact_mut(2).zip(q) {
        let fixed = (v * RAW_QUATERNION_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32);
        chunk.copy_from_slice(&(fixed as i16).to_be_bytes());
    }
    raw
}
