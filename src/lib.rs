//! IMU Frame Link
//!
//! Checksummed framing for motion sensor telemetry over a serial link.
//!
//! Sending side: a [`FieldSelector`] packs the enabled fields of a [`Sample`] into a payload,
//! [`build_frame`] wraps it with marker, length, CRC-16 and terminator, and [`Sender`] walks the
//! device through its initialization stages, reporting each through a status frame.
//!
//! Receiving side: [`FrameDecoder`] splits a raw byte stream into text and verified frames and
//! [`Message`] classifies and decodes their payloads.

pub mod config;
pub mod crc16;
pub mod error;
pub mod field_selector;
pub mod frame_decoder;
pub mod frame_encoder;
pub mod frame_shared;
pub mod scalar;
pub mod sender;
pub mod status;
pub mod telemetry;

pub use config::{LinkConfig, SenderConfig};
pub use crc16::checksum;
pub use error::{FrameError, Result};
pub use field_selector::{FieldConfig, FieldSelector, Sample};
pub use frame_decoder::{FilterResult, FrameDecoder, Segment};
pub use frame_encoder::{Frame, FrameEncoder, build_frame};
pub use frame_shared::{Field, STATUS_FAILURE, STATUS_OK, StatusEvent};
pub use scalar::FloatOrder;
pub use sender::{DataReady, InitPolicy, Reading, SampleSource, Sender, SenderState};
pub use status::{StatusReport, report_status};
pub use telemetry::{Message, Telemetry};
