// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                       IMU Frame Protocol
// —————————————————————————————————————————————————————————————————————————————————————————————————

/// IMU Frame Protocol
///
/// One-way, best-effort framing for motion sensor telemetry over a byte oriented serial link.
/// Frames are self delimited and carry a CRC-16 (CCITT/Kermit) over the payload, so a receiver
/// can detect corruption and resynchronise on the next marker byte. Nothing is ever retransmitted.
///
/// Frame Structure:
/// [MARKER:1][LENGTH N:1][PAYLOAD:N][CRC16 BE:2][TERMINATOR:1]
///
/// Telemetry payload:
/// [TYPE MASK:1][RAW:8]?[QUAT:16]?[EULER:12]?[YPR:12]?[LINEAR:12]?[WORLD:12]?
///
/// Status payload:
/// [EVENT:1][CODE:1]
///
pub const MARKER: u8 = b':';
pub const TERMINATOR: u8 = b'\n';

pub const MARKER_LEN: usize = 1;
pub const SIZE_LEN: usize = 1;
pub const CRC_LEN: usize = 2;
pub const TERMINATOR_LEN: usize = 1;

pub const HEADER_LEN: usize = MARKER_LEN + SIZE_LEN;
pub const FRAME_OVERHEAD: usize = HEADER_LEN + CRC_LEN + TERMINATOR_LEN;

pub const MAX_PAYLOAD_LEN: usize = (1usize << (SIZE_LEN * 8)) - 1;
pub const MIN_FRAME_SIZE: usize = FRAME_OVERHEAD;
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_LEN;

pub const MASK_LEN: usize = 1;
pub const FLOAT_LEN: usize = 4;
pub const STATUS_PAYLOAD_LEN: usize = 2;

/// Raw DMP FIFO quaternion: four big-endian Q14 words.
pub const RAW_BUFFER_LEN: usize = 8;

// ———————————————————————————————————————— Telemetry Fields ———————————————————————————————————————

/// Logical telemetry fields. The discriminant is the field's bit in the type mask.
///
/// Declaration order is NOT the wire order, see [`Field::WIRE_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Field {
    Quaternion   = 0x01,
    Euler        = 0x02,
    YawPitchRoll = 0x04,
    LinearAccel  = 0x08,
    WorldAccel   = 0x10,
    RawBuffer    = 0x20,
}

impl Field {
    /// Order in which enabled fields follow the type mask in a payload.
    pub const WIRE_ORDER: [Field; 6] = [
        Field::RawBuffer,
        Field::Quaternion,
        Field::Euler,
        Field::YawPitchRoll,
        Field::LinearAccel,
        Field::WorldAccel,
    ];

    /// Every bit the protocol defines.
    pub const DEFINED_BITS: u8 = 0x3F;

    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Encoded size of the field in bytes.
    pub const fn wire_len(self) -> usize {
        match self {
            Field::Quaternion => 4 * FLOAT_LEN,
            Field::Euler | Field::YawPitchRoll | Field::LinearAccel | Field::WorldAccel => {
                3 * FLOAT_LEN
            }
            Field::RawBuffer => RAW_BUFFER_LEN,
        }
    }

    /// Whether the field is sent in degrees after conversion from radians.
    pub const fn is_angle(self) -> bool {
        matches!(self, Field::Euler | Field::YawPitchRoll)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Quaternion => "quaternion",
            Field::Euler => "euler",
            Field::YawPitchRoll => "yaw/pitch/roll",
            Field::LinearAccel => "linear accel",
            Field::WorldAccel => "world accel",
            Field::RawBuffer => "raw buffer",
        }
    }
}

// ————————————————————————————————————————— Status Events —————————————————————————————————————————

/// Lifecycle stages reported through two byte status frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusEvent {
    DeviceInit      = 0,
    Connection      = 1,
    DmpInit         = 2,
    InterruptConfig = 3,
    FifoOverflow    = 4,
}

impl StatusEvent {
    pub const fn label(self) -> &'static str {
        match self {
            StatusEvent::DeviceInit => "MPU init",
            StatusEvent::Connection => "MPU connection",
            StatusEvent::DmpInit => "DMP init",
            StatusEvent::InterruptConfig => "DMP interrupt status",
            StatusEvent::FifoOverflow => "FIFO overflow",
        }
    }
}

impl TryFrom<u8> for StatusEvent {
    type Error = ();

    fn try_from(value: u8) -> core::result::Result<Self, <StatusEvent as TryFrom<u8>>::Error> {
        match value {
            v if v == Self::DeviceInit as u8 => Ok(Self::DeviceInit),
            v if v == Self::Connection as u8 => Ok(Self::Connection),
            v if v == Self::DmpInit as u8 => Ok(Self::DmpInit),
            v if v == Self::InterruptConfig as u8 => Ok(Self::InterruptConfig),
            v if v == Self::FifoOverflow as u8 => Ok(Self::FifoOverflow),
            _ => Err(()),
        }
    }
}

/// Success.
pub const STATUS_OK: u8 = 0x00;
/// Generic failure. Other non-zero codes are device diagnostics passed through untouched.
pub const STATUS_FAILURE: u8 = 0xFF;
