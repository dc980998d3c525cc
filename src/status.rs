// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                          Status Reports
// —————————————————————————————————————————————————————————————————————————————————————————————————

use std::fmt;

use crate::frame_encoder::{Frame, assemble};
use crate::frame_shared::*;

/// Frames a `[event_type, status_code]` payload. Codes are passed through untouched.
#[inline]
pub fn report_status(event_type: u8, status_code: u8) -> Frame {
    assemble(&[event_type, status_code])
}

#[inline]
pub fn report(event: StatusEvent, status_code: u8) -> Frame {
    report_status(event as u8, status_code)
}

/// A decoded status payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub event: StatusEvent,
    pub code:  u8,
}

impl StatusReport {
    /// `None` unless `payload` is exactly two bytes with a known event.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match *payload {
            [event, code] => StatusEvent::try_from(event)
                .ok()
                .map(|event| Self { event, code }),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            _ if self.event == StatusEvent::FifoOverflow => write!(f, "{}", self.event.label()),
            STATUS_OK => write!(f, "{}: ok", self.event.label()),
            STATUS_FAILURE => write!(f, "{}: failed", self.event.label()),
            code => write!(f, "{}: failed (code {code})", self.event.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc16::checksum;

    #[test]
    fn connection_ok_frame() {
        let frame = report_status(1, 0);
        let [hi, lo] = checksum(&[0x01, 0x00]).to_be_bytes();

        assert_eq!(frame.as_bytes(), &[0x3A, 0x02, 0x01, 0x00, hi, lo, 0x0A]);
        assert_eq!(frame.as_bytes(), &[0x3A, 0x02, 0x01, 0x00, 0xD8, 0x19, 0x0A]);
    }

    #[test]
    fn device_codes_pass_through() {
        let frame = report(StatusEvent::DmpInit, 0x02);
        assert_eq!(frame.payload(), &[0x02, 0x02]);
    }

    #[test]
    fn parse_report() {
        let report = StatusReport::parse(&[0x04, 0x00]).unwrap();
        assert_eq!(report.event, StatusEvent::FifoOverflow);
        assert!(report.is_ok());

        assert!(StatusReport::parse(&[0x07, 0x00]).is_none());
        assert!(StatusReport::parse(&[0x01]).is_none());
        assert!(StatusReport::parse(&[0x01, 0x00, 0x00]).is_none());
    }

    #[test]
    fn display() {
        let failed = StatusReport {
            event: StatusEvent::DeviceInit,
            code:  STATUS_FAILURE,
        };
        assert_eq!(failed.to_string(), "MPU init: failed");

        let diag = StatusReport {
            event: StatusEvent::DmpInit,
            code:  1,
        };
        assert_eq!(diag.to_string(), "DMP init: failed (code 1)");

        let overflow = StatusReport {
            event: StatusEvent::FifoOverflow,
            code:  STATUS_FAILURE,
        };
        assert_eq!(overflow.to_string(), "FIFO overflow");
    }
}
