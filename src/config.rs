use std::time::Duration;

use crate::field_selector::FieldConfig;
use crate::scalar::FloatOrder;
use crate::sender::InitPolicy;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100;

/// Serial link settings shared by both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Port to open. `None` picks the highest numbered port available.
    pub port:        Option<String>,
    pub baud_rate:   u32,
    /// Read timeout. Timeouts are not errors, the reader just polls again.
    pub timeout:     Duration,
    pub float_order: FloatOrder,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port:        None,
            baud_rate:   DEFAULT_BAUD_RATE,
            timeout:     DEFAULT_TIMEOUT,
            float_order: FloatOrder::Big,
        }
    }
}

/// Sender side settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub fields:         FieldConfig,
    pub policy:         InitPolicy,
    pub sample_rate_hz: u32,
    /// Stop after this many samples. `None` streams until interrupted.
    pub max_samples:    Option<u64>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            fields:         FieldConfig::from_fields(&[crate::frame_shared::Field::Quaternion]),
            policy:         InitPolicy::default(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            max_samples:    None,
        }
    }
}

impl SenderConfig {
    /// Interval between data ready signals.
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs(1) / self.sample_rate_hz.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let link = LinkConfig::default();
        assert_eq!(link.baud_rate, 115_200);
        assert_eq!(link.float_order, FloatOrder::Big);

        let sender = SenderConfig::default();
        assert_eq!(sender.fields.type_mask(), 0x01);
        assert_eq!(sender.policy, InitPolicy::HaltOnFailure);
    }

    #[test]
    fn sample_period_never_divides_by_zero() {
        let cfg = SenderConfig {
            sample_rate_hz: 0,
            ..Default::default()
        };
        assert_eq!(cfg.sample_period(), Duration::from_secs(1));
        assert_eq!(SenderConfig::default().sample_period(), Duration::from_millis(10));
    }
}
