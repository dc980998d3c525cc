use crate::sender::SenderState;

/// Errors that can occur while building, sending or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the one byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A telemetry payload ended before a field announced by its type mask.
    #[error("{field} truncated ({have} bytes left, need {need})")]
    Truncated {
        field: &'static str,
        need:  usize,
        have:  usize,
    },

    /// A telemetry payload is longer than its type mask accounts for.
    #[error("payload length {actual} does not match type mask (expected {expected})")]
    LengthMismatch { expected: usize, actual: usize },

    /// A field name in a field list could not be recognised.
    #[error("unknown telemetry field \"{0}\"")]
    UnknownField(String),

    /// Samples can only be sent once initialization reached streaming.
    #[error("sender is not streaming (state: {0:?})")]
    NotStreaming(SenderState),

    /// The byte sink failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
