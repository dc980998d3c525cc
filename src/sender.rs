// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                           Sender Session
// —————————————————————————————————————————————————————————————————————————————————————————————————

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::{FrameError, Result};
use crate::field_selector::Sample;
use crate::frame_encoder::{Frame, FrameEncoder};
use crate::frame_shared::*;
use crate::status;

/// Sender lifecycle. Overflow reports do not change the state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SenderState {
    #[default]
    Uninitialized,
    DeviceInitialized,
    ConnectionVerified,
    ProcessingReady,
    Streaming,
}

/// What to do when an initialization stage reports a failure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InitPolicy {
    /// Report the failure and attempt the remaining stages anyway.
    ReportAndContinue,
    /// Report the failure and stay in the last good state.
    #[default]
    HaltOnFailure,
}

/// Initialization stages in order, with the state each one leads to.
const INIT_STAGES: [(StatusEvent, SenderState); 4] = [
    (StatusEvent::DeviceInit, SenderState::DeviceInitialized),
    (StatusEvent::Connection, SenderState::ConnectionVerified),
    (StatusEvent::DmpInit, SenderState::ProcessingReady),
    (StatusEvent::InterruptConfig, SenderState::Streaming),
];

// ——————————————————————————————————————————— Data Ready ——————————————————————————————————————————

/// "New sample available" flag, set by the acquisition side (interrupt, timer thread) and
/// consumed by the polling loop.
#[derive(Debug, Default)]
pub struct DataReady(AtomicBool);

impl DataReady {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline]
    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns whether the flag was set, clearing it.
    #[inline]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ———————————————————————————————————————————— Source —————————————————————————————————————————————

/// What the acquisition layer has for the sender after a data ready signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Sample(Sample),
    /// The device FIFO filled up and was reset. Buffered data is gone.
    Overflow,
    /// Not enough bytes buffered yet.
    Pending,
}

/// The motion sensor as seen by the sender.
pub trait SampleSource {
    /// Runs one initialization stage and returns its status code, `STATUS_OK` on success.
    fn init_stage(&mut self, stage: StatusEvent) -> u8;

    fn read(&mut self) -> Reading;
}

// ———————————————————————————————————————————— Sender —————————————————————————————————————————————

/// Drives initialization and streaming over a byte sink. Every frame is built, written and
/// dropped within a single call.
pub struct Sender<W> {
    sink:        W,
    encoder:     FrameEncoder,
    policy:      InitPolicy,
    state:       SenderState,
    frames_sent: u64,
}

impl<W: Write> Sender<W> {
    pub fn new(sink: W, encoder: FrameEncoder, policy: InitPolicy) -> Self {
        Self {
            sink,
            encoder,
            policy,
            state: SenderState::Uninitialized,
            frames_sent: 0,
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == SenderState::Streaming
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Runs every initialization stage, reporting each result in a status frame.
    ///
    /// Returns the state reached. Under [`InitPolicy::HaltOnFailure`] that is the state before
    /// the first failed stage; under [`InitPolicy::ReportAndContinue`] failures are reported and
    /// the session moves on regardless.
    pub fn initialize<S: SampleSource>(&mut self, source: &mut S) -> Result<SenderState> {
        for (stage, next) in INIT_STAGES {
            let code = source.init_stage(stage);
            self.report(stage, code)?;

            if code == STATUS_OK {
                info!(stage = stage.label(), "init stage ok");
            }
            else {
                warn!(stage = stage.label(), code, policy = ?self.policy, "init stage failed");
                if self.policy == InitPolicy::HaltOnFailure {
                    return Ok(self.state);
                }
            }

            self.state = next;
        }

        Ok(self.state)
    }

    /// Encodes and sends one telemetry frame.
    pub fn send_sample(&mut self, sample: &Sample) -> Result<()> {
        if !self.is_streaming() {
            return Err(FrameError::NotStreaming(self.state));
        }
        let frame = self.encoder.encode_sample(sample);
        self.transmit(frame)
    }

    pub fn report(&mut self, event: StatusEvent, status_code: u8) -> Result<()> {
        self.transmit(status::report(event, status_code))
    }

    pub fn report_overflow(&mut self) -> Result<()> {
        warn!("FIFO overflow");
        self.report(StatusEvent::FifoOverflow, STATUS_FAILURE)
    }

    /// One pass of the polling loop. Returns `true` when a frame went out.
    pub fn poll<S: SampleSource>(&mut self, source: &mut S, ready: &DataReady) -> Result<bool> {
        if !ready.take() {
            return Ok(false);
        }

        match source.read() {
            Reading::Sample(sample) => self.send_sample(&sample).map(|_| true),
            Reading::Overflow => self.report_overflow().map(|_| true),
            Reading::Pending => Ok(false),
        }
    }

    fn transmit(&mut self, frame: Frame) -> Result<()> {
        self.sink.write_all(frame.as_bytes())?;
        self.sink.flush()?;
        self.frames_sent += 1;
        debug!(len = frame.len(), total = self.frames_sent, "frame sent");
        Ok(())
    }
}
