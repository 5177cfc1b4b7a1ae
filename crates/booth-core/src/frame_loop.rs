//! Per-frame detect-then-redraw cycle around an external face detector.

use crate::state::BoothState;
use crate::types::Detection;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("detector not ready: {0}")]
    NotReady(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Black-box face detector. May return no detections; errors are transient.
pub trait FaceDetector {
    type Frame: ?Sized;

    fn detect(&mut self, frame: &Self::Frame, timestamp_ms: f64) -> Result<Vec<Detection>, DetectorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Drawn { faces: usize },
    /// The detector failed; previous detections and frame stay as they were.
    Skipped,
    /// A cycle was already in flight.
    Busy,
}

/// Guards against overlapping detection cycles and keeps simple counters.
#[derive(Debug, Default)]
pub struct FrameLoop {
    busy: bool,
    frames: u64,
    skipped: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the loop for one cycle. False when a cycle is already running.
    pub fn begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Finish the cycle started by [`FrameLoop::begin`] with the detector's result.
    pub fn complete(&mut self, state: &mut BoothState, result: Result<Vec<Detection>, DetectorError>) -> Tick {
        self.busy = false;
        match result {
            Ok(detections) => {
                let faces = detections.len();
                state.set_detections(detections);
                state.redraw();
                self.frames += 1;
                tracing::debug!(faces, frame = self.frames, "frame drawn");
                Tick::Drawn { faces }
            }
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(error = %e, skipped = self.skipped, "detection failed, skipping frame");
                Tick::Skipped
            }
        }
    }

    /// Run one full detect-and-redraw cycle.
    pub fn tick<D: FaceDetector>(
        &mut self,
        state: &mut BoothState,
        detector: &mut D,
        frame: &D::Frame,
        timestamp_ms: f64,
    ) -> Tick {
        if !self.begin() {
            return Tick::Busy;
        }
        let result = detector.detect(frame, timestamp_ms);
        self.complete(state, result)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn frames_skipped(&self) -> u64 {
        self.skipped
    }
}
