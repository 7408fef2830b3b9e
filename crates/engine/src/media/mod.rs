//! Seekable media timelines driven by the scene transport.

pub mod range;
pub mod sequence;
pub mod video;

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::time::POSITION_EPSILON;

pub use range::{RangeJob, RangePoll};

/// Raw RGBA frame payload passed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub bytes: Arc<[u8]>,
}

/// Loader progress reported by [`MediaBackend::poll_load`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading { done: usize, total: usize },
    Ready,
    Failed { reason: String },
}

/// A bounded timeline the transport can seek, play and step.
///
/// Positions are seconds for video and frame indices for sequences. All
/// methods are non-blocking; loading happens on backend-owned threads and is
/// observed through [`MediaBackend::poll_load`].
pub trait MediaBackend {
    /// Drains loader progress and returns the current load status.
    fn poll_load(&mut self) -> LoadStatus;

    fn is_ready(&self) -> bool;

    /// Last addressable position, `None` until loaded.
    fn extent(&self) -> Option<f64>;

    /// Distance covered by one discrete step.
    fn step_size(&self) -> f64;

    /// Wall-clock cadence of discrete steps.
    fn step_interval(&self) -> Duration;

    /// How close native playback must get to a target before it is snapped.
    fn default_tolerance(&self) -> f64;

    fn position(&self) -> f64;

    /// Moves to `position`, clamped to `[0, extent]`. Idempotent.
    fn seek_to(&mut self, position: f64) -> Result<()>;

    /// Starts native playback at `rate` (negative plays backwards).
    ///
    /// Backends return `EngineError::NativePlaybackUnsupported` when they
    /// cannot honor the rate.
    fn start_native(&mut self, rate: f64) -> Result<()>;

    fn stop_native(&mut self);

    fn is_playing(&self) -> bool;

    /// Advances the native playback clock by `elapsed`.
    fn advance(&mut self, elapsed: Duration);

    /// Frame to draw at the current position.
    fn current_frame(&mut self) -> Option<Frame>;

    /// Stops loaders and drops decoded media. The backend is unusable after.
    fn release(&mut self);

    /// Starts native playback from `from` towards `to`.
    fn play_range(&mut self, from: f64, to: f64, now: Duration) -> Result<RangeJob> {
        let rate = if to >= from { 1.0 } else { -1.0 };
        if (self.position() - from).abs() > POSITION_EPSILON {
            self.seek_to(from)?;
        }
        self.start_native(rate)?;
        Ok(RangeJob::native(
            from,
            to,
            rate,
            self.default_tolerance(),
            now,
        ))
    }

    /// Starts a discrete walk from `from` to `to` at the step cadence.
    fn step_range(&mut self, from: f64, to: f64, now: Duration) -> Result<RangeJob> {
        if (self.position() - from).abs() > POSITION_EPSILON {
            self.seek_to(from)?;
        }
        Ok(RangeJob::stepped(
            from,
            to,
            self.step_size(),
            self.step_interval(),
            now,
        ))
    }
}

/// Backend selected from configuration.
pub enum AnyBackend {
    Video(video::VideoBackend<video::FfmpegVideoSource>),
    Frames(sequence::FrameSequenceBackend),
}

macro_rules! delegate {
    ($self:ident, $backend:ident => $call:expr) => {
        match $self {
            AnyBackend::Video($backend) => $call,
            AnyBackend::Frames($backend) => $call,
        }
    };
}

impl MediaBackend for AnyBackend {
    fn poll_load(&mut self) -> LoadStatus {
        delegate!(self, backend => backend.poll_load())
    }

    fn is_ready(&self) -> bool {
        delegate!(self, backend => backend.is_ready())
    }

    fn extent(&self) -> Option<f64> {
        delegate!(self, backend => backend.extent())
    }

    fn step_size(&self) -> f64 {
        delegate!(self, backend => backend.step_size())
    }

    fn step_interval(&self) -> Duration {
        delegate!(self, backend => backend.step_interval())
    }

    fn default_tolerance(&self) -> f64 {
        delegate!(self, backend => backend.default_tolerance())
    }

    fn position(&self) -> f64 {
        delegate!(self, backend => backend.position())
    }

    fn seek_to(&mut self, position: f64) -> Result<()> {
        delegate!(self, backend => backend.seek_to(position))
    }

    fn start_native(&mut self, rate: f64) -> Result<()> {
        delegate!(self, backend => backend.start_native(rate))
    }

    fn stop_native(&mut self) {
        delegate!(self, backend => backend.stop_native())
    }

    fn is_playing(&self) -> bool {
        delegate!(self, backend => backend.is_playing())
    }

    fn advance(&mut self, elapsed: Duration) {
        delegate!(self, backend => backend.advance(elapsed))
    }

    fn current_frame(&mut self) -> Option<Frame> {
        delegate!(self, backend => backend.current_frame())
    }

    fn release(&mut self) {
        delegate!(self, backend => backend.release())
    }
}

/// Clamps `position` into `[0, extent]`, rejecting non-finite input.
pub(crate) fn clamp_position(position: f64, extent: f64) -> Result<f64> {
    if !position.is_finite() {
        return Err(crate::error::EngineError::InvalidPosition(position));
    }
    Ok(position.clamp(0.0, extent.max(0.0)))
}
