//! Scroll-driven scene transport for cinematic product reveals.
//!
//! A [`Stage`] is one page instance: gestures go in as [`Command`]s, the
//! [`SceneTransport`] moves a [`MediaBackend`] between scenes, and
//! [`Event`]s come back out for the UI layer.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gesture;
pub mod media;
pub mod momentum;
pub mod popup;
pub mod scene;
pub mod scrub;
pub mod time;
pub mod transport;

pub use api::{
    Command, EngineErrorEvent, EngineErrorKind, Event, Stage, StageOptions, StageView,
};
pub use config::{MediaConfig, StageConfig};
pub use error::{EngineError, Result};
pub use gesture::{GestureAggregator, GestureConfig, GestureEvent, InputMode, Signal};
pub use media::{
    AnyBackend, Frame, LoadStatus, MediaBackend, RangeJob, RangePoll,
    sequence::{FfmpegFrameDecoder, FrameDecoder, FramePattern, FrameSequenceBackend},
    video::{FfmpegVideoSource, VideoBackend, VideoMeta, VideoSource},
};
pub use momentum::{MomentumConfig, MomentumController, MomentumTick};
pub use popup::{PopupContent, PopupOverlay};
pub use scene::{Overlay, OverlayAnchor, Scene, SceneTable};
pub use scrub::ContinuousScrub;
pub use time::FrameRate;
pub use transport::{
    Direction, IgnoreReason, InputOutcome, Phase, ReverseStrategy, SceneTransport,
    TracingObserver, TransportConfig, TransportEvent, TransportObserver, TransportState,
};
