use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Frame, LoadStatus, MediaBackend, clamp_position};
use crate::cache::FrameCache;
use crate::error::{EngineError, Result};
use crate::time::FrameRate;

const FRAME_CACHE_CAPACITY: usize = 96;

/// Metadata probed from a video before it can be driven.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMeta {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<FrameRate>,
}

/// Where a [`VideoBackend`] gets metadata and pixels from.
///
/// Implementations are shared with the loader thread, so they must be
/// thread-safe.
pub trait VideoSource: Send + Sync + 'static {
    fn probe(&self) -> Result<VideoMeta>;

    fn decode_frame(&self, at_seconds: f64, meta: &VideoMeta) -> Result<Frame>;

    /// Whether the source can be played natively at negative rates.
    fn supports_reverse(&self) -> bool {
        false
    }
}

/// FFmpeg CLI-backed video source used by production wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegVideoSource {
    path: PathBuf,
}

impl FfmpegVideoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSource for FfmpegVideoSource {
    fn probe(&self) -> Result<VideoMeta> {
        let probe = media_ffmpeg::probe_video(&self.path)?;
        Ok(VideoMeta {
            duration: probe.duration_seconds,
            width: probe.width,
            height: probe.height,
            frame_rate: probe
                .frame_rate
                .and_then(|rate| FrameRate::try_from(rate).ok()),
        })
    }

    fn decode_frame(&self, at_seconds: f64, meta: &VideoMeta) -> Result<Frame> {
        let image =
            media_ffmpeg::decode_video_frame_at(&self.path, at_seconds, meta.width, meta.height)?;
        Ok(Frame {
            width: image.width,
            height: image.height,
            bytes: Arc::from(image.rgba),
        })
    }
}

/// Clock-driven video timeline with `current_time` semantics.
///
/// Metadata is probed on a loader thread; frames are decoded on demand and
/// cached per frame interval.
pub struct VideoBackend<S: VideoSource> {
    source: Arc<S>,
    configured_rate: Option<FrameRate>,
    frame_rate: FrameRate,
    tolerance: f64,
    loader: Option<Receiver<Result<VideoMeta>>>,
    meta: Option<VideoMeta>,
    failure: Option<String>,
    current_time: f64,
    rate: f64,
    playing: bool,
    cache: FrameCache,
    last_frame: Option<Frame>,
}

impl<S: VideoSource> VideoBackend<S> {
    /// Creates a backend and starts probing `source` in the background.
    ///
    /// `frame_rate` overrides the stepping cadence; when it is `None` the
    /// probed rate is used once metadata arrives, falling back to
    /// [`FrameRate::DEFAULT`]. `tolerance` is the native playback snap
    /// distance in seconds.
    pub fn new(source: S, frame_rate: Option<FrameRate>, tolerance: f64) -> Self {
        let configured_rate = frame_rate;
        let frame_rate = configured_rate.unwrap_or_default();
        let source = Arc::new(source);
        let (tx, rx) = mpsc::channel();
        let loader_source = Arc::clone(&source);
        let spawned = thread::Builder::new()
            .name("video-probe".to_owned())
            .spawn(move || {
                let _ = tx.send(loader_source.probe());
            });

        let (loader, failure) = match spawned {
            Ok(_) => (Some(rx), None),
            Err(err) => (None, Some(format!("failed to spawn video loader: {err}"))),
        };

        Self {
            source,
            configured_rate,
            frame_rate,
            tolerance,
            loader,
            meta: None,
            failure,
            current_time: 0.0,
            rate: 1.0,
            playing: false,
            cache: FrameCache::new(FRAME_CACHE_CAPACITY, frame_rate.frame_seconds()),
            last_frame: None,
        }
    }

    pub fn meta(&self) -> Option<&VideoMeta> {
        self.meta.as_ref()
    }

    fn accept_meta(&mut self, meta: VideoMeta) {
        if !meta.duration.is_finite() || meta.duration <= 0.0 {
            self.fail(format!("video has no usable duration ({})", meta.duration));
            return;
        }
        match (meta.frame_rate, self.configured_rate) {
            (Some(probed), None) if probed != self.frame_rate => {
                debug!(rate = probed.per_second(), "stepping at the probed frame rate");
                self.frame_rate = probed;
                self.cache = FrameCache::new(FRAME_CACHE_CAPACITY, probed.frame_seconds());
            }
            (Some(probed), Some(configured)) if probed != configured => {
                debug!(
                    probed = probed.per_second(),
                    configured = configured.per_second(),
                    "configured frame rate overrides the probed one"
                );
            }
            _ => {}
        }
        info!(
            duration = meta.duration,
            width = meta.width,
            height = meta.height,
            "video metadata loaded"
        );
        self.meta = Some(meta);
    }

    fn fail(&mut self, reason: String) {
        warn!(%reason, "video failed to load");
        self.failure = Some(reason);
    }

    fn ready_extent(&self) -> Result<f64> {
        self.meta
            .as_ref()
            .map(|meta| meta.duration)
            .ok_or(EngineError::MediaNotReady)
    }
}

impl<S: VideoSource> MediaBackend for VideoBackend<S> {
    fn poll_load(&mut self) -> LoadStatus {
        if self.meta.is_some() {
            return LoadStatus::Ready;
        }
        if let Some(reason) = &self.failure {
            return LoadStatus::Failed {
                reason: reason.clone(),
            };
        }
        let Some(loader) = &self.loader else {
            return LoadStatus::Failed {
                reason: "video backend was released".to_owned(),
            };
        };

        match loader.try_recv() {
            Ok(Ok(meta)) => {
                self.loader = None;
                self.accept_meta(meta);
            }
            Ok(Err(err)) => {
                self.loader = None;
                self.fail(err.to_string());
            }
            Err(TryRecvError::Empty) => return LoadStatus::Loading { done: 0, total: 1 },
            Err(TryRecvError::Disconnected) => {
                self.loader = None;
                self.fail("video loader stopped without a result".to_owned());
            }
        }
        self.poll_load()
    }

    fn is_ready(&self) -> bool {
        self.meta.is_some()
    }

    fn extent(&self) -> Option<f64> {
        self.meta.as_ref().map(|meta| meta.duration)
    }

    fn step_size(&self) -> f64 {
        self.frame_rate.frame_seconds()
    }

    fn step_interval(&self) -> Duration {
        self.frame_rate.frame_interval()
    }

    fn default_tolerance(&self) -> f64 {
        self.tolerance
    }

    fn position(&self) -> f64 {
        self.current_time
    }

    fn seek_to(&mut self, position: f64) -> Result<()> {
        let extent = self.ready_extent()?;
        self.current_time = clamp_position(position, extent)?;
        Ok(())
    }

    fn start_native(&mut self, rate: f64) -> Result<()> {
        self.ready_extent()?;
        let supported =
            rate.is_finite() && rate != 0.0 && (rate > 0.0 || self.source.supports_reverse());
        if !supported {
            return Err(EngineError::NativePlaybackUnsupported { rate });
        }
        self.rate = rate;
        self.playing = true;
        Ok(())
    }

    fn stop_native(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn advance(&mut self, elapsed: Duration) {
        if !self.playing {
            return;
        }
        let Some(duration) = self.extent() else {
            return;
        };
        let next = self.current_time + self.rate * elapsed.as_secs_f64();
        if next >= duration {
            self.current_time = duration;
            self.playing = false;
        } else if next <= 0.0 {
            self.current_time = 0.0;
            self.playing = false;
        } else {
            self.current_time = next;
        }
    }

    fn current_frame(&mut self) -> Option<Frame> {
        let meta = self.meta.as_ref()?;
        if let Some(frame) = self.cache.get(self.current_time) {
            self.last_frame = Some(frame.clone());
            return Some(frame);
        }

        match self.source.decode_frame(self.current_time, meta) {
            Ok(frame) => {
                self.cache.insert(self.current_time, frame.clone());
                self.last_frame = Some(frame.clone());
                Some(frame)
            }
            Err(err) => {
                warn!(at = self.current_time, error = %err, "video frame decode failed");
                self.last_frame.clone()
            }
        }
    }

    fn release(&mut self) {
        self.loader = None;
        self.meta = None;
        self.playing = false;
        self.cache.clear();
        self.last_frame = None;
        self.failure = Some("video backend was released".to_owned());
    }
}
