use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Frame, LoadStatus, MediaBackend, clamp_position};
use crate::error::{EngineError, Result};
use crate::time::FrameRate;

/// Naming scheme of a still-image sequence.
///
/// Frame `i` (0-based) lives at
/// `{dir}/{prefix}{first_number + i, zero-padded to pad_width}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePattern {
    pub dir: PathBuf,
    #[serde(default)]
    pub prefix: String,
    pub extension: String,
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
    #[serde(default = "default_first_number")]
    pub first_number: u32,
    pub frame_count: usize,
}

fn default_pad_width() -> usize {
    3
}

fn default_first_number() -> u32 {
    1
}

impl FramePattern {
    /// Path of the frame at 0-based `index`.
    ///
    /// # Example
    /// ```
    /// use std::path::Path;
    ///
    /// use engine::FramePattern;
    ///
    /// let pattern = FramePattern {
    ///     dir: "frames".into(),
    ///     prefix: "scene-1-".to_owned(),
    ///     extension: "avif".to_owned(),
    ///     pad_width: 3,
    ///     first_number: 1,
    ///     frame_count: 231,
    /// };
    /// assert_eq!(pattern.path_for(0), Path::new("frames/scene-1-001.avif"));
    /// ```
    pub fn path_for(&self, index: usize) -> PathBuf {
        let number = u64::from(self.first_number) + index as u64;
        self.dir.join(format!(
            "{}{:0width$}.{}",
            self.prefix,
            number,
            self.extension,
            width = self.pad_width
        ))
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(EngineError::InvalidFramePattern {
                reason: "frame_count must be positive",
            });
        }
        if self.extension.is_empty() || self.extension.contains('/') {
            return Err(EngineError::InvalidFramePattern {
                reason: "extension must be a bare file extension",
            });
        }
        Ok(())
    }
}

/// Decodes one still image into an RGBA frame.
pub trait FrameDecoder: Send + Sync + 'static {
    fn decode(&self, path: &Path) -> Result<Frame>;
}

/// FFmpeg CLI-backed still-image decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegFrameDecoder;

impl FrameDecoder for FfmpegFrameDecoder {
    fn decode(&self, path: &Path) -> Result<Frame> {
        let image = media_ffmpeg::decode_still_image(path)?;
        Ok(Frame {
            width: image.width,
            height: image.height,
            bytes: Arc::from(image.rgba),
        })
    }
}

enum LoaderMessage {
    Loaded { index: usize, frame: Frame },
    Failed { index: usize, path: PathBuf, reason: String },
}

/// Preloaded still-image sequence addressed by frame index.
///
/// The sequence becomes ready once every frame has been attempted and at
/// least one decoded. Missing frames are drawn as their nearest loaded
/// neighbor.
pub struct FrameSequenceBackend {
    pattern: FramePattern,
    frame_rate: FrameRate,
    frames: Vec<Option<Frame>>,
    settled: usize,
    failed: usize,
    loader: Option<Receiver<LoaderMessage>>,
    cancel: Arc<AtomicBool>,
    failure: Option<String>,
    position: f64,
}

impl FrameSequenceBackend {
    /// Validates `pattern` and starts decoding every frame in the background.
    pub fn new<D: FrameDecoder>(
        pattern: FramePattern,
        decoder: D,
        frame_rate: FrameRate,
    ) -> Result<Self> {
        pattern.validate()?;

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let loader_pattern = pattern.clone();
        let loader_cancel = Arc::clone(&cancel);
        let spawned = thread::Builder::new()
            .name("frame-sequence-loader".to_owned())
            .spawn(move || {
                for index in 0..loader_pattern.frame_count {
                    if loader_cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    let path = loader_pattern.path_for(index);
                    let message = match decoder.decode(&path) {
                        Ok(frame) => LoaderMessage::Loaded { index, frame },
                        Err(err) => LoaderMessage::Failed {
                            index,
                            path,
                            reason: err.to_string(),
                        },
                    };
                    if tx.send(message).is_err() {
                        return;
                    }
                }
            });

        let (loader, failure) = match spawned {
            Ok(_) => (Some(rx), None),
            Err(err) => (None, Some(format!("failed to spawn frame loader: {err}"))),
        };

        Ok(Self {
            frames: vec![None; pattern.frame_count],
            pattern,
            frame_rate,
            settled: 0,
            failed: 0,
            loader,
            cancel,
            failure,
            position: 0.0,
        })
    }

    pub fn pattern(&self) -> &FramePattern {
        &self.pattern
    }

    pub fn frame_count(&self) -> usize {
        self.pattern.frame_count
    }

    /// Index of the frame drawn for `index`: itself when loaded, otherwise
    /// the nearest loaded neighbor with the earlier one winning ties.
    pub fn resolve_frame_index(&self, index: usize) -> Option<usize> {
        let last = self.frames.len().checked_sub(1)?;
        let index = index.min(last);
        if self.frames[index].is_some() {
            return Some(index);
        }
        (1..=last).find_map(|distance| {
            let earlier = index
                .checked_sub(distance)
                .filter(|candidate| self.frames[*candidate].is_some());
            let later = index
                .checked_add(distance)
                .filter(|candidate| *candidate <= last && self.frames[*candidate].is_some());
            earlier.or(later)
        })
    }

    fn drain_loader(&mut self) {
        let Some(loader) = &self.loader else {
            return;
        };
        let mut disconnected = false;
        let mut messages = Vec::new();
        loop {
            match loader.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        for message in messages {
            self.settled += 1;
            match message {
                LoaderMessage::Loaded { index, frame } => self.frames[index] = Some(frame),
                LoaderMessage::Failed {
                    index,
                    path,
                    reason,
                } => {
                    self.failed += 1;
                    warn!(index, path = %path.display(), %reason, "failed to load frame");
                }
            }
        }

        let total = self.pattern.frame_count;
        if self.settled >= total {
            self.loader = None;
            if self.failed >= total {
                self.failure = Some(format!("all {total} frames failed to load"));
                warn!(total, "frame sequence failed to load");
            } else {
                info!(total, failed = self.failed, "frame sequence loaded");
            }
        } else if disconnected {
            self.loader = None;
            self.failure = Some(format!(
                "frame loader stopped after {} of {total} frames",
                self.settled
            ));
        }
    }

    fn ready_extent(&self) -> Result<f64> {
        self.extent().ok_or(EngineError::MediaNotReady)
    }
}

impl MediaBackend for FrameSequenceBackend {
    fn poll_load(&mut self) -> LoadStatus {
        self.drain_loader();
        if let Some(reason) = &self.failure {
            return LoadStatus::Failed {
                reason: reason.clone(),
            };
        }
        if self.is_ready() {
            LoadStatus::Ready
        } else {
            LoadStatus::Loading {
                done: self.settled,
                total: self.pattern.frame_count,
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.failure.is_none() && self.loader.is_none() && self.settled >= self.pattern.frame_count
    }

    fn extent(&self) -> Option<f64> {
        self.is_ready()
            .then(|| self.pattern.frame_count.saturating_sub(1) as f64)
    }

    fn step_size(&self) -> f64 {
        1.0
    }

    fn step_interval(&self) -> Duration {
        self.frame_rate.frame_interval()
    }

    fn default_tolerance(&self) -> f64 {
        1.0
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn seek_to(&mut self, position: f64) -> Result<()> {
        let extent = self.ready_extent()?;
        self.position = clamp_position(position, extent)?;
        Ok(())
    }

    fn start_native(&mut self, rate: f64) -> Result<()> {
        Err(EngineError::NativePlaybackUnsupported { rate })
    }

    fn stop_native(&mut self) {}

    fn is_playing(&self) -> bool {
        false
    }

    fn advance(&mut self, _elapsed: Duration) {}

    fn current_frame(&mut self) -> Option<Frame> {
        if !self.is_ready() {
            return None;
        }
        let index = self.resolve_frame_index(self.position.round() as usize)?;
        self.frames[index].clone()
    }

    fn release(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.loader = None;
        self.frames.iter_mut().for_each(|frame| *frame = None);
        self.failure = Some("frame sequence was released".to_owned());
    }
}

impl Drop for FrameSequenceBackend {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use super::{FrameDecoder, FramePattern, FrameSequenceBackend};
    use crate::error::{EngineError, Result};
    use crate::media::{Frame, LoadStatus, MediaBackend};
    use crate::time::FrameRate;

    #[derive(Clone, Default)]
    struct MockDecoder {
        failing: Vec<usize>,
        decoded: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl FrameDecoder for MockDecoder {
        fn decode(&self, path: &Path) -> Result<Frame> {
            self.decoded
                .lock()
                .expect("decoded lock should not be poisoned")
                .push(path.to_path_buf());
            let number: usize = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.trim_start_matches("f-").parse().ok())
                .expect("mock frame names carry a number");
            if self.failing.contains(&number) {
                return Err(EngineError::LoadFailed {
                    reason: format!("frame {number} is corrupt"),
                });
            }
            Ok(Frame {
                width: 1,
                height: 1,
                bytes: Arc::from(vec![number as u8; 4]),
            })
        }
    }

    fn pattern(frame_count: usize) -> FramePattern {
        FramePattern {
            dir: PathBuf::from("frames"),
            prefix: "f-".to_owned(),
            extension: "png".to_owned(),
            pad_width: 2,
            first_number: 0,
            frame_count,
        }
    }

    fn settle(backend: &mut FrameSequenceBackend) -> LoadStatus {
        for _ in 0..500 {
            match backend.poll_load() {
                LoadStatus::Loading { .. } => thread::sleep(Duration::from_millis(2)),
                status => return status,
            }
        }
        panic!("frame sequence never settled");
    }

    #[test]
    fn loads_every_frame_in_order_and_reports_last_index_as_extent() {
        let decoder = MockDecoder::default();
        let decoded = Arc::clone(&decoder.decoded);
        let mut backend = FrameSequenceBackend::new(pattern(4), decoder, FrameRate::DEFAULT)
            .expect("pattern should be valid");

        assert_eq!(settle(&mut backend), LoadStatus::Ready);
        assert_eq!(backend.extent(), Some(3.0));

        let decoded = decoded.lock().expect("decoded lock should not be poisoned");
        assert_eq!(decoded.first(), Some(&PathBuf::from("frames/f-00.png")));
        assert_eq!(decoded.last(), Some(&PathBuf::from("frames/f-03.png")));
    }

    #[test]
    fn missing_frame_draws_nearest_neighbor_preferring_the_earlier_one() {
        let decoder = MockDecoder {
            failing: vec![2, 4, 5],
            ..MockDecoder::default()
        };
        let mut backend = FrameSequenceBackend::new(pattern(7), decoder, FrameRate::DEFAULT)
            .expect("pattern should be valid");
        assert_eq!(settle(&mut backend), LoadStatus::Ready);

        backend.seek_to(2.0).expect("seek should succeed");
        let frame = backend.current_frame().expect("neighbor should be drawn");
        assert_eq!(frame.bytes[0], 1);

        assert_eq!(backend.resolve_frame_index(4), Some(3));
        assert_eq!(backend.resolve_frame_index(5), Some(6));
    }

    #[test]
    fn all_frames_failing_never_becomes_ready() {
        let decoder = MockDecoder {
            failing: vec![0, 1, 2],
            ..MockDecoder::default()
        };
        let mut backend = FrameSequenceBackend::new(pattern(3), decoder, FrameRate::DEFAULT)
            .expect("pattern should be valid");

        assert!(matches!(settle(&mut backend), LoadStatus::Failed { .. }));
        assert!(!backend.is_ready());
        assert!(matches!(
            backend.seek_to(1.0),
            Err(EngineError::MediaNotReady)
        ));
    }

    #[test]
    fn native_playback_is_unsupported() {
        let mut backend =
            FrameSequenceBackend::new(pattern(2), MockDecoder::default(), FrameRate::DEFAULT)
                .expect("pattern should be valid");
        assert!(matches!(
            backend.start_native(1.0),
            Err(EngineError::NativePlaybackUnsupported { .. })
        ));
    }

    #[test]
    fn release_drops_frames_and_readiness() {
        let mut backend =
            FrameSequenceBackend::new(pattern(2), MockDecoder::default(), FrameRate::DEFAULT)
                .expect("pattern should be valid");
        assert_eq!(settle(&mut backend), LoadStatus::Ready);

        backend.release();
        assert!(!backend.is_ready());
        assert!(backend.current_frame().is_none());
        assert!(matches!(backend.poll_load(), LoadStatus::Failed { .. }));
    }

    #[test]
    fn rejects_empty_pattern() {
        let result = FrameSequenceBackend::new(pattern(0), MockDecoder::default(), FrameRate::DEFAULT);
        assert!(matches!(
            result,
            Err(EngineError::InvalidFramePattern { .. })
        ));
    }
}
