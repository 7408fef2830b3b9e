use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by scene configuration, media backends and the stage.
#[derive(Debug)]
pub enum EngineError {
    EmptySceneTable,
    SceneIndexMismatch {
        expected: usize,
        found: usize,
    },
    SceneOrder {
        index: usize,
        previous: f64,
        position: f64,
    },
    InvalidPosition(f64),
    InvalidFrameRate {
        num: u32,
        den: u32,
    },
    InvalidFramePattern {
        reason: &'static str,
    },
    NativePlaybackUnsupported {
        rate: f64,
    },
    MediaNotReady,
    LoadFailed {
        reason: String,
    },
    StageTornDown,
    ConfigIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    Media(media_ffmpeg::MediaFfmpegError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySceneTable => write!(f, "scene table is empty"),
            Self::SceneIndexMismatch { expected, found } => {
                write!(f, "scene index {found} found where {expected} was expected")
            }
            Self::SceneOrder {
                index,
                previous,
                position,
            } => write!(
                f,
                "scene {index} at {position} does not come after the previous scene at {previous}"
            ),
            Self::InvalidPosition(position) => write!(f, "invalid timeline position: {position}"),
            Self::InvalidFrameRate { num, den } => write!(f, "invalid frame rate {num}/{den}"),
            Self::InvalidFramePattern { reason } => write!(f, "invalid frame pattern: {reason}"),
            Self::NativePlaybackUnsupported { rate } => {
                write!(f, "native playback at rate {rate} is not supported")
            }
            Self::MediaNotReady => write!(f, "media is not loaded yet"),
            Self::LoadFailed { reason } => write!(f, "media failed to load: {reason}"),
            Self::StageTornDown => write!(f, "stage has been torn down"),
            Self::ConfigIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::ConfigSerialization { path, source } => {
                write!(
                    f,
                    "stage config deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::Media(err) => write!(f, "media backend error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigSerialization { source, .. } => Some(source),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<media_ffmpeg::MediaFfmpegError> for EngineError {
    fn from(value: media_ffmpeg::MediaFfmpegError) -> Self {
        Self::Media(value)
    }
}
