use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, MediaFfmpegError>;

/// Error type for probing/decoding operations backed by FFmpeg CLI tools.
#[derive(Debug)]
pub enum MediaFfmpegError {
    InvalidRational {
        num: i32,
        den: i32,
    },
    InvalidTimestampSeconds(f64),
    MissingVideoStream(PathBuf),
    MissingVideoDimensions(PathBuf),
    UnexpectedFrameSize {
        expected: usize,
        actual: usize,
    },
    Io {
        context: &'static str,
        source: std::io::Error,
    },
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    Json {
        context: &'static str,
        source: serde_json::Error,
    },
    Parse {
        context: &'static str,
        value: String,
    },
}

impl Display for MediaFfmpegError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRational { num, den } => write!(f, "invalid rational {num}/{den}"),
            Self::InvalidTimestampSeconds(value) => {
                write!(f, "invalid timestamp seconds: {value}")
            }
            Self::MissingVideoStream(path) => {
                write!(f, "video stream not found: {}", path.display())
            }
            Self::MissingVideoDimensions(path) => {
                write!(f, "video dimensions missing: {}", path.display())
            }
            Self::UnexpectedFrameSize { expected, actual } => {
                write!(f, "decoded frame has {actual} bytes, expected {expected}")
            }
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::CommandFailed {
                command,
                status,
                stderr,
            } => write!(
                f,
                "command failed ({status}): {command}; stderr: {}",
                stderr.trim()
            ),
            Self::Json { context, source } => write!(f, "json error ({context}): {source}"),
            Self::Parse { context, value } => write!(f, "parse error ({context}): {value}"),
        }
    }
}

impl std::error::Error for MediaFfmpegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
