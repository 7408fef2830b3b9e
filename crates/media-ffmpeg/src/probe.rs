use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::{MediaFfmpegError, Result};
use crate::time::Rational;

/// Metadata of the first video stream of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<Rational>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probes the first video stream via `ffprobe -of json`.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::probe_video;
///
/// let probe = probe_video("hero.mp4").expect("probe should succeed");
/// assert!(probe.duration_seconds > 0.0);
/// ```
pub fn probe_video(path: impl AsRef<Path>) -> Result<VideoProbe> {
    let path = path.as_ref();
    let stdout = run_ffprobe(path)?;
    parse_probe_output(path, &stdout)
}

/// Probes only the pixel dimensions; still images often report no duration.
pub fn probe_dimensions(path: impl AsRef<Path>) -> Result<(u32, u32)> {
    let path = path.as_ref();
    let stdout = run_ffprobe(path)?;
    let (stream, _) = parse_first_stream(path, &stdout)?;
    dimensions(path, &stream)
}

fn run_ffprobe(path: &Path) -> Result<Vec<u8>> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffprobe",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffprobe {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}

/// Parses `ffprobe -of json` output for a single video stream.
///
/// The container duration wins over the stream duration when both exist.
pub fn parse_probe_output(path: &Path, json: &[u8]) -> Result<VideoProbe> {
    let (stream, format) = parse_first_stream(path, json)?;
    let (width, height) = dimensions(path, &stream)?;

    let duration_seconds = format
        .and_then(|format| format.duration)
        .filter(|raw| raw != "N/A")
        .or(stream.duration.filter(|raw| raw != "N/A"))
        .as_deref()
        .map(parse_seconds)
        .transpose()?
        .ok_or_else(|| MediaFfmpegError::Parse {
            context: "duration",
            value: "no duration reported".to_string(),
        })?;

    let frame_rate = [stream.avg_frame_rate, stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|raw| Rational::parse(&raw).ok());

    Ok(VideoProbe {
        path: path.to_path_buf(),
        duration_seconds,
        width,
        height,
        frame_rate,
    })
}

fn parse_first_stream(path: &Path, json: &[u8]) -> Result<(ProbeStream, Option<ProbeFormat>)> {
    let parsed: ProbeOutput =
        serde_json::from_slice(json).map_err(|source| MediaFfmpegError::Json {
            context: "ffprobe output",
            source,
        })?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MediaFfmpegError::MissingVideoStream(path.to_path_buf()))?;
    Ok((stream, parsed.format))
}

fn dimensions(path: &Path, stream: &ProbeStream) -> Result<(u32, u32)> {
    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(MediaFfmpegError::MissingVideoDimensions(path.to_path_buf())),
    }
}

fn parse_seconds(raw: &str) -> Result<f64> {
    let value = raw.trim().parse::<f64>().map_err(|_| MediaFfmpegError::Parse {
        context: "duration seconds",
        value: raw.to_string(),
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(MediaFfmpegError::InvalidTimestampSeconds(value));
    }
    Ok(value)
}
