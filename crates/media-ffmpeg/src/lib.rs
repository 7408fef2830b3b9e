//! Thin FFmpeg CLI wrapper used by the scene engine's media backends.

mod decode;
mod error;
mod probe;
mod time;

pub use decode::{RgbaImage, decode_still_image, decode_video_frame_at};
pub use error::{MediaFfmpegError, Result};
pub use probe::{VideoProbe, parse_probe_output, probe_dimensions, probe_video};
pub use time::Rational;

/// Returns true when both `ffmpeg` and `ffprobe` can be spawned.
pub fn tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}
