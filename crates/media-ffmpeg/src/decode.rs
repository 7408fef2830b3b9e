use std::path::Path;
use std::process::Command;

use crate::error::{MediaFfmpegError, Result};
use crate::probe::probe_dimensions;

/// A decoded RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decodes the video frame shown at `at_seconds`.
///
/// `width` and `height` are the stream dimensions reported by [`probe_video`];
/// passing them avoids probing the file again for every frame.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::decode_video_frame_at;
///
/// let frame = decode_video_frame_at("hero.mp4", 7.12, 1920, 1080)
///     .expect("decode should succeed");
/// assert_eq!(frame.rgba.len(), 1920 * 1080 * 4);
/// ```
pub fn decode_video_frame_at(
    path: impl AsRef<Path>,
    at_seconds: f64,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    if !at_seconds.is_finite() || at_seconds < 0.0 {
        return Err(MediaFfmpegError::InvalidTimestampSeconds(at_seconds));
    }

    let path = path.as_ref();
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-v", "error", "-ss"])
        .arg(format!("{at_seconds:.6}"))
        .arg("-i")
        .arg(path)
        .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffmpeg decode frame",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffmpeg -ss {at_seconds:.6} {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    into_image(width, height, output.stdout)
}

/// Decodes one still image (AVIF, JPEG, PNG, ...) into RGBA.
pub fn decode_still_image(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    let (width, height) = probe_dimensions(path)?;
    decode_video_frame_at(path, 0.0, width, height)
}

fn into_image(width: u32, height: u32, rgba: Vec<u8>) -> Result<RgbaImage> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(MediaFfmpegError::UnexpectedFrameSize {
            expected,
            actual: rgba.len(),
        });
    }
    Ok(RgbaImage {
        width,
        height,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::into_image;
    use crate::error::MediaFfmpegError;

    #[test]
    fn rejects_truncated_raw_frames() {
        let result = into_image(2, 2, vec![0; 15]);
        assert!(matches!(
            result,
            Err(MediaFfmpegError::UnexpectedFrameSize {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn rejects_negative_timestamps() {
        let result = super::decode_video_frame_at("missing.mp4", -1.0, 1, 1);
        assert!(matches!(
            result,
            Err(MediaFfmpegError::InvalidTimestampSeconds(_))
        ));
    }
}
