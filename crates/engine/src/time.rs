use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Positions closer than this are treated as the same timeline coordinate.
pub const POSITION_EPSILON: f64 = 1e-9;

/// Authored frame rate of the source media; drives the stepping cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FrameRateRepr", into = "FrameRateRepr")]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum FrameRateRepr {
    Whole(u32),
    Ratio { num: u32, den: u32 },
}

impl FrameRate {
    /// 25 frames per second, the cadence the hero videos were authored at.
    pub const DEFAULT: Self = Self { num: 25, den: 1 };

    /// Creates a validated frame rate.
    ///
    /// # Example
    /// ```
    /// use engine::FrameRate;
    ///
    /// let rate = FrameRate::new(30_000, 1_001).expect("valid");
    /// assert!((rate.per_second() - 29.97).abs() < 0.01);
    /// ```
    pub fn new(num: u32, den: u32) -> Result<Self> {
        if num == 0 || den == 0 {
            return Err(EngineError::InvalidFrameRate { num, den });
        }
        Ok(Self { num, den })
    }

    pub fn per_second(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Length of one frame in seconds.
    pub fn frame_seconds(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Wall-clock interval between two steps at this rate.
    pub fn frame_interval(self) -> Duration {
        Duration::from_secs_f64(self.frame_seconds())
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<FrameRateRepr> for FrameRate {
    type Error = EngineError;

    fn try_from(value: FrameRateRepr) -> Result<Self> {
        match value {
            FrameRateRepr::Whole(num) => Self::new(num, 1),
            FrameRateRepr::Ratio { num, den } => Self::new(num, den),
        }
    }
}

impl From<FrameRate> for FrameRateRepr {
    fn from(value: FrameRate) -> Self {
        if value.den == 1 {
            Self::Whole(value.num)
        } else {
            Self::Ratio {
                num: value.num,
                den: value.den,
            }
        }
    }
}

impl TryFrom<media_ffmpeg::Rational> for FrameRate {
    type Error = EngineError;

    fn try_from(value: media_ffmpeg::Rational) -> Result<Self> {
        let num = u32::try_from(value.num).unwrap_or(0);
        let den = u32::try_from(value.den).unwrap_or(0);
        Self::new(num, den)
    }
}

/// Number of discrete steps needed to cover `from..to` with `step`.
///
/// The final step may be shorter than `step`; it always lands on `to`.
///
/// # Example
/// ```
/// use engine::time::step_count;
///
/// assert_eq!(step_count(10.0, 7.12, 1.0 / 25.0), 72);
/// ```
pub fn step_count(from: f64, to: f64, step: f64) -> u64 {
    let distance = (to - from).abs();
    if distance <= POSITION_EPSILON || step <= 0.0 {
        return 0;
    }
    // Tolerates float noise such as 2.88 / 0.04 = 72.00000000000001.
    (distance / step - POSITION_EPSILON).ceil().max(1.0) as u64
}

/// Position after step `k` of `total`, moving from `from` towards `to`.
pub fn step_position(from: f64, to: f64, step: f64, k: u64, total: u64) -> f64 {
    if k >= total {
        return to;
    }
    let signed = if to >= from { step } else { -step };
    from + signed * k as f64
}
