use crate::error::{MediaFfmpegError, Result};

/// Rational value as reported by `ffprobe` (`r_frame_rate`, `avg_frame_rate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Creates a strictly positive rational.
    pub fn new(num: i32, den: i32) -> Result<Self> {
        if num <= 0 || den <= 0 {
            return Err(MediaFfmpegError::InvalidRational { num, den });
        }
        Ok(Self { num, den })
    }

    /// Parses a `num/den` text.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::Rational;
    ///
    /// let rate = Rational::parse("30000/1001").expect("valid");
    /// assert!((rate.as_f64() - 29.97).abs() < 0.01);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let (num, den) = input
            .trim()
            .split_once('/')
            .ok_or_else(|| MediaFfmpegError::Parse {
                context: "rational",
                value: input.to_string(),
            })?;
        let num = parse_i32(num, "rational num")?;
        let den = parse_i32(den, "rational den")?;
        Self::new(num, den)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

fn parse_i32(value: &str, context: &'static str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| MediaFfmpegError::Parse {
            context,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::Rational;

    #[test]
    fn parse_rejects_zero_denominator() {
        assert!(Rational::parse("25/0").is_err());
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(Rational::parse("25").is_err());
    }
}
