use std::time::Duration;

use crate::time::POSITION_EPSILON;

const SETTLE_DISTANCE: f64 = 1e-3;

/// Maps page-scroll progress onto a timeline position.
///
/// Without a lag every progress update seeks immediately. With a lag the
/// rendered position eases towards the target on each tick by
/// `1 - e^(-dt / lag)`.
///
/// # Example
/// ```
/// use engine::ContinuousScrub;
///
/// let mut scrub = ContinuousScrub::new(None, true);
/// assert_eq!(scrub.set_progress(0.5, 230.0), Some(115.0));
/// assert_eq!(scrub.set_progress(0.5, 230.0), None);
/// ```
#[derive(Debug, Clone)]
pub struct ContinuousScrub {
    lag: Option<Duration>,
    snap_to_frames: bool,
    target: Option<f64>,
    rendered: f64,
    last_emitted: Option<f64>,
    last_tick: Option<Duration>,
}

impl ContinuousScrub {
    /// `snap_to_frames` rounds every emitted position to a whole frame.
    pub fn new(lag: Option<Duration>, snap_to_frames: bool) -> Self {
        Self {
            lag: lag.filter(|lag| !lag.is_zero()),
            snap_to_frames,
            target: None,
            rendered: 0.0,
            last_emitted: None,
            last_tick: None,
        }
    }

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.target
            .is_none_or(|target| (target - self.rendered).abs() <= POSITION_EPSILON)
    }

    /// Sets the position the scrub starts easing from.
    pub fn reset_to(&mut self, position: f64) {
        self.rendered = position;
        self.last_emitted = Some(self.output(position));
        self.target = None;
    }

    /// Records new scroll progress.
    ///
    /// Returns the position to seek right away when unsmoothed and the target
    /// moved; smoothed scrubs return `None` and move on [`Self::advance`].
    pub fn set_progress(&mut self, progress: f64, extent: f64) -> Option<f64> {
        if !progress.is_finite() || !extent.is_finite() {
            return None;
        }
        let target = self.output(progress.clamp(0.0, 1.0) * extent.max(0.0));
        self.target = Some(target);
        if self.lag.is_some() {
            return None;
        }
        self.rendered = target;
        self.emit(target)
    }

    /// Eases towards the target; returns the new position when it changed.
    pub fn advance(&mut self, now: Duration) -> Option<f64> {
        let last_tick = self.last_tick.replace(now);
        let (Some(lag), Some(target)) = (self.lag, self.target) else {
            return None;
        };
        let elapsed = now.saturating_sub(last_tick?).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }

        let alpha = 1.0 - (-elapsed / lag.as_secs_f64()).exp();
        self.rendered += (target - self.rendered) * alpha;
        if (target - self.rendered).abs() < SETTLE_DISTANCE {
            self.rendered = target;
        }
        let position = self.output(self.rendered);
        self.emit(position)
    }

    fn output(&self, position: f64) -> f64 {
        if self.snap_to_frames {
            position.round()
        } else {
            position
        }
    }

    fn emit(&mut self, position: f64) -> Option<f64> {
        if self
            .last_emitted
            .is_some_and(|last| (last - position).abs() <= POSITION_EPSILON)
        {
            return None;
        }
        self.last_emitted = Some(position);
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ContinuousScrub;

    #[test]
    fn unsmoothed_video_scrub_maps_progress_linearly() {
        let mut scrub = ContinuousScrub::new(None, false);
        assert_eq!(scrub.set_progress(0.25, 35.0), Some(8.75));
        assert_eq!(scrub.set_progress(2.0, 35.0), Some(35.0));
        assert_eq!(scrub.set_progress(2.0, 35.0), None);
    }

    #[test]
    fn frame_scrub_skips_updates_within_the_same_frame() {
        let mut scrub = ContinuousScrub::new(None, true);
        assert_eq!(scrub.set_progress(0.1, 100.0), Some(10.0));
        assert_eq!(scrub.set_progress(0.102, 100.0), None);
        assert_eq!(scrub.set_progress(0.11, 100.0), Some(11.0));
    }

    #[test]
    fn smoothed_scrub_eases_monotonically_and_settles() {
        let mut scrub = ContinuousScrub::new(Some(Duration::from_millis(1_500)), false);
        scrub.reset_to(0.0);
        assert_eq!(scrub.set_progress(1.0, 10.0), None);
        assert_eq!(scrub.advance(Duration::ZERO), None);

        let mut now = Duration::ZERO;
        let mut positions = Vec::new();
        for _ in 0..2_000 {
            now += Duration::from_millis(16);
            if let Some(position) = scrub.advance(now) {
                positions.push(position);
            }
        }

        assert!(positions.windows(2).all(|pair| pair[1] > pair[0]));
        assert_eq!(positions.last().copied(), Some(10.0));
        assert!(scrub.is_settled());
        let first = positions[0];
        let expected = 10.0 * (1.0 - (-0.016_f64 / 1.5).exp());
        assert!((first - expected).abs() < 1e-9);
    }
}
