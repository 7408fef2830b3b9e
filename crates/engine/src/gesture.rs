use serde::{Deserialize, Serialize};

use crate::transport::Direction;

/// Raw input as delivered by the host, in browser conventions: positive
/// `delta_y` scrolls down, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    Wheel {
        delta_y: f64,
    },
    TouchStart {
        y: f64,
    },
    TouchMove {
        y: f64,
    },
    TouchEnd,
    PageScroll {
        container_top: f64,
        container_height: f64,
        viewport_height: f64,
    },
}

/// How a stage turns gestures into media movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// One gesture moves exactly one scene.
    #[default]
    Discrete,
    /// Gestures add velocity to a free-scrubbing frame position.
    Momentum,
    /// Page scroll progress maps directly onto the timeline.
    Continuous,
}

/// Normalized output of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Step(Direction),
    Impulse(f64),
    Progress(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Touch travel in pixels before a discrete step fires.
    pub touch_threshold: f64,
    pub wheel_sensitivity: f64,
    pub touch_sensitivity: f64,
    pub wheel_impulse_threshold: f64,
    pub touch_impulse_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_threshold: 30.0,
            wheel_sensitivity: 0.015,
            touch_sensitivity: 0.08,
            wheel_impulse_threshold: 1.0,
            touch_impulse_threshold: 2.0,
        }
    }
}

/// Folds wheel, touch and page-scroll events into one [`Signal`] stream.
#[derive(Debug, Clone)]
pub struct GestureAggregator {
    mode: InputMode,
    config: GestureConfig,
    last_touch_y: Option<f64>,
}

impl GestureAggregator {
    pub fn new(mode: InputMode, config: GestureConfig) -> Self {
        Self {
            mode,
            config,
            last_touch_y: None,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Consumes one event. Nothing is emitted while a modal overlay is open.
    ///
    /// # Example
    /// ```
    /// use engine::{Direction, GestureAggregator, GestureConfig, GestureEvent, InputMode, Signal};
    ///
    /// let mut gestures = GestureAggregator::new(InputMode::Discrete, GestureConfig::default());
    /// assert_eq!(
    ///     gestures.handle(GestureEvent::Wheel { delta_y: 120.0 }, false),
    ///     Some(Signal::Step(Direction::Forward))
    /// );
    /// ```
    pub fn handle(&mut self, event: GestureEvent, modal_open: bool) -> Option<Signal> {
        if modal_open {
            return None;
        }
        match event {
            GestureEvent::Wheel { delta_y } => self.wheel(delta_y),
            GestureEvent::TouchStart { y } => {
                self.last_touch_y = Some(y);
                None
            }
            GestureEvent::TouchMove { y } => self.touch_move(y),
            GestureEvent::TouchEnd => {
                self.last_touch_y = None;
                None
            }
            GestureEvent::PageScroll {
                container_top,
                container_height,
                viewport_height,
            } => (self.mode == InputMode::Continuous).then(|| {
                Signal::Progress(scroll_progress(
                    container_top,
                    container_height,
                    viewport_height,
                ))
            }),
        }
    }

    fn wheel(&mut self, delta_y: f64) -> Option<Signal> {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return None;
        }
        match self.mode {
            InputMode::Discrete => Some(Signal::Step(Direction::from_forward(delta_y > 0.0))),
            InputMode::Momentum => (delta_y.abs() >= self.config.wheel_impulse_threshold)
                .then(|| Signal::Impulse(delta_y * self.config.wheel_sensitivity)),
            InputMode::Continuous => None,
        }
    }

    fn touch_move(&mut self, y: f64) -> Option<Signal> {
        let last_y = self.last_touch_y?;
        let delta = last_y - y;
        match self.mode {
            InputMode::Discrete => {
                if delta.abs() <= self.config.touch_threshold {
                    return None;
                }
                self.last_touch_y = Some(y);
                Some(Signal::Step(Direction::from_forward(delta > 0.0)))
            }
            InputMode::Momentum => {
                if delta.abs() < self.config.touch_impulse_threshold {
                    return None;
                }
                self.last_touch_y = Some(y);
                Some(Signal::Impulse(delta * self.config.touch_sensitivity))
            }
            InputMode::Continuous => None,
        }
    }
}

/// Fraction of a tall container scrolled past the top of the viewport.
///
/// Returns 0 when the container is not taller than the viewport.
pub fn scroll_progress(container_top: f64, container_height: f64, viewport_height: f64) -> f64 {
    let scrollable = container_height - viewport_height;
    if !scrollable.is_finite() || scrollable <= 0.0 || !container_top.is_finite() {
        return 0.0;
    }
    (-container_top / scrollable).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{GestureAggregator, GestureConfig, GestureEvent, InputMode, Signal, scroll_progress};
    use crate::transport::Direction;

    fn aggregator(mode: InputMode) -> GestureAggregator {
        GestureAggregator::new(mode, GestureConfig::default())
    }

    #[test]
    fn wheel_direction_follows_delta_sign_and_ignores_zero() {
        let mut gestures = aggregator(InputMode::Discrete);

        assert_eq!(
            gestures.handle(GestureEvent::Wheel { delta_y: -3.0 }, false),
            Some(Signal::Step(Direction::Backward))
        );
        assert_eq!(gestures.handle(GestureEvent::Wheel { delta_y: 0.0 }, false), None);
    }

    #[test]
    fn touch_fires_once_per_threshold_and_resets_the_anchor() {
        let mut gestures = aggregator(InputMode::Discrete);
        gestures.handle(GestureEvent::TouchStart { y: 500.0 }, false);

        assert_eq!(gestures.handle(GestureEvent::TouchMove { y: 480.0 }, false), None);
        assert_eq!(
            gestures.handle(GestureEvent::TouchMove { y: 460.0 }, false),
            Some(Signal::Step(Direction::Forward))
        );
        assert_eq!(gestures.handle(GestureEvent::TouchMove { y: 440.0 }, false), None);
        assert_eq!(
            gestures.handle(GestureEvent::TouchMove { y: 500.0 }, false),
            Some(Signal::Step(Direction::Backward))
        );
    }

    #[test]
    fn touch_move_without_start_is_ignored() {
        let mut gestures = aggregator(InputMode::Discrete);
        assert_eq!(gestures.handle(GestureEvent::TouchMove { y: 0.0 }, false), None);
    }

    #[test]
    fn momentum_mode_scales_deltas_above_threshold() {
        let mut gestures = aggregator(InputMode::Momentum);

        assert_eq!(gestures.handle(GestureEvent::Wheel { delta_y: 0.5 }, false), None);
        assert_eq!(
            gestures.handle(GestureEvent::Wheel { delta_y: 100.0 }, false),
            Some(Signal::Impulse(1.5))
        );

        gestures.handle(GestureEvent::TouchStart { y: 300.0 }, false);
        assert_eq!(gestures.handle(GestureEvent::TouchMove { y: 299.0 }, false), None);
        assert_eq!(
            gestures.handle(GestureEvent::TouchMove { y: 290.0 }, false),
            Some(Signal::Impulse(10.0 * 0.08))
        );
    }

    #[test]
    fn modal_overlay_swallows_everything() {
        let mut gestures = aggregator(InputMode::Discrete);
        assert_eq!(gestures.handle(GestureEvent::Wheel { delta_y: 10.0 }, true), None);
        gestures.handle(GestureEvent::TouchStart { y: 100.0 }, true);
        assert_eq!(gestures.handle(GestureEvent::TouchMove { y: 0.0 }, false), None);
    }

    #[test]
    fn page_scroll_reports_progress_only_in_continuous_mode() {
        let mut continuous = aggregator(InputMode::Continuous);
        assert_eq!(
            continuous.handle(
                GestureEvent::PageScroll {
                    container_top: -500.0,
                    container_height: 3000.0,
                    viewport_height: 1000.0,
                },
                false,
            ),
            Some(Signal::Progress(0.25))
        );

        let mut discrete = aggregator(InputMode::Discrete);
        assert_eq!(
            discrete.handle(
                GestureEvent::PageScroll {
                    container_top: -500.0,
                    container_height: 3000.0,
                    viewport_height: 1000.0,
                },
                false,
            ),
            None
        );
    }

    #[test]
    fn scroll_progress_clamps_and_handles_short_containers() {
        assert_eq!(scroll_progress(100.0, 3000.0, 1000.0), 0.0);
        assert_eq!(scroll_progress(-5000.0, 3000.0, 1000.0), 1.0);
        assert_eq!(scroll_progress(-10.0, 800.0, 1000.0), 0.0);
    }
}
