use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Per-tick velocity multiplier.
    pub friction: f64,
    /// Largest velocity in frames per tick, either way.
    pub max_velocity: f64,
    /// Velocity at or below which the glide stops.
    pub stop_epsilon: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            friction: 0.93,
            max_velocity: 2.5,
            stop_epsilon: 0.02,
        }
    }
}

/// Result of one [`MomentumController::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumTick {
    pub position: f64,
    pub running: bool,
}

/// Velocity and friction model for free scrubbing through a frame sequence.
///
/// # Example
/// ```
/// use engine::{MomentumConfig, MomentumController};
///
/// let mut momentum = MomentumController::new(MomentumConfig::default(), 230.0);
/// momentum.impulse(2.0);
/// let tick = momentum.tick();
/// assert!(tick.running);
/// assert!((tick.position - 1.86).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct MomentumController {
    config: MomentumConfig,
    max_position: f64,
    velocity: f64,
    position: f64,
    running: bool,
}

impl MomentumController {
    /// `max_position` is the last addressable frame index.
    pub fn new(config: MomentumConfig, max_position: f64) -> Self {
        Self {
            config,
            max_position: max_position.max(0.0),
            velocity: 0.0,
            position: 0.0,
            running: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_max_position(&mut self, max_position: f64) {
        self.max_position = max_position.max(0.0);
        self.position = self.position.clamp(0.0, self.max_position);
    }

    /// Moves the glide origin without adding velocity.
    pub fn reset_to(&mut self, position: f64) {
        self.position = position.clamp(0.0, self.max_position);
        self.velocity = 0.0;
        self.running = false;
    }

    /// Adds `delta` to the velocity and restarts the glide.
    pub fn impulse(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let limit = self.config.max_velocity;
        self.velocity = (self.velocity + delta).clamp(-limit, limit);
        self.running = true;
    }

    /// Applies one frame of friction and movement.
    pub fn tick(&mut self) -> MomentumTick {
        if self.running {
            self.velocity *= self.config.friction;
            self.position += self.velocity;

            if self.position <= 0.0 {
                self.position = 0.0;
                self.velocity = 0.0;
            } else if self.position >= self.max_position {
                self.position = self.max_position;
                self.velocity = 0.0;
            }

            if self.velocity.abs() <= self.config.stop_epsilon {
                self.velocity = 0.0;
                self.running = false;
            }
        }
        MomentumTick {
            position: self.position,
            running: self.running,
        }
    }

    pub fn stop(&mut self) {
        self.velocity = 0.0;
        self.running = false;
    }
}
