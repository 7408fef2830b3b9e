//! Scene-to-scene state machine over a [`MediaBackend`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::media::{Frame, LoadStatus, MediaBackend, RangeJob};
use crate::scene::SceneTable;
use crate::time::POSITION_EPSILON;

/// Direction of travel along the scene table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn from_forward(forward: bool) -> Self {
        if forward {
            Self::Forward
        } else {
            Self::Backward
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }
}

/// How backward transitions move the media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverseStrategy {
    /// Always walk backwards in discrete steps.
    #[default]
    Stepped,
    /// Try native playback at rate -1 and step when the backend refuses.
    NativeWithFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Cool-down after a completed transition during which same-direction
    /// input is ignored.
    pub lock_delay: Duration,
    pub reverse: ReverseStrategy,
}

impl TransportConfig {
    pub const DEFAULT_LOCK_DELAY: Duration = Duration::from_millis(500);
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            lock_delay: Self::DEFAULT_LOCK_DELAY,
            reverse: ReverseStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning(Direction),
    Locked,
}

/// Snapshot of the transport for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub current_scene_index: usize,
    pub current_position: f64,
    pub direction: Option<Direction>,
    pub is_transitioning: bool,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Busy,
    NotReady,
    Locked,
    AtBoundary,
}

/// What [`SceneTransport::handle_input`] did with one direction signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputOutcome {
    Started {
        target: usize,
        from: f64,
        to: f64,
        direction: Direction,
        stepped: bool,
    },
    Completed {
        scene_index: usize,
    },
    Ignored(IgnoreReason),
}

/// Everything observable the transport does.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    LoadProgress {
        done: usize,
        total: usize,
    },
    Ready {
        extent: f64,
    },
    LoadFailed {
        reason: String,
    },
    TransitionStarted {
        from_scene: usize,
        to_scene: usize,
        direction: Direction,
        stepped: bool,
    },
    NativeFallback {
        direction: Direction,
        rate: f64,
    },
    PositionChanged {
        position: f64,
    },
    SceneChanged {
        scene_index: usize,
    },
    TransitionCompleted {
        scene_index: usize,
        position: f64,
    },
    TransitionCancelled {
        position: f64,
    },
    InputIgnored {
        direction: Direction,
        reason: IgnoreReason,
    },
    LockReleased,
    ShutDown,
}

/// Receives every event the transport emits.
pub trait TransportObserver {
    fn on_event(&mut self, event: &TransportEvent);
}

/// Default observer: structured `tracing` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TransportObserver for TracingObserver {
    fn on_event(&mut self, event: &TransportEvent) {
        match event {
            TransportEvent::LoadProgress { done, total } => {
                debug!(done, total, "media loading")
            }
            TransportEvent::Ready { extent } => info!(extent, "media ready"),
            TransportEvent::LoadFailed { reason } => warn!(%reason, "media failed to load"),
            TransportEvent::TransitionStarted {
                from_scene,
                to_scene,
                direction,
                stepped,
            } => info!(from_scene, to_scene, ?direction, stepped, "transition started"),
            TransportEvent::NativeFallback { direction, rate } => {
                debug!(?direction, rate, "native playback unavailable, stepping instead")
            }
            TransportEvent::PositionChanged { .. } => {}
            TransportEvent::SceneChanged { scene_index } => debug!(scene_index, "scene changed"),
            TransportEvent::TransitionCompleted {
                scene_index,
                position,
            } => info!(scene_index, position, "transition completed"),
            TransportEvent::TransitionCancelled { position } => {
                debug!(position, "transition cancelled")
            }
            TransportEvent::InputIgnored { direction, reason } => {
                debug!(?direction, ?reason, "input ignored")
            }
            TransportEvent::LockReleased => debug!("scroll lock released"),
            TransportEvent::ShutDown => info!("transport shut down"),
        }
    }
}

struct InFlight {
    job: RangeJob,
    direction: Direction,
    target: usize,
    lock_waived: bool,
}

/// Owns the current scene and is the only caller that mutates the backend.
///
/// Time is supplied by the host through [`SceneTransport::tick`]; input
/// between ticks is evaluated against the last tick time.
pub struct SceneTransport<B: MediaBackend> {
    backend: B,
    scenes: SceneTable,
    config: TransportConfig,
    observer: Box<dyn TransportObserver + Send>,
    current_index: usize,
    current_position: f64,
    last_direction: Option<Direction>,
    in_flight: Option<InFlight>,
    lock_until: Option<Duration>,
    ready: bool,
    load_failed: bool,
    last_progress: Option<(usize, usize)>,
    shut_down: bool,
    now: Duration,
    outbox: Vec<TransportEvent>,
}

impl<B: MediaBackend> SceneTransport<B> {
    pub fn new(backend: B, scenes: SceneTable, config: TransportConfig) -> Self {
        let current_position = scenes.first().position;
        Self {
            backend,
            scenes,
            config,
            observer: Box::new(TracingObserver),
            current_index: 1,
            current_position,
            last_direction: None,
            in_flight: None,
            lock_until: None,
            ready: false,
            load_failed: false,
            last_progress: None,
            shut_down: false,
            now: Duration::ZERO,
            outbox: Vec::new(),
        }
    }

    /// Replaces the default tracing observer.
    pub fn with_observer(mut self, observer: impl TransportObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn scenes(&self) -> &SceneTable {
        &self.scenes
    }

    pub fn config(&self) -> TransportConfig {
        self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn extent(&self) -> Option<f64> {
        self.backend.extent()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn state(&self) -> TransportState {
        let is_transitioning = self.in_flight.is_some();
        TransportState {
            current_scene_index: self.current_index,
            current_position: self.current_position,
            direction: self.last_direction,
            is_transitioning,
            is_locked: is_transitioning || self.lock_until.is_some(),
        }
    }

    pub fn phase(&self) -> Phase {
        if let Some(in_flight) = &self.in_flight {
            Phase::Transitioning(in_flight.direction)
        } else if self.lock_until.is_some() {
            Phase::Locked
        } else {
            Phase::Idle
        }
    }

    /// Frame to draw for the current position.
    pub fn current_frame(&mut self) -> Option<Frame> {
        if self.ready {
            self.backend.current_frame()
        } else {
            None
        }
    }

    /// Takes all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Requests a move to the neighboring scene in `direction`.
    pub fn handle_input(&mut self, direction: Direction) -> Result<InputOutcome> {
        if let Some(in_flight) = &mut self.in_flight {
            if direction != in_flight.direction {
                in_flight.lock_waived = true;
                self.last_direction = Some(direction);
            }
            return Ok(self.ignore(direction, IgnoreReason::Busy));
        }
        if !self.ready || self.shut_down {
            return Ok(self.ignore(direction, IgnoreReason::NotReady));
        }

        self.expire_lock();
        if self.last_direction.is_some_and(|last| last != direction) {
            self.release_lock();
        }
        self.last_direction = Some(direction);
        if self.lock_until.is_some() {
            return Ok(self.ignore(direction, IgnoreReason::Locked));
        }

        let Some(target) = self.scenes.neighbor(self.current_index, direction) else {
            return Ok(self.ignore(direction, IgnoreReason::AtBoundary));
        };
        let (Some(from), Some(to)) = (
            self.scenes.position_of(self.current_index),
            self.scenes.position_of(target),
        ) else {
            return Ok(self.ignore(direction, IgnoreReason::AtBoundary));
        };

        if (to - from).abs() <= POSITION_EPSILON {
            self.backend.seek_to(to)?;
            self.complete(target, to, false);
            return Ok(InputOutcome::Completed {
                scene_index: target,
            });
        }

        let job = self.start_job(direction, from, to)?;
        let stepped = !job.is_native();
        self.emit(TransportEvent::TransitionStarted {
            from_scene: self.current_index,
            to_scene: target,
            direction,
            stepped,
        });
        self.in_flight = Some(InFlight {
            job,
            direction,
            target,
            lock_waived: false,
        });

        Ok(InputOutcome::Started {
            target,
            from,
            to,
            direction,
            stepped,
        })
    }

    /// Advances loading, the in-flight job and the lock timer to `now`.
    pub fn tick(&mut self, now: Duration) -> Result<Vec<TransportEvent>> {
        self.now = self.now.max(now);
        if self.shut_down {
            return Ok(self.drain_events());
        }

        if !self.ready && !self.load_failed {
            self.poll_load()?;
        }

        if let Some(mut in_flight) = self.in_flight.take() {
            let poll = match in_flight.job.poll(&mut self.backend, self.now) {
                Ok(poll) => poll,
                Err(err) => {
                    in_flight.job.cancel(&mut self.backend);
                    self.current_position = self.backend.position();
                    self.emit(TransportEvent::TransitionCancelled {
                        position: self.current_position,
                    });
                    return Err(err);
                }
            };
            for position in poll.progress {
                self.set_position(position);
            }
            if poll.done {
                let to = in_flight.job.to();
                self.complete(in_flight.target, to, in_flight.lock_waived);
            } else {
                self.in_flight = Some(in_flight);
            }
        }

        self.expire_lock();
        Ok(self.drain_events())
    }

    /// Moves straight to `position`, abandoning any transition.
    ///
    /// The scene index follows the last scene at or before the new position.
    pub fn scrub_to(&mut self, position: f64) -> Result<()> {
        if !self.ready || self.shut_down {
            return Ok(());
        }
        self.cancel_in_flight();
        self.release_lock();

        self.backend.seek_to(position)?;
        self.set_position(self.backend.position());

        let scene_index = self.scenes.scene_index_at(self.current_position);
        if scene_index != self.current_index {
            self.current_index = scene_index;
            self.emit(TransportEvent::SceneChanged { scene_index });
        }
        Ok(())
    }

    /// Cancels outstanding work and releases the backend. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.cancel_in_flight();
        self.lock_until = None;
        self.backend.release();
        self.ready = false;
        self.shut_down = true;
        self.emit(TransportEvent::ShutDown);
    }

    fn poll_load(&mut self) -> Result<()> {
        match self.backend.poll_load() {
            LoadStatus::Loading { done, total } => {
                if self.last_progress != Some((done, total)) {
                    self.last_progress = Some((done, total));
                    self.emit(TransportEvent::LoadProgress { done, total });
                }
            }
            LoadStatus::Ready => {
                let extent = self.backend.extent().unwrap_or_default();
                if let Some(gap) = self.scenes.extent_mismatch(extent) {
                    warn!(
                        extent,
                        last_scene = self.scenes.last().position,
                        gap,
                        "last scene does not sit at the end of the media"
                    );
                }
                let first = self.scenes.first().position;
                self.backend.seek_to(first)?;
                self.ready = true;
                self.emit(TransportEvent::Ready { extent });
                self.current_position = self.backend.position();
                self.emit(TransportEvent::PositionChanged {
                    position: self.current_position,
                });
            }
            LoadStatus::Failed { reason } => {
                self.load_failed = true;
                self.emit(TransportEvent::LoadFailed { reason });
            }
        }
        Ok(())
    }

    fn start_job(&mut self, direction: Direction, from: f64, to: f64) -> Result<RangeJob> {
        let native_first = match direction {
            Direction::Forward => true,
            Direction::Backward => self.config.reverse == ReverseStrategy::NativeWithFallback,
        };
        if native_first {
            match self.backend.play_range(from, to, self.now) {
                Ok(job) => return Ok(job),
                Err(EngineError::NativePlaybackUnsupported { rate }) => {
                    self.emit(TransportEvent::NativeFallback { direction, rate });
                }
                Err(err) => return Err(err),
            }
        }
        self.backend.step_range(from, to, self.now)
    }

    fn complete(&mut self, target: usize, to: f64, lock_waived: bool) {
        self.set_position(to);
        self.current_index = target;
        self.emit(TransportEvent::SceneChanged {
            scene_index: target,
        });
        self.emit(TransportEvent::TransitionCompleted {
            scene_index: target,
            position: to,
        });
        self.lock_until = if lock_waived || self.config.lock_delay.is_zero() {
            None
        } else {
            Some(self.now + self.config.lock_delay)
        };
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.job.cancel(&mut self.backend);
            self.emit(TransportEvent::TransitionCancelled {
                position: self.backend.position(),
            });
        }
    }

    fn expire_lock(&mut self) {
        if self.lock_until.is_some_and(|until| self.now >= until) {
            self.release_lock();
        }
    }

    fn release_lock(&mut self) {
        if self.lock_until.take().is_some() {
            self.emit(TransportEvent::LockReleased);
        }
    }

    fn set_position(&mut self, position: f64) {
        if (position - self.current_position).abs() > POSITION_EPSILON {
            self.current_position = position;
            self.emit(TransportEvent::PositionChanged { position });
        }
    }

    fn ignore(&mut self, direction: Direction, reason: IgnoreReason) -> InputOutcome {
        self.emit(TransportEvent::InputIgnored { direction, reason });
        InputOutcome::Ignored(reason)
    }

    fn emit(&mut self, event: TransportEvent) {
        self.observer.on_event(&event);
        self.outbox.push(event);
    }
}
