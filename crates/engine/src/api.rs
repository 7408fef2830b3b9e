use std::time::Duration;

use tracing::{debug, info};

use crate::config::{MediaConfig, StageConfig};
use crate::error::{EngineError, Result};
use crate::gesture::{GestureAggregator, GestureConfig, GestureEvent, InputMode, Signal};
use crate::media::sequence::{FfmpegFrameDecoder, FrameSequenceBackend};
use crate::media::video::{FfmpegVideoSource, VideoBackend};
use crate::media::{AnyBackend, Frame, MediaBackend};
use crate::momentum::{MomentumConfig, MomentumController};
use crate::popup::{PopupContent, PopupOverlay, scene_button};
use crate::scene::Overlay;
use crate::scrub::ContinuousScrub;
use crate::transport::{InputOutcome, SceneTransport, TransportEvent, TransportState};

/// Commands accepted by a stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Mouse wheel or trackpad scroll; positive `delta_y` scrolls down.
    Wheel { delta_y: f64 },
    TouchStart { y: f64 },
    TouchMove { y: f64 },
    TouchEnd,
    /// Page scroll geometry of the stage container relative to the viewport.
    PageScroll {
        container_top: f64,
        container_height: f64,
        viewport_height: f64,
    },
    /// Host animation frame; `now` is monotonic time since the stage started.
    Tick { now: Duration },
    /// Opens the popup of the current scene.
    ///
    /// # Example
    /// ```no_run
    /// use engine::{Command, Stage, StageConfig};
    ///
    /// let config = StageConfig::load("stage.json").expect("config should load");
    /// let mut stage = Stage::from_config(&config).expect("stage should build");
    /// let _ = stage.handle_command(Command::OpenPopup);
    /// ```
    OpenPopup,
    ClosePopup,
    /// Cancels all work and releases the media. Later commands fail.
    Teardown,
}

impl Command {
    fn gesture(self) -> Option<GestureEvent> {
        match self {
            Self::Wheel { delta_y } => Some(GestureEvent::Wheel { delta_y }),
            Self::TouchStart { y } => Some(GestureEvent::TouchStart { y }),
            Self::TouchMove { y } => Some(GestureEvent::TouchMove { y }),
            Self::TouchEnd => Some(GestureEvent::TouchEnd),
            Self::PageScroll {
                container_top,
                container_height,
                viewport_height,
            } => Some(GestureEvent::PageScroll {
                container_top,
                container_height,
                viewport_height,
            }),
            Self::Tick { .. } | Self::OpenPopup | Self::ClosePopup | Self::Teardown => None,
        }
    }
}

/// Events emitted by a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Transport(TransportEvent),
    Input(InputOutcome),
    FrameReady { position: f64, frame: Frame },
    PopupOpened { scene_index: usize },
    PopupClosed { scene_index: usize },
    TornDown,
    Error(EngineErrorEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    NotReady,
    TornDown,
    Media,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::MediaNotReady | EngineError::LoadFailed { .. } => Self::NotReady,
            EngineError::StageTornDown => Self::TornDown,
            EngineError::Media(_) | EngineError::NativePlaybackUnsupported { .. } => Self::Media,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Per-stage behavior that is not part of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    pub input_mode: InputMode,
    pub gestures: GestureConfig,
    pub momentum: MomentumConfig,
    pub scrub_lag: Option<Duration>,
    /// Positions are frame indices rather than seconds.
    pub frame_positions: bool,
    /// Decode and emit a frame after every position change.
    pub emit_frames: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            input_mode: InputMode::default(),
            gestures: GestureConfig::default(),
            momentum: MomentumConfig::default(),
            scrub_lag: None,
            frame_positions: false,
            emit_frames: true,
        }
    }
}

/// Everything the UI needs to draw one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageView {
    pub scene_index: usize,
    pub scene_count: usize,
    pub position: f64,
    pub position_label: String,
    pub scene_label: String,
    pub overlay: Option<Overlay>,
    pub scene_button: Option<String>,
    pub popup: Option<PopupContent>,
    pub is_ready: bool,
    pub is_transitioning: bool,
    pub load_progress: Option<(usize, usize)>,
    pub load_failure: Option<String>,
}

/// One page instance: gestures in, transport events out.
pub struct Stage<B: MediaBackend = AnyBackend> {
    transport: SceneTransport<B>,
    gestures: GestureAggregator,
    momentum: Option<MomentumController>,
    scrub: Option<ContinuousScrub>,
    popup: PopupOverlay,
    options: StageOptions,
    load_progress: Option<(usize, usize)>,
    load_failure: Option<String>,
    torn_down: bool,
}

impl Stage<AnyBackend> {
    /// Builds the FFmpeg-backed stage described by `config`.
    pub fn from_config(config: &StageConfig) -> Result<Self> {
        let scenes = config.scene_table()?;
        let (backend, frame_positions) = match &config.media {
            MediaConfig::Video { path } => (
                AnyBackend::Video(VideoBackend::new(
                    FfmpegVideoSource::new(path),
                    config.frame_rate,
                    config.tolerance,
                )),
                false,
            ),
            MediaConfig::Frames(pattern) => (
                AnyBackend::Frames(FrameSequenceBackend::new(
                    pattern.clone(),
                    FfmpegFrameDecoder,
                    config.frame_rate.unwrap_or_default(),
                )?),
                true,
            ),
        };
        info!(
            scenes = scenes.len(),
            mode = ?config.input_mode,
            frame_positions,
            "stage created"
        );

        let transport = SceneTransport::new(backend, scenes, config.transport_config());
        Ok(Stage::new(
            transport,
            StageOptions {
                input_mode: config.input_mode,
                gestures: config.gestures,
                momentum: config.momentum,
                scrub_lag: config.scrub_lag(),
                frame_positions,
                emit_frames: true,
            },
        ))
    }
}

impl<B: MediaBackend> Stage<B> {
    pub fn new(transport: SceneTransport<B>, options: StageOptions) -> Self {
        let momentum = (options.input_mode == InputMode::Momentum)
            .then(|| MomentumController::new(options.momentum, 0.0));
        let scrub = (options.input_mode == InputMode::Continuous)
            .then(|| ContinuousScrub::new(options.scrub_lag, options.frame_positions));
        Self {
            transport,
            gestures: GestureAggregator::new(options.input_mode, options.gestures),
            momentum,
            scrub,
            popup: PopupOverlay::default(),
            options,
            load_progress: None,
            load_failure: None,
            torn_down: false,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        self.options.input_mode
    }

    pub fn transport(&self) -> &SceneTransport<B> {
        &self.transport
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Turns `FrameReady` emission on or off; positions are still reported.
    pub fn set_emit_frames(&mut self, emit: bool) {
        self.options.emit_frames = emit;
    }

    pub fn current_frame(&mut self) -> Option<Frame> {
        self.transport.current_frame()
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        if self.torn_down {
            return Err(EngineError::StageTornDown);
        }
        if let Some(gesture) = command.gesture() {
            return self.gesture(gesture);
        }
        match command {
            Command::Tick { now } => self.tick(now),
            Command::OpenPopup => Ok(self.open_popup()),
            Command::ClosePopup => Ok(self.close_popup()),
            Command::Teardown => Ok(self.teardown()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn view(&self) -> StageView {
        let state = self.transport.state();
        let scenes = self.transport.scenes();
        let current = scenes.get(state.current_scene_index);
        let position_label = if self.options.frame_positions {
            format!(
                "Frame: {} / {}",
                state.current_position.round() as u64 + 1,
                self.transport
                    .extent()
                    .map_or(0, |extent| extent.round() as u64 + 1)
            )
        } else {
            format!("Time: {:.2}s", state.current_position)
        };

        StageView {
            scene_index: state.current_scene_index,
            scene_count: scenes.len(),
            position: state.current_position,
            position_label,
            scene_label: format!("SCENE {} / {}", state.current_scene_index, scenes.len()),
            overlay: current
                .filter(|_| !state.is_transitioning)
                .and_then(|scene| scene.overlay.clone()),
            scene_button: scene_button(scenes, &state).map(|scene| scene.label.clone()),
            popup: self.popup.content(scenes).cloned(),
            is_ready: self.transport.is_ready(),
            is_transitioning: state.is_transitioning,
            load_progress: self.load_progress,
            load_failure: self.load_failure.clone(),
        }
    }

    fn gesture(&mut self, gesture: GestureEvent) -> Result<Vec<Event>> {
        let Some(signal) = self.gestures.handle(gesture, self.popup.is_open()) else {
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        match signal {
            Signal::Step(direction) => {
                let outcome = self.transport.handle_input(direction)?;
                events.push(Event::Input(outcome));
            }
            Signal::Impulse(delta) => {
                if self.transport.is_ready() {
                    if let Some(momentum) = &mut self.momentum {
                        momentum.impulse(delta);
                    }
                }
            }
            Signal::Progress(progress) => {
                let target = match (&mut self.scrub, self.transport.extent()) {
                    (Some(scrub), Some(extent)) => scrub.set_progress(progress, extent),
                    _ => None,
                };
                if let Some(position) = target {
                    self.transport.scrub_to(position)?;
                }
            }
        }
        self.collect_transport_events(&mut events);
        Ok(events)
    }

    fn tick(&mut self, now: Duration) -> Result<Vec<Event>> {
        let mut transport_events = self.transport.tick(now)?;
        self.track_loading(&transport_events);

        if transport_events
            .iter()
            .any(|event| matches!(event, TransportEvent::Ready { .. }))
        {
            self.sync_free_scrub();
        }
        if let Some(position) = self.free_scrub_step(now) {
            self.transport.scrub_to(position)?;
            transport_events.extend(self.transport.drain_events());
        }

        let mut events = Vec::new();
        self.push_transport_events(transport_events, &mut events);
        Ok(events)
    }

    fn track_loading(&mut self, transport_events: &[TransportEvent]) {
        for event in transport_events {
            match event {
                TransportEvent::LoadProgress { done, total } => {
                    self.load_progress = Some((*done, *total));
                }
                TransportEvent::Ready { .. } => self.load_progress = None,
                TransportEvent::LoadFailed { reason } => {
                    self.load_failure = Some(reason.clone());
                }
                _ => {}
            }
        }
    }

    fn sync_free_scrub(&mut self) {
        let position = self.transport.state().current_position;
        let extent = self.transport.extent().unwrap_or_default();
        if let Some(momentum) = &mut self.momentum {
            momentum.set_max_position(extent);
            momentum.reset_to(position);
        }
        if let Some(scrub) = &mut self.scrub {
            scrub.reset_to(position);
        }
    }

    fn free_scrub_step(&mut self, now: Duration) -> Option<f64> {
        if !self.transport.is_ready() {
            return None;
        }
        if let Some(momentum) = &mut self.momentum {
            if momentum.is_running() {
                return Some(momentum.tick().position);
            }
        }
        self.scrub.as_mut().and_then(|scrub| scrub.advance(now))
    }

    fn collect_transport_events(&mut self, events: &mut Vec<Event>) {
        let drained = self.transport.drain_events();
        self.push_transport_events(drained, events);
    }

    /// Wraps transport events and appends one frame when the position moved.
    fn push_transport_events(
        &mut self,
        transport_events: Vec<TransportEvent>,
        events: &mut Vec<Event>,
    ) {
        let moved = transport_events
            .iter()
            .any(|event| matches!(event, TransportEvent::PositionChanged { .. }));
        events.extend(transport_events.into_iter().map(Event::Transport));
        if moved {
            self.push_frame(events);
        }
    }

    fn push_frame(&mut self, events: &mut Vec<Event>) {
        if !self.options.emit_frames {
            return;
        }
        if let Some(frame) = self.transport.current_frame() {
            events.push(Event::FrameReady {
                position: self.transport.state().current_position,
                frame,
            });
        }
    }

    fn open_popup(&mut self) -> Vec<Event> {
        let scene_index = self.transport.state().current_scene_index;
        if self.popup.open(self.transport.scenes(), scene_index) {
            debug!(scene_index, "popup opened");
            vec![Event::PopupOpened { scene_index }]
        } else {
            Vec::new()
        }
    }

    fn close_popup(&mut self) -> Vec<Event> {
        match self.popup.close() {
            Some(scene_index) => {
                debug!(scene_index, "popup closed");
                vec![Event::PopupClosed { scene_index }]
            }
            None => Vec::new(),
        }
    }

    fn teardown(&mut self) -> Vec<Event> {
        self.transport.shutdown();
        let mut events = self.close_popup();
        self.torn_down = true;
        events.extend(self.transport.drain_events().into_iter().map(Event::Transport));
        events.push(Event::TornDown);
        events
    }
}
