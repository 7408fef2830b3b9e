use std::sync::mpsc::TrySendError;
use std::time::{Duration, Instant};

use engine::{Command, Event, StageView, TransportEvent};
use iced::widget::stack;
use iced::{Element, Subscription, Task, event};

use crate::bridge::{BridgeEvent, StageCommandSender, StageUpdate, stage_subscription};
use crate::input::{self, Input, VirtualPage};
use crate::widgets::{frame, frame::FrameImage, overlay, popup};

/// Host animation frame interval.
const TICK_INTERVAL: Duration = Duration::from_millis(16);
const INITIAL_VIEWPORT_HEIGHT: f64 = 720.0;

/// UI messages handled by the iced app update loop.
#[derive(Debug, Clone)]
pub enum Message {
    Input(Input),
    Tick(Instant),
    OpenPopup,
    ClosePopup,
    Bridge(BridgeEvent),
}

/// Root UI state: the latest frame and stage snapshot.
pub struct AppState {
    stage_tx: Option<StageCommandSender>,
    started: Instant,
    frame: Option<FrameImage>,
    stage: Option<StageView>,
    page: VirtualPage,
    last_touch_y: Option<f64>,
    status: String,
}

impl AppState {
    /// Boots the app; the stage bridge starts with the subscription.
    pub fn boot() -> (Self, Task<Message>) {
        (Self::with_sender(None), Task::none())
    }

    fn with_sender(stage_tx: Option<StageCommandSender>) -> Self {
        Self {
            stage_tx,
            started: Instant::now(),
            frame: None,
            stage: None,
            page: VirtualPage::new(INITIAL_VIEWPORT_HEIGHT),
            last_touch_y: None,
            status: String::from("starting stage"),
        }
    }

    /// Handles one UI message.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Input(input) => self.apply_input(input),
            Message::Tick(at) => {
                let now = at.saturating_duration_since(self.started);
                self.send_tick(now);
            }
            Message::OpenPopup => {
                let _ = self.send_command(Command::OpenPopup);
            }
            Message::ClosePopup => {
                let _ = self.send_command(Command::ClosePopup);
            }
            Message::Bridge(BridgeEvent::Ready(sender)) => {
                self.stage_tx = Some(sender);
                self.status = String::from("stage connected");
                let command = self.page.command();
                let _ = self.send_command(command);
            }
            Message::Bridge(BridgeEvent::Update(StageUpdate::Event(event))) => {
                self.apply_stage_event(event);
            }
            Message::Bridge(BridgeEvent::Update(StageUpdate::View(view))) => {
                self.stage = Some(view);
            }
            Message::Bridge(BridgeEvent::Disconnected) => {
                self.status = String::from("stage disconnected");
                self.stage_tx = None;
            }
        }

        Task::none()
    }

    /// Wheel and touch feed both the discrete/momentum gesture path and the
    /// virtual page; the stage ignores whichever its input mode does not use.
    fn apply_input(&mut self, input: Input) {
        match input {
            Input::Wheel { delta_y } => {
                if self.send_command(Command::Wheel { delta_y }) {
                    let command = self.page.scroll_by(delta_y);
                    let _ = self.send_command(command);
                }
            }
            Input::TouchStart { y } => {
                self.last_touch_y = Some(y);
                let _ = self.send_command(Command::TouchStart { y });
            }
            Input::TouchMove { y } => {
                if let Some(last) = self.last_touch_y.replace(y) {
                    let command = self.page.scroll_by(last - y);
                    let _ = self.send_command(command);
                }
                let _ = self.send_command(Command::TouchMove { y });
            }
            Input::TouchEnd => {
                self.last_touch_y = None;
                let _ = self.send_command(Command::TouchEnd);
            }
            Input::Escape => {
                let _ = self.send_command(Command::ClosePopup);
            }
            Input::Resized { height } => {
                let command = self.page.resize(height);
                let _ = self.send_command(command);
            }
        }
    }

    fn send_command(&mut self, command: Command) -> bool {
        if let Some(sender) = &self.stage_tx {
            match sender.try_send(command) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.status = String::from("stage command queue is full");
                    false
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.status = String::from("stage command channel closed");
                    self.stage_tx = None;
                    false
                }
            }
        } else {
            false
        }
    }

    /// A tick that does not fit in the queue is dropped; the next one catches up.
    fn send_tick(&mut self, now: Duration) {
        if let Some(sender) = &self.stage_tx {
            if let Err(TrySendError::Disconnected(_)) = sender.try_send(Command::Tick { now }) {
                self.status = String::from("stage command channel closed");
                self.stage_tx = None;
            }
        }
    }

    fn apply_stage_event(&mut self, event: Event) {
        match event {
            Event::FrameReady { frame, .. } => {
                if let Some(image) = FrameImage::from_frame(&frame) {
                    self.frame = Some(image);
                }
            }
            Event::Transport(TransportEvent::Ready { .. }) => {
                self.status = String::from("ready");
            }
            Event::Transport(TransportEvent::LoadFailed { reason }) => {
                self.status = format!("load failed: {reason}");
            }
            Event::TornDown => {
                self.status = String::from("stage torn down");
            }
            Event::Error(error) => {
                self.status = format!("error: {}", error.message);
            }
            _ => {}
        }
    }

    /// Renders the UI tree.
    pub fn view(&self) -> Element<'_, Message> {
        let media = frame::view(self.frame.as_ref(), self.status.clone());
        let Some(stage) = &self.stage else {
            return media;
        };

        let mut layers = stack![media, overlay::view(stage, Message::OpenPopup)];
        if let Some(content) = &stage.popup {
            layers = layers.push(popup::view(content, Message::ClosePopup));
        }
        layers.into()
    }

    /// Stage bridge, animation ticks and window input.
    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            stage_subscription().map(Message::Bridge),
            iced::time::every(TICK_INTERVAL).map(Message::Tick),
            event::listen_with(input::from_iced).map(Message::Input),
        ])
    }

    #[cfg(test)]
    fn from_sender_for_test(stage_tx: StageCommandSender) -> Self {
        Self::with_sender(Some(stage_tx))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::sync::mpsc::TryRecvError;
    use std::time::Duration;

    use engine::{Command, Event, Frame};

    use crate::bridge::{BridgeEvent, StageUpdate};
    use crate::input::Input;

    use super::{AppState, Message};

    #[test]
    fn wheel_dispatches_gesture_then_page_scroll() {
        let (command_tx, command_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(command_tx);

        let _ = app.update(Message::Input(Input::Wheel { delta_y: 120.0 }));

        assert_eq!(
            command_rx.recv().expect("wheel command"),
            Command::Wheel { delta_y: 120.0 }
        );
        assert_eq!(
            command_rx.recv().expect("page scroll command"),
            Command::PageScroll {
                container_top: -120.0,
                container_height: 4_320.0,
                viewport_height: 720.0,
            }
        );
    }

    #[test]
    fn tick_sends_time_since_start() {
        let (command_tx, command_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(command_tx);
        let at = app.started + Duration::from_millis(250);

        let _ = app.update(Message::Tick(at));

        assert_eq!(
            command_rx.recv().expect("tick command"),
            Command::Tick {
                now: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn full_queue_drops_ticks_quietly() {
        let (command_tx, command_rx) = mpsc::sync_channel(1);
        let mut app = AppState::from_sender_for_test(command_tx);
        let _ = app.update(Message::OpenPopup);

        let _ = app.update(Message::Tick(app.started));

        assert_eq!(app.status, "starting stage");
        assert_eq!(command_rx.recv().expect("popup command"), Command::OpenPopup);
        assert!(matches!(command_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn touch_drag_scrolls_the_page_by_finger_distance() {
        let (command_tx, command_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(command_tx);

        let _ = app.update(Message::Input(Input::TouchStart { y: 400.0 }));
        let _ = app.update(Message::Input(Input::TouchMove { y: 340.0 }));

        let commands: Vec<Command> = command_rx.try_iter().collect();
        assert_eq!(
            commands,
            vec![
                Command::TouchStart { y: 400.0 },
                Command::PageScroll {
                    container_top: -60.0,
                    container_height: 4_320.0,
                    viewport_height: 720.0,
                },
                Command::TouchMove { y: 340.0 },
            ]
        );
    }

    #[test]
    fn escape_closes_popup() {
        let (command_tx, command_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(command_tx);

        let _ = app.update(Message::Input(Input::Escape));

        assert_eq!(command_rx.recv().expect("close command"), Command::ClosePopup);
    }

    #[test]
    fn frame_ready_replaces_the_drawn_image() {
        let (command_tx, _command_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(command_tx);

        let _ = app.update(Message::Bridge(BridgeEvent::Update(StageUpdate::Event(
            Event::FrameReady {
                position: 7.12,
                frame: Frame {
                    width: 1,
                    height: 1,
                    bytes: Arc::from(vec![9_u8; 4]),
                },
            },
        ))));

        let image = app.frame.as_ref().expect("frame should be stored");
        assert_eq!((image.width, image.height), (1, 1));
    }

    #[test]
    fn disconnect_drops_the_sender() {
        let (command_tx, _command_rx) = mpsc::sync_channel(8);
        let mut app = AppState::from_sender_for_test(command_tx);

        let _ = app.update(Message::Bridge(BridgeEvent::Disconnected));

        assert!(app.stage_tx.is_none());
        assert_eq!(app.status, "stage disconnected");
    }
}
