use engine::Command;
use iced::keyboard::{self, key::Named};
use iced::{event, mouse, touch, window};

/// Pixels scrolled per wheel line, matching a browser's line height.
const LINE_HEIGHT: f64 = 40.0;
/// Wheel delta synthesized for arrow and page keys.
const KEY_DELTA: f64 = 100.0;
/// Height of the virtual scroll page, in viewports.
const PAGE_VIEWPORTS: f64 = 6.0;

/// Window input the stage cares about, in browser conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// Positive scrolls down.
    Wheel { delta_y: f64 },
    TouchStart { y: f64 },
    TouchMove { y: f64 },
    TouchEnd,
    Escape,
    Resized { height: f64 },
}

/// Maps a window event to stage input. Events a widget captured are dropped.
pub fn from_iced(event: iced::Event, status: event::Status, _window: window::Id) -> Option<Input> {
    if status == event::Status::Captured {
        return None;
    }
    match event {
        iced::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
            let delta_y = match delta {
                mouse::ScrollDelta::Lines { y, .. } => -f64::from(y) * LINE_HEIGHT,
                mouse::ScrollDelta::Pixels { y, .. } => -f64::from(y),
            };
            Some(Input::Wheel { delta_y })
        }
        iced::Event::Touch(touch::Event::FingerPressed { position, .. }) => {
            Some(Input::TouchStart {
                y: f64::from(position.y),
            })
        }
        iced::Event::Touch(touch::Event::FingerMoved { position, .. }) => Some(Input::TouchMove {
            y: f64::from(position.y),
        }),
        iced::Event::Touch(
            touch::Event::FingerLifted { .. } | touch::Event::FingerLost { .. },
        ) => Some(Input::TouchEnd),
        iced::Event::Keyboard(keyboard::Event::KeyPressed {
            key: keyboard::Key::Named(named),
            ..
        }) => match named {
            Named::ArrowDown | Named::PageDown | Named::Space => {
                Some(Input::Wheel { delta_y: KEY_DELTA })
            }
            Named::ArrowUp | Named::PageUp => Some(Input::Wheel {
                delta_y: -KEY_DELTA,
            }),
            Named::Escape => Some(Input::Escape),
            _ => None,
        },
        iced::Event::Window(window::Event::Resized(size)) => Some(Input::Resized {
            height: f64::from(size.height),
        }),
        _ => None,
    }
}

/// Emulates a tall page scrolled inside the window so continuous stages get
/// page-scroll geometry from wheel and touch input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualPage {
    offset: f64,
    viewport_height: f64,
}

impl VirtualPage {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            offset: 0.0,
            viewport_height: viewport_height.max(1.0),
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn container_height(&self) -> f64 {
        self.viewport_height * PAGE_VIEWPORTS
    }

    fn max_offset(&self) -> f64 {
        self.container_height() - self.viewport_height
    }

    pub fn scroll_by(&mut self, delta_y: f64) -> Command {
        if delta_y.is_finite() {
            self.offset = (self.offset + delta_y).clamp(0.0, self.max_offset());
        }
        self.command()
    }

    /// Keeps the scrolled fraction when the window height changes.
    pub fn resize(&mut self, viewport_height: f64) -> Command {
        let fraction = self.offset / self.max_offset();
        self.viewport_height = viewport_height.max(1.0);
        self.offset = (fraction * self.max_offset()).clamp(0.0, self.max_offset());
        self.command()
    }

    pub fn command(&self) -> Command {
        Command::PageScroll {
            container_top: -self.offset,
            container_height: self.container_height(),
            viewport_height: self.viewport_height,
        }
    }
}
