use engine::{
    Direction, EngineErrorKind, Event, IgnoreReason, InputOutcome, StageView, TransportEvent,
};
use serde_json::{Value, json};

/// JSON line for one stage event. Frame payloads are reduced to their size.
pub fn event_json(event: &Event) -> Value {
    match event {
        Event::Transport(event) => transport_json(event),
        Event::Input(outcome) => input_json(outcome),
        Event::FrameReady { position, frame } => json!({
            "event": "frame_ready",
            "position": position,
            "width": frame.width,
            "height": frame.height,
        }),
        Event::PopupOpened { scene_index } => {
            json!({ "event": "popup_opened", "scene_index": scene_index })
        }
        Event::PopupClosed { scene_index } => {
            json!({ "event": "popup_closed", "scene_index": scene_index })
        }
        Event::TornDown => json!({ "event": "torn_down" }),
        Event::Error(error) => json!({
            "event": "error",
            "kind": error_kind(error.kind),
            "message": error.message,
        }),
    }
}

fn transport_json(event: &TransportEvent) -> Value {
    match event {
        TransportEvent::LoadProgress { done, total } => {
            json!({ "event": "load_progress", "done": done, "total": total })
        }
        TransportEvent::Ready { extent } => json!({ "event": "ready", "extent": extent }),
        TransportEvent::LoadFailed { reason } => {
            json!({ "event": "load_failed", "reason": reason })
        }
        TransportEvent::TransitionStarted {
            from_scene,
            to_scene,
            direction,
            stepped,
        } => json!({
            "event": "transition_started",
            "from_scene": from_scene,
            "to_scene": to_scene,
            "direction": direction,
            "stepped": stepped,
        }),
        TransportEvent::NativeFallback { direction, rate } => json!({
            "event": "native_fallback",
            "direction": direction,
            "rate": rate,
        }),
        TransportEvent::PositionChanged { position } => {
            json!({ "event": "position_changed", "position": position })
        }
        TransportEvent::SceneChanged { scene_index } => {
            json!({ "event": "scene_changed", "scene_index": scene_index })
        }
        TransportEvent::TransitionCompleted {
            scene_index,
            position,
        } => json!({
            "event": "transition_completed",
            "scene_index": scene_index,
            "position": position,
        }),
        TransportEvent::TransitionCancelled { position } => {
            json!({ "event": "transition_cancelled", "position": position })
        }
        TransportEvent::InputIgnored { direction, reason } => json!({
            "event": "input_ignored",
            "direction": direction,
            "reason": ignore_reason(*reason),
        }),
        TransportEvent::LockReleased => json!({ "event": "lock_released" }),
        TransportEvent::ShutDown => json!({ "event": "shut_down" }),
    }
}

fn input_json(outcome: &InputOutcome) -> Value {
    match outcome {
        InputOutcome::Started {
            target,
            from,
            to,
            direction,
            stepped,
        } => json!({
            "event": "input_started",
            "target": target,
            "from": from,
            "to": to,
            "direction": direction,
            "stepped": stepped,
        }),
        InputOutcome::Completed { scene_index } => {
            json!({ "event": "input_completed", "scene_index": scene_index })
        }
        InputOutcome::Ignored(reason) => {
            json!({ "event": "input_ignored", "reason": ignore_reason(*reason) })
        }
    }
}

fn ignore_reason(reason: IgnoreReason) -> &'static str {
    match reason {
        IgnoreReason::Busy => "busy",
        IgnoreReason::NotReady => "not_ready",
        IgnoreReason::Locked => "locked",
        IgnoreReason::AtBoundary => "at_boundary",
    }
}

fn error_kind(kind: EngineErrorKind) -> &'static str {
    match kind {
        EngineErrorKind::NotReady => "not_ready",
        EngineErrorKind::TornDown => "torn_down",
        EngineErrorKind::Media => "media",
        EngineErrorKind::Other => "other",
    }
}

/// Human-readable line for one stage event.
pub fn event_line(event: &Event) -> String {
    match event {
        Event::Transport(TransportEvent::LoadProgress { done, total }) => {
            format!("loading {done}/{total}")
        }
        Event::Transport(TransportEvent::Ready { extent }) => format!("ready, extent {extent:.2}"),
        Event::Transport(TransportEvent::LoadFailed { reason }) => format!("load failed: {reason}"),
        Event::Transport(TransportEvent::TransitionStarted {
            from_scene,
            to_scene,
            direction,
            stepped,
        }) => format!(
            "scene {from_scene} -> {to_scene} ({}{})",
            direction_name(*direction),
            if *stepped { ", stepped" } else { "" }
        ),
        Event::Transport(TransportEvent::NativeFallback { direction, rate }) => format!(
            "native {} playback at {rate} unsupported, stepping",
            direction_name(*direction)
        ),
        Event::Transport(TransportEvent::PositionChanged { position }) => {
            format!("position {position:.3}")
        }
        Event::Transport(TransportEvent::SceneChanged { scene_index }) => {
            format!("scene {scene_index}")
        }
        Event::Transport(TransportEvent::TransitionCompleted {
            scene_index,
            position,
        }) => format!("arrived at scene {scene_index} ({position:.3})"),
        Event::Transport(TransportEvent::TransitionCancelled { position }) => {
            format!("transition cancelled at {position:.3}")
        }
        Event::Transport(TransportEvent::InputIgnored { direction, reason }) => format!(
            "{} input ignored ({})",
            direction_name(*direction),
            ignore_reason(*reason)
        ),
        Event::Transport(TransportEvent::LockReleased) => "lock released".to_owned(),
        Event::Transport(TransportEvent::ShutDown) => "transport shut down".to_owned(),
        Event::Input(InputOutcome::Started { target, .. }) => format!("input -> scene {target}"),
        Event::Input(InputOutcome::Completed { scene_index }) => {
            format!("input settled at scene {scene_index}")
        }
        Event::Input(InputOutcome::Ignored(reason)) => {
            format!("input ignored ({})", ignore_reason(*reason))
        }
        Event::FrameReady { position, frame } => format!(
            "frame {}x{} at {position:.3}",
            frame.width, frame.height
        ),
        Event::PopupOpened { scene_index } => format!("popup opened for scene {scene_index}"),
        Event::PopupClosed { scene_index } => format!("popup closed for scene {scene_index}"),
        Event::TornDown => "torn down".to_owned(),
        Event::Error(error) => format!("error ({}): {}", error_kind(error.kind), error.message),
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "forward",
        Direction::Backward => "backward",
    }
}

/// Final stage snapshot printed after a run.
pub fn view_json(view: &StageView) -> Value {
    json!({
        "scene_index": view.scene_index,
        "scene_count": view.scene_count,
        "position": view.position,
        "position_label": view.position_label,
        "scene_label": view.scene_label,
        "scene_button": view.scene_button,
        "popup": view.popup.as_ref().map(|popup| popup.title()),
        "is_ready": view.is_ready,
        "load_failure": view.load_failure,
    })
}
