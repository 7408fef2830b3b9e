use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use engine::{
    Command, EngineErrorEvent, EngineErrorKind, Event, MediaBackend, Stage, StageConfig, StageView,
};
use iced::futures::{SinkExt, StreamExt, channel::mpsc as futures_mpsc, executor};
use iced::{Subscription, stream};
use tracing::{error, info};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const UPDATE_CHANNEL_CAPACITY: usize = 8;
const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 32;

/// Environment variable naming the stage document when no argument is given.
pub const STAGE_ENV_VAR: &str = "REVEAL_STAGE";

/// Sender used by the UI thread to dispatch commands to the stage thread.
pub type StageCommandSender = mpsc::SyncSender<Command>;

/// Receiver used by the UI thread to read updates from the stage thread.
pub type StageUpdateReceiver = mpsc::Receiver<StageUpdate>;

/// What the stage thread reports back.
#[derive(Debug, Clone)]
pub enum StageUpdate {
    Event(Event),
    /// Snapshot taken after a command changed something.
    View(StageView),
}

/// Messages emitted by the stage bridge subscription.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Ready(StageCommandSender),
    Update(StageUpdate),
    Disconnected,
}

/// Builds a subscription that starts the stage bridge and forwards updates.
pub fn stage_subscription() -> Subscription<BridgeEvent> {
    Subscription::run(bridge_worker_stream)
}

fn bridge_worker_stream() -> impl iced::futures::Stream<Item = BridgeEvent> {
    bridge_worker_stream_with(spawn_configured_bridge)
}

fn bridge_worker_stream_with(
    spawn_bridge: fn() -> (StageCommandSender, StageUpdateReceiver),
) -> impl iced::futures::Stream<Item = BridgeEvent> {
    stream::channel(
        SUBSCRIPTION_CHANNEL_CAPACITY,
        move |mut output| async move {
            let (stage_tx, stage_rx) = spawn_bridge();
            let _ = output.send(BridgeEvent::Ready(stage_tx)).await;

            let (forward_tx, mut forward_rx) =
                futures_mpsc::channel::<BridgeEvent>(SUBSCRIPTION_CHANNEL_CAPACITY);

            thread::spawn(move || {
                let mut forward_tx = forward_tx;
                while let Ok(update) = stage_rx.recv() {
                    if executor::block_on(forward_tx.send(BridgeEvent::Update(update))).is_err() {
                        return;
                    }
                }
                let _ = executor::block_on(forward_tx.send(BridgeEvent::Disconnected));
            });

            while let Some(event) = forward_rx.next().await {
                if output.send(event).await.is_err() {
                    break;
                }
            }
        },
    )
}

/// Stage document path: first CLI argument, then [`STAGE_ENV_VAR`].
fn stage_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(STAGE_ENV_VAR))
        .map(PathBuf::from)
}

/// Spawns the production bridge around the FFmpeg-backed stage document.
pub fn spawn_configured_bridge() -> (StageCommandSender, StageUpdateReceiver) {
    let Some(path) = stage_path() else {
        return spawn_failed_bridge(format!(
            "no stage document: pass a path or set {STAGE_ENV_VAR}"
        ));
    };
    let stage = StageConfig::load(&path).and_then(|config| Stage::from_config(&config));
    match stage {
        Ok(stage) => {
            info!(path = %path.display(), "stage loaded");
            spawn_stage_bridge(stage)
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "stage failed to load");
            spawn_failed_bridge(err.to_string())
        }
    }
}

/// Spawns a bridge around any stage backend.
pub fn spawn_stage_bridge<B>(mut stage: Stage<B>) -> (StageCommandSender, StageUpdateReceiver)
where
    B: MediaBackend + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (update_tx, update_rx) = mpsc::sync_channel::<StageUpdate>(UPDATE_CHANNEL_CAPACITY);

    let spawned = thread::Builder::new()
        .name("stage".to_owned())
        .spawn(move || {
            while let Ok(command) = command_rx.recv() {
                let is_tick = matches!(command, Command::Tick { .. });
                let events = match stage.handle_command(command) {
                    Ok(events) => events,
                    Err(error) => vec![Event::Error(EngineErrorEvent::from_error(&error))],
                };
                let changed = !is_tick || !events.is_empty();
                for event in events {
                    if update_tx.send(StageUpdate::Event(event)).is_err() {
                        return;
                    }
                }
                if changed && update_tx.send(StageUpdate::View(stage.view())).is_err() {
                    return;
                }
                if stage.is_torn_down() {
                    return;
                }
            }
        });
    if let Err(err) = spawned {
        error!(error = %err, "failed to spawn stage thread");
    }

    (command_tx, update_rx)
}

/// Bridge whose only output is one error; commands are discarded.
fn spawn_failed_bridge(message: String) -> (StageCommandSender, StageUpdateReceiver) {
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (update_tx, update_rx) = mpsc::sync_channel::<StageUpdate>(UPDATE_CHANNEL_CAPACITY);

    thread::spawn(move || {
        let error = EngineErrorEvent {
            kind: EngineErrorKind::NotReady,
            message,
        };
        if update_tx.send(StageUpdate::Event(Event::Error(error))).is_err() {
            return;
        }
        while command_rx.recv().is_ok() {}
    });

    (command_tx, update_rx)
}
