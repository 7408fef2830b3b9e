use std::thread;
use std::time::Duration;

use engine::{Command, Event, MediaBackend, Result, Stage, StageView};
use tracing::{debug, info, warn};

use crate::script::{Script, ScriptStep};

/// Wheel delta sent for each forward step of a tour.
const TOUR_DELTA: f64 = 100.0;
/// Pause between polls while the media is still loading.
const LOAD_POLL: Duration = Duration::from_millis(2);

/// What the driver feeds into the stage once the media is ready.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Script(Script),
    /// Scroll forward one scene at a time until the last scene.
    Tour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub tick: Duration,
    /// Stage time after which the run is abandoned.
    pub timeout: Duration,
    /// Sleep one tick per iteration instead of running as fast as possible.
    pub realtime: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub elapsed: Duration,
    pub timed_out: bool,
    pub view: StageView,
}

/// Drives `stage` with ticks, injecting the plan's commands, and passes every
/// event to `sink`. Tears the stage down before returning.
pub fn run<B: MediaBackend>(
    stage: &mut Stage<B>,
    plan: Plan,
    options: RunOptions,
    mut sink: impl FnMut(&Event),
) -> Result<RunSummary> {
    let tick = options.tick.max(Duration::from_millis(1));
    let mut steps = match &plan {
        Plan::Script(script) => script.steps.clone(),
        Plan::Tour => Vec::new(),
    }
    .into_iter()
    .peekable();

    let mut now = Duration::ZERO;
    let mut ready_at: Option<Duration> = None;
    let mut ticks = 0_u64;
    let mut timed_out = false;

    loop {
        let tick_events = stage.handle_command(Command::Tick { now })?;
        ticks += 1;
        let quiet = tick_events.is_empty();
        tick_events.iter().for_each(&mut sink);

        let view = stage.view();
        if let Some(reason) = &view.load_failure {
            warn!(%reason, "media failed to load");
            break;
        }
        if view.is_ready && ready_at.is_none() {
            info!(at_ms = now.as_millis() as u64, "media ready");
            ready_at = Some(now);
        }

        if let Some(ready_at) = ready_at {
            let since_ready = now - ready_at;
            match &plan {
                Plan::Script(_) => {
                    while let Some(step) = steps.next_if(|step| is_due(step, since_ready)) {
                        debug!(at_ms = step.at_ms, action = ?step.action, "script step");
                        stage
                            .handle_command(Command::from(step.action))?
                            .iter()
                            .for_each(&mut sink);
                    }
                    if steps.peek().is_none() && quiet && is_settled(stage) {
                        break;
                    }
                }
                Plan::Tour if is_settled(stage) => {
                    let view = stage.view();
                    if view.scene_index >= view.scene_count {
                        break;
                    }
                    stage
                        .handle_command(Command::Wheel {
                            delta_y: TOUR_DELTA,
                        })?
                        .iter()
                        .for_each(&mut sink);
                }
                Plan::Tour => {}
            }
        }

        if now >= options.timeout {
            warn!(timeout_ms = options.timeout.as_millis() as u64, "run timed out");
            timed_out = true;
            break;
        }
        now += tick;
        if options.realtime {
            thread::sleep(tick);
        } else if ready_at.is_none() {
            thread::sleep(LOAD_POLL);
        }
    }

    let view = stage.view();
    stage
        .handle_command(Command::Teardown)?
        .iter()
        .for_each(&mut sink);
    Ok(RunSummary {
        ticks,
        elapsed: now,
        timed_out,
        view,
    })
}

fn is_due(step: &ScriptStep, since_ready: Duration) -> bool {
    Duration::from_millis(step.at_ms) <= since_ready
}

/// No transition in flight and no lock pending.
fn is_settled<B: MediaBackend>(stage: &Stage<B>) -> bool {
    let state = stage.state();
    !state.is_transitioning && !state.is_locked
}
