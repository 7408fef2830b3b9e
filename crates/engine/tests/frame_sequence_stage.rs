use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use engine::{
    Command, EngineError, Event, FrameDecoder, FramePattern, FrameRate, FrameSequenceBackend,
    InputOutcome, Result, SceneTable, SceneTransport, Stage, StageConfig, StageOptions,
    TransportConfig, TransportEvent,
};

/// Paints every frame with its own number; frame 5 is unreadable.
struct NumberedDecoder;

impl FrameDecoder for NumberedDecoder {
    fn decode(&self, path: &Path) -> Result<engine::Frame> {
        let number: u8 = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix("scene-1-"))
            .and_then(|digits| digits.parse().ok())
            .expect("frame names follow the pattern");
        if number == 5 {
            return Err(EngineError::LoadFailed {
                reason: "truncated image".to_owned(),
            });
        }
        Ok(engine::Frame {
            width: 1,
            height: 1,
            bytes: Arc::from(vec![number; 4]),
        })
    }
}

fn pattern(frame_count: usize) -> FramePattern {
    FramePattern {
        dir: "frames".into(),
        prefix: "scene-1-".to_owned(),
        extension: "avif".to_owned(),
        pad_width: 3,
        first_number: 1,
        frame_count,
    }
}

fn stage_until_ready(stage: &mut Stage<FrameSequenceBackend>, now: &mut Duration) {
    for _ in 0..1_000 {
        *now += Duration::from_millis(16);
        stage
            .handle_command(Command::Tick { now: *now })
            .expect("tick should succeed");
        if stage.view().is_ready {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("frame sequence never became ready");
}

#[test]
fn discrete_stage_steps_frame_by_frame_and_substitutes_missing_frames() {
    let backend = FrameSequenceBackend::new(pattern(12), NumberedDecoder, FrameRate::DEFAULT)
        .expect("pattern should be valid");
    let scenes = SceneTable::from_positions(&[0.0, 4.0, 11.0]).expect("valid scenes");
    let transport = SceneTransport::new(backend, scenes, TransportConfig::default());
    let mut stage = Stage::new(
        transport,
        StageOptions {
            frame_positions: true,
            ..StageOptions::default()
        },
    );
    let mut now = Duration::ZERO;
    stage_until_ready(&mut stage, &mut now);

    let events = stage
        .handle_command(Command::Wheel { delta_y: 53.0 })
        .expect("wheel should succeed");
    assert!(matches!(
        events.first(),
        Some(Event::Input(InputOutcome::Started {
            target: 2,
            stepped: true,
            ..
        }))
    ));

    let mut drawn = Vec::new();
    for _ in 0..20 {
        now += Duration::from_millis(40);
        for event in stage
            .handle_command(Command::Tick { now })
            .expect("tick should succeed")
        {
            if let Event::FrameReady { frame, .. } = event {
                drawn.push(frame.bytes[0]);
            }
        }
    }

    assert_eq!(drawn, vec![2, 3, 4, 4]);
    let view = stage.view();
    assert_eq!(view.scene_index, 2);
    assert_eq!(view.position_label, "Frame: 5 / 12");

    let frame = stage.current_frame().expect("frame should be drawn");
    assert_eq!(frame.bytes[0], 4, "frame 5 is missing, frame 4 stands in");
}

#[test]
fn stage_from_config_with_missing_frames_reports_load_failure() {
    let dir = std::env::temp_dir().join(format!(
        "engine-missing-frames-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after the epoch")
            .as_nanos()
    ));
    let json = format!(
        r#"{{
            "media": {{
                "kind": "frames",
                "dir": "{}",
                "prefix": "missing-",
                "extension": "png",
                "frame_count": 2
            }},
            "scenes": [{{ "index": 1, "position": 0.0, "label": "Scene 1" }}]
        }}"#,
        dir.display()
    );
    let config: StageConfig = serde_json::from_str(&json).expect("valid config");
    let mut stage = Stage::from_config(&config).expect("stage should build");

    let mut now = Duration::ZERO;
    let mut failure = None;
    for _ in 0..5_000 {
        now += Duration::from_millis(16);
        let events = stage
            .handle_command(Command::Tick { now })
            .expect("tick should succeed");
        failure = events.into_iter().find_map(|event| match event {
            Event::Transport(TransportEvent::LoadFailed { reason }) => Some(reason),
            _ => None,
        });
        if failure.is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }

    assert!(failure.is_some(), "missing frames must fail the load");
    let view = stage.view();
    assert!(!view.is_ready);
    assert!(view.load_failure.is_some());
    assert!(matches!(
        stage
            .handle_command(Command::Wheel { delta_y: 1.0 })
            .expect("input should be dropped")
            .first(),
        Some(Event::Input(InputOutcome::Ignored(_)))
    ));
}
