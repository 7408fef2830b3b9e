mod report;
mod run;
mod script;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use engine::{Stage, StageConfig};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use crate::run::{Plan, RunOptions};
use crate::script::Script;

/// Replays scroll gestures against a stage document without a window.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Stage document (JSON)
    #[arg(value_name = "STAGE")]
    stage: PathBuf,

    /// Gesture script; without one the driver tours every scene forward
    #[arg(long, value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Give up after this much stage time, in milliseconds
    #[arg(long, default_value_t = 60_000)]
    timeout_ms: u64,

    /// Run ticks back to back instead of sleeping between them
    #[arg(long)]
    fast: bool,

    /// Skip decoding frames after position changes
    #[arg(long)]
    no_frames: bool,

    /// Event output format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    let config = match StageConfig::load(&cli.stage) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load stage document");
            return ExitCode::FAILURE;
        }
    };
    let plan = match &cli.script {
        Some(path) => match Script::load(path) {
            Ok(script) => Plan::Script(script),
            Err(err) => {
                error!(error = %err, "failed to load script");
                return ExitCode::FAILURE;
            }
        },
        None => Plan::Tour,
    };
    let mut stage = match Stage::from_config(&config) {
        Ok(stage) => stage,
        Err(err) => {
            error!(error = %err, "failed to build stage");
            return ExitCode::FAILURE;
        }
    };
    stage.set_emit_frames(!cli.no_frames);

    info!(stage = %cli.stage.display(), scenes = config.scenes.len(), "driving stage");
    let options = RunOptions {
        tick: Duration::from_millis(cli.tick_ms),
        timeout: Duration::from_millis(cli.timeout_ms),
        realtime: !cli.fast,
    };
    let output = cli.output;
    let result = run::run(&mut stage, plan, options, |event| match output {
        OutputFormat::Text => println!("{}", report::event_line(event)),
        OutputFormat::Json => println!("{}", report::event_json(event)),
    });

    match result {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "run finished"
            );
            match output {
                OutputFormat::Text => println!(
                    "{} at {}",
                    summary.view.scene_label, summary.view.position_label
                ),
                OutputFormat::Json => println!("{}", report::view_json(&summary.view)),
            }
            if summary.timed_out || summary.view.load_failure.is_some() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            error!(error = %err, "run aborted");
            ExitCode::FAILURE
        }
    }
}
