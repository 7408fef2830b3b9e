use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::gesture::{GestureConfig, InputMode};
use crate::media::sequence::FramePattern;
use crate::momentum::MomentumConfig;
use crate::scene::{Scene, SceneTable};
use crate::time::FrameRate;
use crate::transport::{ReverseStrategy, TransportConfig};

/// Media a stage drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaConfig {
    Video { path: PathBuf },
    Frames(FramePattern),
}

/// Stage document loaded from JSON.
///
/// Only `media` and `scenes` are required; every tunable defaults to the
/// values the hero pages shipped with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub media: MediaConfig,
    /// Stepping cadence. Videos use their probed rate when this is unset;
    /// frame sequences fall back to [`FrameRate::DEFAULT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<FrameRate>,
    #[serde(default)]
    pub input_mode: InputMode,
    #[serde(default = "default_lock_delay_ms")]
    pub lock_delay_ms: u64,
    /// Native playback snap distance, in timeline units.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub reverse: ReverseStrategy,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub momentum: MomentumConfig,
    /// Easing lag for continuous scrubbing; absent means immediate seeks.
    #[serde(default)]
    pub scrub_smoothing_ms: Option<u64>,
    pub scenes: Vec<Scene>,
}

fn default_lock_delay_ms() -> u64 {
    500
}

fn default_tolerance() -> f64 {
    0.02
}

impl StageConfig {
    /// Reads a stage document and resolves relative media paths against the
    /// document's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            context: "failed to read stage config",
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&text).map_err(|source| EngineError::ConfigSerialization {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Makes relative media paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let media_path = match &mut self.media {
            MediaConfig::Video { path } => path,
            MediaConfig::Frames(pattern) => &mut pattern.dir,
        };
        if media_path.is_relative() {
            *media_path = base.join(&*media_path);
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            lock_delay: Duration::from_millis(self.lock_delay_ms),
            reverse: self.reverse,
        }
    }

    pub fn scene_table(&self) -> Result<SceneTable> {
        SceneTable::new(self.scenes.clone())
    }

    pub fn scrub_lag(&self) -> Option<Duration> {
        self.scrub_smoothing_ms.map(Duration::from_millis)
    }
}
