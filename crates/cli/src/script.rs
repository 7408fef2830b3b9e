use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use engine::Command;
use serde::Deserialize;

/// Gesture replayed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    Wheel {
        delta_y: f64,
    },
    TouchStart {
        y: f64,
    },
    TouchMove {
        y: f64,
    },
    TouchEnd,
    PageScroll {
        container_top: f64,
        container_height: f64,
        viewport_height: f64,
    },
    OpenPopup,
    ClosePopup,
}

impl From<ScriptAction> for Command {
    fn from(value: ScriptAction) -> Self {
        match value {
            ScriptAction::Wheel { delta_y } => Command::Wheel { delta_y },
            ScriptAction::TouchStart { y } => Command::TouchStart { y },
            ScriptAction::TouchMove { y } => Command::TouchMove { y },
            ScriptAction::TouchEnd => Command::TouchEnd,
            ScriptAction::PageScroll {
                container_top,
                container_height,
                viewport_height,
            } => Command::PageScroll {
                container_top,
                container_height,
                viewport_height,
            },
            ScriptAction::OpenPopup => Command::OpenPopup,
            ScriptAction::ClosePopup => Command::ClosePopup,
        }
    }
}

/// One action fired `at_ms` milliseconds after the media became ready.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Reads a script and orders its steps by time, keeping file order for
    /// steps that share a timestamp.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ScriptError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let mut script: Self = serde_json::from_str(text)?;
        script.steps.sort_by_key(|step| step.at_ms);
        Ok(script)
    }
}

#[derive(Debug)]
pub enum ScriptError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read script {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid script {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}
