use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::popup::PopupContent;
use crate::time::POSITION_EPSILON;
use crate::transport::Direction;

/// A discrete stop along the media timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// 1-based scene number.
    pub index: usize,
    /// Timeline coordinate: seconds for video, frame index for sequences.
    pub position: f64,
    pub label: String,
    #[serde(default)]
    pub overlay: Option<Overlay>,
    #[serde(default)]
    pub popup: Option<PopupContent>,
}

/// Caption rendered on top of the media while a scene is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub anchor: OverlayAnchor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    #[default]
    Center,
}

/// Ordered, validated list of scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTable {
    scenes: Vec<Scene>,
}

impl SceneTable {
    /// Validates and wraps `scenes`.
    ///
    /// Indices must run `1..=n` in order and positions must be finite and
    /// strictly increasing.
    pub fn new(scenes: Vec<Scene>) -> Result<Self> {
        if scenes.is_empty() {
            return Err(EngineError::EmptySceneTable);
        }

        let mut previous: Option<f64> = None;
        for (offset, scene) in scenes.iter().enumerate() {
            let expected = offset + 1;
            if scene.index != expected {
                return Err(EngineError::SceneIndexMismatch {
                    expected,
                    found: scene.index,
                });
            }
            if !scene.position.is_finite() || scene.position < 0.0 {
                return Err(EngineError::InvalidPosition(scene.position));
            }
            if let Some(previous) = previous {
                if scene.position <= previous {
                    return Err(EngineError::SceneOrder {
                        index: scene.index,
                        previous,
                        position: scene.position,
                    });
                }
            }
            previous = Some(scene.position);
        }

        Ok(Self { scenes })
    }

    /// Builds a table of unlabeled scenes from bare positions.
    ///
    /// # Example
    /// ```
    /// use engine::SceneTable;
    ///
    /// let table = SceneTable::from_positions(&[0.0, 7.12, 17.95]).expect("valid");
    /// assert_eq!(table.len(), 3);
    /// assert_eq!(table.position_of(2), Some(7.12));
    /// ```
    pub fn from_positions(positions: &[f64]) -> Result<Self> {
        Self::new(
            positions
                .iter()
                .enumerate()
                .map(|(offset, position)| Scene {
                    index: offset + 1,
                    position: *position,
                    label: format!("Scene {}", offset + 1),
                    overlay: None,
                    popup: None,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn first(&self) -> &Scene {
        &self.scenes[0]
    }

    pub fn last(&self) -> &Scene {
        &self.scenes[self.scenes.len() - 1]
    }

    /// Returns the scene with 1-based `index`.
    pub fn get(&self, index: usize) -> Option<&Scene> {
        index.checked_sub(1).and_then(|offset| self.scenes.get(offset))
    }

    pub fn position_of(&self, index: usize) -> Option<f64> {
        self.get(index).map(|scene| scene.position)
    }

    /// Returns the neighbor of `index` in `direction`, if one exists.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let target = match direction {
            Direction::Forward => index.checked_add(1)?,
            Direction::Backward => index.checked_sub(1)?,
        };
        self.get(target).map(|scene| scene.index)
    }

    /// Index of the last scene whose position is at or before `position`.
    pub fn scene_index_at(&self, position: f64) -> usize {
        self.scenes
            .iter()
            .rev()
            .find(|scene| scene.position <= position + POSITION_EPSILON)
            .map(|scene| scene.index)
            .unwrap_or(1)
    }

    /// Returns the gap between the last scene and `extent` when they differ.
    pub fn extent_mismatch(&self, extent: f64) -> Option<f64> {
        let gap = extent - self.last().position;
        (gap.abs() > 1e-6).then_some(gap)
    }
}

#[cfg(test)]
mod tests {
    use super::SceneTable;
    use crate::error::EngineError;
    use crate::transport::Direction;

    #[test]
    fn rejects_non_increasing_positions() {
        let result = SceneTable::from_positions(&[0.0, 5.0, 5.0]);
        assert!(matches!(
            result,
            Err(EngineError::SceneOrder { index: 3, .. })
        ));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            SceneTable::from_positions(&[]),
            Err(EngineError::EmptySceneTable)
        ));
    }

    #[test]
    fn neighbors_stop_at_both_ends() {
        let table = SceneTable::from_positions(&[0.0, 16.0, 31.0, 35.0]).expect("valid");

        assert_eq!(table.neighbor(1, Direction::Backward), None);
        assert_eq!(table.neighbor(1, Direction::Forward), Some(2));
        assert_eq!(table.neighbor(4, Direction::Forward), None);
        assert_eq!(table.neighbor(4, Direction::Backward), Some(3));
    }

    #[test]
    fn scene_index_follows_last_scene_at_or_before_position() {
        let table = SceneTable::from_positions(&[0.0, 3.0, 6.0, 9.0]).expect("valid");

        assert_eq!(table.scene_index_at(0.0), 1);
        assert_eq!(table.scene_index_at(2.99), 1);
        assert_eq!(table.scene_index_at(3.0), 2);
        assert_eq!(table.scene_index_at(100.0), 4);
    }

    #[test]
    fn reports_extent_mismatch() {
        let table = SceneTable::from_positions(&[0.0, 16.0, 31.0, 35.0]).expect("valid");

        assert_eq!(table.extent_mismatch(35.0), None);
        assert_eq!(table.extent_mismatch(36.5), Some(1.5));
    }
}
