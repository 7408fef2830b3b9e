use serde::{Deserialize, Serialize};

use crate::scene::{Scene, SceneTable};
use crate::transport::TransportState;

/// Content shown in the slide-up panel for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopupContent {
    Product {
        name: String,
        tagline: String,
        description: String,
        #[serde(default)]
        features: Vec<String>,
        #[serde(default)]
        image: Option<String>,
        background_color: String,
        accent_color: String,
        link: String,
    },
    Newsletter {
        headline: String,
        tagline: String,
        description: String,
        #[serde(default)]
        perks: Vec<String>,
        background_color: String,
        accent_color: String,
    },
}

impl PopupContent {
    pub fn title(&self) -> &str {
        match self {
            Self::Product { name, .. } => name,
            Self::Newsletter { headline, .. } => headline,
        }
    }

    pub fn call_to_action(&self) -> &'static str {
        match self {
            Self::Product { .. } => "Explore Collection",
            Self::Newsletter { .. } => "Join Our Newsletter",
        }
    }
}

/// Modal popup state. Only one popup is open at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopupOverlay {
    open_scene: Option<usize>,
}

impl PopupOverlay {
    /// Opens the popup of `scene_index`.
    ///
    /// Returns false when a popup is already open or the scene has no content.
    pub fn open(&mut self, scenes: &SceneTable, scene_index: usize) -> bool {
        if self.open_scene.is_some() {
            return false;
        }
        let has_content = scenes
            .get(scene_index)
            .is_some_and(|scene| scene.popup.is_some());
        if has_content {
            self.open_scene = Some(scene_index);
        }
        has_content
    }

    /// Closes the popup and returns the scene it belonged to.
    pub fn close(&mut self) -> Option<usize> {
        self.open_scene.take()
    }

    pub fn is_open(&self) -> bool {
        self.open_scene.is_some()
    }

    pub fn open_scene(&self) -> Option<usize> {
        self.open_scene
    }

    pub fn content<'a>(&self, scenes: &'a SceneTable) -> Option<&'a PopupContent> {
        scenes.get(self.open_scene?)?.popup.as_ref()
    }
}

/// Scene whose label button should be shown, if any.
///
/// The button is hidden on the opening scene and while a transition runs.
pub fn scene_button<'a>(scenes: &'a SceneTable, state: &TransportState) -> Option<&'a Scene> {
    if state.current_scene_index <= 1 || state.is_transitioning {
        return None;
    }
    scenes.get(state.current_scene_index)
}

#[cfg(test)]
mod tests {
    use super::{PopupContent, PopupOverlay, scene_button};
    use crate::scene::{Scene, SceneTable};
    use crate::transport::TransportState;

    fn scenes() -> SceneTable {
        SceneTable::new(vec![
            Scene {
                index: 1,
                position: 0.0,
                label: "DISCOVER".to_owned(),
                overlay: None,
                popup: None,
            },
            Scene {
                index: 2,
                position: 16.0,
                label: "AURIQUA".to_owned(),
                overlay: None,
                popup: Some(PopupContent::Product {
                    name: "Auriqua".to_owned(),
                    tagline: "Where Elegance Meets Precision".to_owned(),
                    description: String::new(),
                    features: vec!["Sapphire crystal".to_owned()],
                    image: None,
                    background_color: "#E9F7EF".to_owned(),
                    accent_color: "#4A9B6E".to_owned(),
                    link: "/products/auriqua".to_owned(),
                }),
            },
        ])
        .expect("valid scenes")
    }

    fn state(current_scene_index: usize, is_transitioning: bool) -> TransportState {
        TransportState {
            current_scene_index,
            current_position: 0.0,
            direction: None,
            is_transitioning,
            is_locked: is_transitioning,
        }
    }

    #[test]
    fn opens_only_scenes_with_content_and_only_once() {
        let scenes = scenes();
        let mut overlay = PopupOverlay::default();

        assert!(!overlay.open(&scenes, 1));
        assert!(overlay.open(&scenes, 2));
        assert!(!overlay.open(&scenes, 2));
        assert_eq!(overlay.content(&scenes).map(|c| c.title()), Some("Auriqua"));
        assert_eq!(overlay.close(), Some(2));
        assert!(!overlay.is_open());
    }

    #[test]
    fn scene_button_hidden_on_first_scene_and_mid_transition() {
        let scenes = scenes();

        assert!(scene_button(&scenes, &state(1, false)).is_none());
        assert!(scene_button(&scenes, &state(2, true)).is_none());
        assert_eq!(
            scene_button(&scenes, &state(2, false)).map(|scene| scene.label.as_str()),
            Some("AURIQUA")
        );
    }

    #[test]
    fn popup_content_deserializes_from_tagged_json() {
        let json = r##"{
            "kind": "newsletter",
            "headline": "Join Our Journey",
            "tagline": "Be Part of Something Timeless",
            "description": "Subscribe for early access.",
            "background_color": "#FFF7E1",
            "accent_color": "#C9A961"
        }"##;

        let content: PopupContent = serde_json::from_str(json).expect("valid popup");
        assert_eq!(content.call_to_action(), "Join Our Newsletter");
    }
}
