//! Selection-driven overlay state.
//!
//! The controller owns the whole mutable state of a try-on session and
//! applies three kinds of events to it: pose results, selection changes and
//! asset load outcomes. After any event at most one registered model is
//! visible, and only the model of the selected category can be current.

use crate::core::asset_registry::{AssetLoadOutcome, AssetRegistry, AssetStatus};
use crate::core::placement::place;
use crate::models::jewelry::{JewelryCategory, JewelryModel, Offset3D};
use crate::models::pose::LandmarkSet;
use tracing::{debug, error, info};

/// Mutable state of one session
#[derive(Debug)]
pub struct SessionState {
    pub selected: JewelryCategory,
    pub current: Option<JewelryCategory>, // Key into `registry`
    pub registry: AssetRegistry,
    pub last_landmarks: Option<LandmarkSet>,
}

pub struct OverlayController {
    state: SessionState,
}

impl OverlayController {
    pub fn new(selected: JewelryCategory, registry: AssetRegistry) -> Self {
        Self {
            state: SessionState {
                selected,
                current: None,
                registry,
                last_landmarks: None,
            },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selected(&self) -> JewelryCategory {
        self.state.selected
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.state.registry
    }

    pub fn current_model(&self) -> Option<&JewelryModel> {
        self.state
            .current
            .and_then(|category| self.state.registry.get(category))
    }

    /// Apply a load result: register or fail the category, and show the
    /// model right away if its category is the one selected.
    pub fn on_asset_loaded(&mut self, outcome: AssetLoadOutcome) {
        let AssetLoadOutcome {
            category,
            path,
            result,
        } = outcome;

        match result {
            Ok(scene) => {
                if !self.state.registry.register(category, path, scene) {
                    return;
                }
                info!("Loaded {} model", category);

                if category == self.state.selected {
                    if let Some(model) = self.state.registry.get_mut(category) {
                        model.visible = true;
                    }
                    self.state.current = Some(category);
                }
            }
            Err(e) => {
                error!("Error loading {}: {}", category, e);
                self.state.registry.mark_failed(category, e.to_string());
            }
        }
    }

    /// Per-frame update. Returns the offset applied to the current model.
    ///
    /// Frames without landmarks, or missing a landmark the selected
    /// category needs, leave the scene untouched.
    pub fn on_pose_result(&mut self, landmarks: Option<LandmarkSet>) -> Option<Offset3D> {
        let landmarks = landmarks?;
        let offset = place(self.state.selected, &landmarks);
        self.state.last_landmarks = Some(landmarks);

        let offset = offset?;
        let model = self.current_model_mut()?;
        model.position = offset;
        model.visible = true;
        Some(offset)
    }

    /// Switch the selection to `category`.
    pub fn on_selection_change(&mut self, category: JewelryCategory) {
        if let Some(model) = self.current_model_mut() {
            model.visible = false;
        }
        self.state.selected = category;

        let offset = self
            .state
            .last_landmarks
            .as_ref()
            .and_then(|landmarks| place(category, landmarks));

        match self.state.registry.get_mut(category) {
            Some(model) => {
                model.visible = true;
                if let Some(offset) = offset {
                    model.position = offset;
                }
                self.state.current = Some(category);
                debug!("Selected {}", category);
            }
            None => {
                self.state.current = None;
                match self.state.registry.status(category) {
                    AssetStatus::Failed(reason) => {
                        debug!("Selected {}, unavailable this session: {}", category, reason)
                    }
                    _ => debug!("Selected {}, still loading", category),
                }
            }
        }
    }

    fn current_model_mut(&mut self) -> Option<&mut JewelryModel> {
        let category = self.state.current?;
        self.state.registry.get_mut(category)
    }
}
