// Scene description handed to the renderer once per frame cycle

use crate::core::viewport::{PerspectiveCamera, RenderTarget};
use crate::models::jewelry::JewelryModel;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Directional light shining along `direction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: u32, // 0xRRGGBB
    pub intensity: f32,
    pub direction: Vector3<f32>, // Unit length
}

impl DirectionalLight {
    /// A zero `direction` falls back to +z.
    pub fn new(color: u32, intensity: f32, direction: Vector3<f32>) -> Self {
        Self {
            color,
            intensity,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z),
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(0xffffff, 1.0, Vector3::new(0.0, 1.0, 1.0))
    }
}

/// Everything drawn in one frame
#[derive(Debug, Clone, Copy)]
pub struct SceneSnapshot<'a> {
    pub frame_index: u64,
    pub camera: &'a PerspectiveCamera,
    pub target: RenderTarget,
    pub light: &'a DirectionalLight,
    pub model: Option<&'a JewelryModel>, // The visible model, if any
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Render target unavailable: {0}")]
    TargetUnavailable(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Draws the current scene to an output surface
pub trait SceneRenderer: Send {
    fn render(&mut self, scene: &SceneSnapshot<'_>) -> RenderResult<()>;
}

/// Renderer that only reports what it would draw
#[derive(Debug, Default)]
pub struct TracingRenderer {
    frames_drawn: u64,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl SceneRenderer for TracingRenderer {
    fn render(&mut self, scene: &SceneSnapshot<'_>) -> RenderResult<()> {
        if scene.target.width == 0 || scene.target.height == 0 {
            return Err(RenderError::TargetUnavailable(format!(
                "{}x{} surface",
                scene.target.width, scene.target.height
            )));
        }

        match scene.model {
            Some(model) => debug!(
                frame = scene.frame_index,
                category = %model.category,
                x = model.position.x,
                y = model.position.y,
                z = model.position.z,
                "draw"
            ),
            None => debug!(frame = scene.frame_index, "draw (no jewelry)"),
        }

        self.frames_drawn += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light_is_normalized() {
        let light = DirectionalLight::default();
        assert!((light.direction.norm() - 1.0).abs() < 1e-6);
        assert!((light.direction.y - light.direction.z).abs() < 1e-6);
        assert_eq!(light.direction.x, 0.0);
        assert_eq!(light.color, 0xffffff);
        assert_eq!(light.intensity, 1.0);
    }

    #[test]
    fn test_zero_direction_falls_back_to_z() {
        let light = DirectionalLight::new(0xffffff, 1.0, Vector3::zeros());
        assert_eq!(light.direction, Vector3::z());
    }

    #[test]
    fn test_tracing_renderer_counts_frames() {
        let camera = PerspectiveCamera::new(75.0, 4.0 / 3.0, 0.1, 1000.0);
        let light = DirectionalLight::default();
        let mut renderer = TracingRenderer::new();

        let snapshot = SceneSnapshot {
            frame_index: 0,
            camera: &camera,
            target: RenderTarget { width: 640, height: 480 },
            light: &light,
            model: None,
        };
        renderer.render(&snapshot).unwrap();
        assert_eq!(renderer.frames_drawn(), 1);

        let collapsed = SceneSnapshot {
            target: RenderTarget { width: 640, height: 0 },
            ..snapshot
        };
        assert!(renderer.render(&collapsed).is_err());
        assert_eq!(renderer.frames_drawn(), 1);
    }
}
