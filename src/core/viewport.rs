// Camera projection and render target sizing

use crate::models::jewelry::Offset3D;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// Perspective camera looking down the negative z axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32, // Vertical field of view
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Offset3D,
    pub projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Offset3D::ORIGIN,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute `projection` from the current frustum parameters.
    ///
    /// `aspect` must be non-zero and `near` must differ from `far`.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Matrix4::new_perspective(self.aspect, self.fov_degrees.to_radians(), self.near, self.far);
    }
}

/// Pixel dimensions of the output surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
}

/// Camera plus render target, kept in step on resize
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub camera: PerspectiveCamera,
    pub target: RenderTarget,
}

impl Viewport {
    pub fn new(camera: PerspectiveCamera, width: u32, height: u32) -> Self {
        let mut viewport = Self {
            camera,
            target: RenderTarget { width, height },
        };
        viewport.resize(width, height);
        viewport
    }

    /// Match the camera aspect and render target to a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        // A collapsed surface still gets a finite, non-zero aspect.
        self.camera.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.camera.update_projection_matrix();
        self.target = RenderTarget { width, height };
    }
}
