//! Viewpoints.
//!
//! Every scene draw receives a [`Viewpoint`] argument: the real camera for
//! the main and depth-of-field passes, a light face for shadow passes.
//! Nothing about "which camera is active" is stored on programs.

use glam::{Mat4, Vec3};

/// View + projection pair a pass renders the scene through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub view: Mat4,
    pub projection: Mat4,
    /// World-space eye position (drives tessellation distance and specular).
    pub position: Vec3,
}

impl Viewpoint {
    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Normalized device depth of a world-space point, or `None` behind the
    /// eye.
    #[must_use]
    pub fn depth_of(&self, world: Vec3) -> Option<f32> {
        let clip = self.view_projection() * world.extend(1.0);
        (clip.w > f32::EPSILON).then(|| clip.z / clip.w)
    }
}

/// Perspective camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 200.0;

    #[must_use]
    pub fn look_at(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
        }
    }

    #[must_use]
    pub fn viewpoint(&self) -> Viewpoint {
        let forward = (self.target - self.position).normalize_or(Vec3::NEG_Z);
        let up = if forward.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        Viewpoint {
            view: Mat4::look_at_rh(self.position, self.position + forward, up),
            projection: Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far),
            position: self.position,
        }
    }
}
