use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position / Euler rotation / scale of a scene object.
///
/// The world matrix is rebuilt immediately by every setter, so
/// [`world_matrix`](Self::world_matrix) is always current and never needs a
/// separate update step.
///
/// # Composition
///
/// Scale is applied first, then rotation, then translation. In glam's
/// column-vector form that is `T * R * S`. Rotation is given in radians as
/// `(pitch, yaw, roll)` = `(x, y, z)` and applied roll first, then pitch,
/// then yaw: `R = Ry(yaw) * Rx(pitch) * Rz(roll)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    world: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        let mut transform = Self::new();
        transform.set_position(position);
        transform
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_scale(scale);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.set_rotation(rotation);
        self
    }

    // ========================================================================
    // Setters (each rebuilds the world matrix)
    // ========================================================================

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.rebuild();
    }

    /// Euler angles in radians, `(pitch, yaw, roll)`.
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.rebuild();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.world = compose_world_matrix(self.position, self.rotation, self.scale);
    }

    // ========================================================================
    // Getters
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }
}

/// `Scale · Rotation · Translation` as a column-major matrix.
#[must_use]
pub fn compose_world_matrix(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z);
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}
