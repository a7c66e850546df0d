use glam::Vec2;

use crate::resources::bloom::clamp_logged;

/// Height displacement applied to the terrain patch grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightMapSettings {
    pub amplitude: f32,
    /// World-space extent the height map is stretched over.
    pub world_dimensions: Vec2,
    /// Average neighbouring height samples.
    pub smoothing: bool,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            amplitude: 20.0,
            world_dimensions: Vec2::splat(200.0),
            smoothing: false,
        }
    }
}

/// Distance-based tessellation of terrain and water patches.
///
/// Factors are interpolated from `factors.y` at `distances.x` or closer to
/// `factors.x` at `distances.y` or farther.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tessellation {
    factors: Vec2,
    distances: Vec2,
}

impl Tessellation {
    pub const FACTOR_RANGE: (f32, f32) = (1.0, 64.0);
    pub const DISTANCE_RANGE: (f32, f32) = (0.0, 100.0);

    /// No adaptive detail: one subdivision everywhere. Shadow passes use
    /// this.
    pub const MINIMUM: Self = Self {
        factors: Vec2::ONE,
        distances: Vec2::new(0.0, 100.0),
    };

    /// `(min, max)` tessellation factors.
    #[inline]
    #[must_use]
    pub fn factors(&self) -> Vec2 {
        self.factors
    }

    /// `(near, far)` distances.
    #[inline]
    #[must_use]
    pub fn distances(&self) -> Vec2 {
        self.distances
    }

    pub fn set_factors(&mut self, min: f32, max: f32) {
        let min = clamp_logged("tessellation min", min, Self::FACTOR_RANGE);
        let max = clamp_logged("tessellation max", max, Self::FACTOR_RANGE);
        self.factors = Vec2::new(min.min(max), max.max(min));
    }

    pub fn set_distances(&mut self, near: f32, far: f32) {
        let near = clamp_logged("tessellation near", near, Self::DISTANCE_RANGE);
        let far = clamp_logged("tessellation far", far, Self::DISTANCE_RANGE);
        self.distances = Vec2::new(near.min(far), far.max(near));
    }
}

impl Default for Tessellation {
    fn default() -> Self {
        Self::MINIMUM
    }
}
