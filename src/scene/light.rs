//! Light sources and their shadow projections.
//!
//! A light owns the matrices it is rendered through during shadow passes:
//!
//! | Kind        | Faces | Projection                               |
//! |-------------|-------|------------------------------------------|
//! | Directional | 1     | orthographic 200×200, near 0.01, far 200 |
//! | Point       | 6     | perspective 90°, aspect 1, near 0.1, far 200 |
//! | Spot        | 6     | same as point                            |
//!
//! Cube faces are produced by the pure [`cube_face_view`]; the light's own
//! direction is never touched while building them.

use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::renderer::core::ShadowMapKind;
use crate::scene::camera::Viewpoint;

/// Capacity of the shader-side light array.
pub const MAX_LIGHTS: usize = 8;

/// Distance a directional light is pulled back along its direction.
pub const DIRECTIONAL_DISTANCE: f32 = 100.0;
pub const DIRECTIONAL_EXTENT: f32 = 200.0;
pub const DIRECTIONAL_NEAR: f32 = 0.01;
pub const DIRECTIONAL_FAR: f32 = 200.0;

pub const CUBE_NEAR: f32 = 0.1;
pub const CUBE_FAR: f32 = 200.0;

// ============================================================================
// Light kind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    /// Cone cutoffs in degrees; light fades between `inner` and `outer`.
    Spot { inner: f32, outer: f32 },
}

impl LightKind {
    /// Type tag stored in the light uniform block.
    #[must_use]
    pub fn gpu_tag(self) -> i32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
            Self::Spot { .. } => 2,
        }
    }

    #[must_use]
    pub fn shadow_map_kind(self) -> ShadowMapKind {
        match self {
            Self::Directional => ShadowMapKind::Single,
            Self::Point | Self::Spot { .. } => ShadowMapKind::Cube,
        }
    }

    #[inline]
    #[must_use]
    pub fn face_count(self) -> usize {
        self.shadow_map_kind().face_count()
    }
}

/// Distance falloff coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

impl Attenuation {
    /// `1 / (c + l·d + q·d²)`; zero when the denominator is not positive.
    #[must_use]
    pub fn factor(&self, distance: f32) -> f32 {
        let denom = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denom > f32::EPSILON { 1.0 / denom } else { 0.0 }
    }
}

// ============================================================================
// Cube faces
// ============================================================================

/// Cube map face, in layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    #[must_use]
    pub fn direction(self) -> Vec3 {
        match self {
            Self::PositiveX => Vec3::X,
            Self::NegativeX => Vec3::NEG_X,
            Self::PositiveY => Vec3::Y,
            Self::NegativeY => Vec3::NEG_Y,
            Self::PositiveZ => Vec3::Z,
            Self::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector for the face. The ±Y faces look along the up axis and use
    /// ∓Z instead.
    #[must_use]
    pub fn up(self) -> Vec3 {
        match self {
            Self::PositiveY => Vec3::NEG_Z,
            Self::NegativeY => Vec3::Z,
            _ => Vec3::Y,
        }
    }
}

/// View matrix looking from `position` through `face`.
#[must_use]
pub fn cube_face_view(position: Vec3, face: CubeFace) -> Mat4 {
    Mat4::look_at_rh(position, position + face.direction(), face.up())
}

#[must_use]
pub fn cube_face_projection() -> Mat4 {
    Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, CUBE_NEAR, CUBE_FAR)
}

#[must_use]
pub fn directional_projection() -> Mat4 {
    let half = DIRECTIONAL_EXTENT * 0.5;
    Mat4::orthographic_rh(-half, half, -half, half, DIRECTIONAL_NEAR, DIRECTIONAL_FAR)
}

/// View matrix looking from `position` along the unit vector `direction`.
#[must_use]
pub fn directional_view(position: Vec3, direction: Vec3) -> Mat4 {
    let up = if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    Mat4::look_at_rh(position, position + direction, up)
}

fn safe_dir(direction: Vec3) -> Vec3 {
    if direction.length_squared() > 1e-6 {
        direction.normalize()
    } else {
        Vec3::NEG_Y
    }
}

// ============================================================================
// Shadow matrices
// ============================================================================

/// Per-face view matrices and the shared projection of one light.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowMatrices {
    views: SmallVec<[Mat4; 6]>,
    projection: Mat4,
}

impl ShadowMatrices {
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn view(&self, face: usize) -> Option<Mat4> {
        self.views.get(face).copied()
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[must_use]
    pub fn views(&self) -> &[Mat4] {
        &self.views
    }
}

// ============================================================================
// Light source
// ============================================================================

/// A positioned emitter and the matrices its shadow map is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    kind: LightKind,
    position: Vec3,
    direction: Vec3,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub power: f32,
    pub attenuation: Attenuation,
    matrices: ShadowMatrices,
}

impl LightSource {
    /// Base constructor; every public constructor goes through here so the
    /// matrices are valid from the start.
    fn with_kind(kind: LightKind, position: Vec3, direction: Vec3) -> Self {
        let mut light = Self {
            kind,
            position,
            direction,
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::ONE,
            power: 1.0,
            attenuation: Attenuation::default(),
            matrices: ShadowMatrices {
                views: SmallVec::new(),
                projection: Mat4::IDENTITY,
            },
        };
        light.generate_shadow_matrices();
        light
    }

    #[must_use]
    pub fn directional(direction: Vec3) -> Self {
        Self::with_kind(LightKind::Directional, Vec3::ZERO, direction)
    }

    #[must_use]
    pub fn point(position: Vec3) -> Self {
        Self::with_kind(LightKind::Point, position, Vec3::NEG_Y)
    }

    /// `inner` and `outer` are cone cutoffs in degrees.
    #[must_use]
    pub fn spot(position: Vec3, direction: Vec3, inner: f32, outer: f32) -> Self {
        Self::with_kind(LightKind::Spot { inner, outer }, position, direction)
    }

    #[must_use]
    pub fn with_ambient(mut self, ambient: Vec4) -> Self {
        self.ambient = ambient;
        self
    }

    #[must_use]
    pub fn with_diffuse(mut self, diffuse: Vec4) -> Self {
        self.diffuse = diffuse;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    #[must_use]
    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }

    // === Accessors ===

    #[inline]
    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    #[must_use]
    pub fn shadow_matrices(&self) -> &ShadowMatrices {
        &self.matrices
    }

    /// Viewpoint of one shadow face.
    #[must_use]
    pub fn face_viewpoint(&self, face: usize) -> Option<Viewpoint> {
        self.matrices.view(face).map(|view| Viewpoint {
            view,
            projection: self.matrices.projection,
            position: self.position,
        })
    }

    // === Mutation (always followed by a matrix rebuild) ===

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.generate_shadow_matrices();
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
        self.generate_shadow_matrices();
    }

    /// Changes the cone angles of a spot light. Other kinds are unaffected.
    pub fn set_spot_angles(&mut self, inner_deg: f32, outer_deg: f32) {
        if let LightKind::Spot { inner, outer } = &mut self.kind {
            *inner = inner_deg;
            *outer = outer_deg;
        }
    }

    /// Kind changes can alter the shadow map layout, so they go through
    /// [`Scene::set_light_kind`](crate::scene::Scene::set_light_kind).
    pub(crate) fn set_kind(&mut self, kind: LightKind) {
        self.kind = kind;
        self.generate_shadow_matrices();
    }

    /// Rebuilds the view/projection matrices from kind, position and
    /// direction.
    ///
    /// Directional lights normalize their direction and move to
    /// `-direction * 100` so the whole scene lies in front of them. Point
    /// and spot lights get one view per cube face; their direction is left
    /// as it was.
    pub fn generate_shadow_matrices(&mut self) {
        match self.kind {
            LightKind::Directional => {
                self.direction = safe_dir(self.direction);
                self.position = -self.direction * DIRECTIONAL_DISTANCE;
                self.matrices.views.clear();
                self.matrices
                    .views
                    .push(directional_view(self.position, self.direction));
                self.matrices.projection = directional_projection();
            }
            LightKind::Point | LightKind::Spot { .. } => {
                let position = self.position;
                self.matrices.views.clear();
                self.matrices.views.extend(
                    CubeFace::ALL
                        .iter()
                        .map(|face| cube_face_view(position, *face)),
                );
                self.matrices.projection = cube_face_projection();
            }
        }
    }
}
