use glam::Vec3;

use crate::resources::material::MaterialKey;
use crate::resources::mesh::MeshKey;
use crate::resources::texture::TextureHandle;
use crate::scene::transform::Transform;

/// Index of an object in [`Scene`](super::Scene) insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

/// Which program draws an object and with what inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// PBR program with a material from the scene's material table.
    Pbr(MaterialKey),
    /// Height-displaced tessellated terrain.
    Terrain {
        height_map: TextureHandle,
        color_map: TextureHandle,
    },
    /// Wave-displaced, alpha blended water surface.
    Water,
}

/// Prop groups the debug panel switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropSet {
    /// Always drawn.
    #[default]
    Always,
    /// Drawn while the alternate set is off.
    Primary,
    /// Drawn while the alternate set is on.
    Alternate,
}

impl PropSet {
    #[inline]
    #[must_use]
    pub fn is_active(self, alternate: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Primary => !alternate,
            Self::Alternate => alternate,
        }
    }
}

/// A transform bound to a mesh and a shading technique.
///
/// The mesh is referenced by key: several objects may draw the same mesh.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub mesh: MeshKey,
    pub shading: Shading,
    pub prop_set: PropSet,
    pub casts_shadow: bool,
}

impl SceneObject {
    /// A shadow-casting object, always drawn.
    pub fn new(name: impl Into<String>, mesh: MeshKey, shading: Shading) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            mesh,
            casts_shadow: !matches!(shading, Shading::Water),
            shading,
            prop_set: PropSet::Always,
        }
    }

    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.set_position(position);
        self
    }

    #[must_use]
    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.transform.set_scale(scale);
        self
    }

    #[must_use]
    pub fn in_prop_set(mut self, prop_set: PropSet) -> Self {
        self.prop_set = prop_set;
        self
    }

    #[must_use]
    pub fn casting_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }

    /// Draw order bucket: models, props, terrain, then water last so it
    /// blends over everything opaque. Light markers sit between models and
    /// props.
    #[must_use]
    pub(crate) fn draw_rank(&self) -> u8 {
        match (self.shading, self.prop_set) {
            (Shading::Pbr(_), PropSet::Always) => 0,
            (Shading::Pbr(_), _) => 2,
            (Shading::Terrain { .. }, _) => 3,
            (Shading::Water, _) => 4,
        }
    }
}

/// Small sphere drawn at every light position in colour passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMarker {
    pub mesh: MeshKey,
    pub material: MaterialKey,
    pub scale: f32,
}

impl LightMarker {
    pub const DRAW_RANK: u8 = 1;

    #[must_use]
    pub fn new(mesh: MeshKey, material: MaterialKey) -> Self {
        Self {
            mesh,
            material,
            scale: 0.2,
        }
    }

    #[must_use]
    pub fn transform_at(&self, position: Vec3) -> Transform {
        Transform::from_position(position).with_scale(Vec3::splat(self.scale))
    }
}
