use glam::Vec3;
use log::{debug, info};
use slotmap::SlotMap;

use crate::errors::{Result, StrataError};
use crate::renderer::core::{Allocator, ShadowMap};
use crate::renderer::settings::ShadowSettings;
use crate::resources::bloom::BloomSettings;
use crate::resources::dof::DofSettings;
use crate::resources::material::{Material, MaterialKey};
use crate::resources::mesh::MeshLibrary;
use crate::resources::texture::TextureRegistry;
use crate::scene::light::{LightKind, LightSource, MAX_LIGHTS};
use crate::scene::object::{LightMarker, ObjectId, SceneObject};
use crate::scene::terrain::{HeightMapSettings, Tessellation};
use crate::scene::waves::WaveSet;

/// Index of a light in the scene's light list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub usize);

/// A light together with the shadow map it renders into.
#[derive(Debug)]
pub struct SceneLight {
    pub light: LightSource,
    shadow_map: ShadowMap,
}

impl SceneLight {
    #[inline]
    #[must_use]
    pub fn shadow_map(&self) -> &ShadowMap {
        &self.shadow_map
    }
}

/// Moves a point light back and forth along Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingingLight {
    pub light: LightId,
    pub enabled: bool,
    /// Position at the centre of the swing.
    pub anchor: Vec3,
    pub amplitude: f32,
}

impl SwingingLight {
    #[must_use]
    pub fn position_at(&self, time: f32) -> Vec3 {
        self.anchor + Vec3::Z * (time.sin() * self.amplitude)
    }
}

/// Everything a frame renders, plus the tunables the debug panel edits.
pub struct Scene {
    lights: Vec<SceneLight>,
    objects: Vec<SceneObject>,
    materials: SlotMap<MaterialKey, Material>,
    pub meshes: MeshLibrary,
    pub textures: TextureRegistry,
    pub marker: Option<LightMarker>,
    pub swing: Option<SwingingLight>,

    // === Tunables ===
    pub bloom: BloomSettings,
    pub dof: DofSettings,
    pub waves: WaveSet,
    pub height_map: HeightMapSettings,
    pub tessellation: Tessellation,
    pub wireframe: bool,
    pub alternate_props: bool,

    time: f32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lights: Vec::with_capacity(MAX_LIGHTS),
            objects: Vec::new(),
            materials: SlotMap::with_key(),
            meshes: MeshLibrary::new(),
            textures: TextureRegistry::new(),
            marker: None,
            swing: None,
            bloom: BloomSettings::default(),
            dof: DofSettings::default(),
            waves: WaveSet::default(),
            height_map: HeightMapSettings::default(),
            tessellation: Tessellation::default(),
            wireframe: false,
            alternate_props: false,
            time: 0.0,
        }
    }

    // ========================================================================
    // Lights
    // ========================================================================

    /// Appends a light and allocates its shadow map.
    ///
    /// Fails with [`StrataError::LightCapacityExceeded`] once the list holds
    /// [`MAX_LIGHTS`] lights; nothing is allocated in that case.
    pub fn add_light(
        &mut self,
        allocator: &mut Allocator<'_>,
        shadows: &ShadowSettings,
        light: LightSource,
    ) -> Result<LightId> {
        if self.lights.len() >= MAX_LIGHTS {
            return Err(StrataError::LightCapacityExceeded { max: MAX_LIGHTS });
        }
        let id = LightId(self.lights.len());
        let shadow_map = allocate_shadow_map(allocator, shadows, id, light.kind())?;
        info!("Added {:?} light #{}", light.kind(), id.0);
        self.lights.push(SceneLight { light, shadow_map });
        Ok(id)
    }

    /// Changes a light's kind, reallocating its shadow map when the layout
    /// changes between single and cube.
    pub fn set_light_kind(
        &mut self,
        allocator: &mut Allocator<'_>,
        shadows: &ShadowSettings,
        id: LightId,
        kind: LightKind,
    ) -> Result<()> {
        let entry = self.lights.get_mut(id.0).ok_or(StrataError::InvalidSetting {
            name: "light id",
            reason: format!("no light #{}", id.0),
        })?;
        if entry.shadow_map.kind() != kind.shadow_map_kind() {
            // Old map is released when the replaced value drops.
            entry.shadow_map = allocate_shadow_map(allocator, shadows, id, kind)?;
        }
        entry.light.set_kind(kind);
        Ok(())
    }

    #[must_use]
    pub fn lights(&self) -> &[SceneLight] {
        &self.lights
    }

    #[must_use]
    pub fn light(&self, id: LightId) -> Option<&LightSource> {
        self.lights.get(id.0).map(|entry| &entry.light)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut LightSource> {
        self.lights.get_mut(id.0).map(|entry| &mut entry.light)
    }

    // ========================================================================
    // Objects & materials
    // ========================================================================

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    #[must_use]
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Seconds of scene time accumulated by [`update`](Self::update).
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances animation and rebuilds every light's shadow matrices.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.waves.advance(dt);

        let time = self.time;
        if let Some(swing) = self.swing.filter(|swing| swing.enabled)
            && let Some(light) = self.light_mut(swing.light)
        {
            light.set_position(swing.position_at(time));
        }

        for entry in &mut self.lights {
            entry.light.generate_shadow_matrices();
        }
        debug!("Scene updated to t = {:.3}", self.time);
    }
}

fn allocate_shadow_map(
    allocator: &mut Allocator<'_>,
    shadows: &ShadowSettings,
    id: LightId,
    kind: LightKind,
) -> Result<ShadowMap> {
    let map_kind = kind.shadow_map_kind();
    allocator.shadow_map(
        format!("light_{}_shadow", id.0),
        map_kind,
        shadows.size_for(map_kind),
        shadows.format,
    )
}
