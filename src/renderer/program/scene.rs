//! Scene-geometry programs: PBR props and models, height-mapped terrain and
//! wave-displaced water.
//!
//! All three share [`SceneDraw`]: viewpoint, world matrix, lights, the
//! shadow maps to sample and the depth band to keep.

use glam::Mat4;

use super::uniforms::{
    CAMERA_SLOT, CameraBlock, DEPTH_RANGE_SLOT, DepthRangeBlock, HeightMapBlock, LIGHT_SLOT,
    LightBlock, MATRIX_SLOT, MaterialBlock, MatrixBlock, SHADOW_TEXTURE_BASE, TECHNIQUE_SLOT,
    TESSELLATION_SLOT, TessellationBlock, WaveBlock,
};
use super::{ProgramHandle, ShaderProgram};
use crate::errors::Result;
use crate::renderer::core::{CommandStream, TextureView};
use crate::resources::dof::DepthBand;
use crate::resources::material::Material;
use crate::resources::texture::TextureHandle;
use crate::scene::camera::Viewpoint;
use crate::scene::terrain::{HeightMapSettings, Tessellation};
use crate::scene::waves::{WAVE_COUNT, WaveDescriptor};

/// Per-draw inputs common to every scene program.
#[derive(Clone, Copy, Debug)]
pub struct SceneDraw<'p> {
    pub viewpoint: &'p Viewpoint,
    pub world: Mat4,
    pub lights: &'p LightBlock,
    /// Shadow maps to sample, in light order. Empty while rendering into
    /// shadow maps.
    pub shadow_maps: &'p [TextureView],
    pub depth_range: DepthBand,
}

impl SceneDraw<'_> {
    fn bind(&self, stream: &mut CommandStream<'_>) -> Result<()> {
        stream.set_uniform_block(
            MATRIX_SLOT,
            &MatrixBlock::new(self.world, self.viewpoint.view, self.viewpoint.projection),
        )?;
        stream.set_uniform_block(CAMERA_SLOT, &CameraBlock::new(self.viewpoint.position))?;
        stream.set_uniform_block(LIGHT_SLOT, self.lights)?;
        stream.set_uniform_block(DEPTH_RANGE_SLOT, &DepthRangeBlock::from(self.depth_range))?;
        for (index, view) in self.shadow_maps.iter().enumerate() {
            stream.bind_texture(SHADOW_TEXTURE_BASE + index as u32, *view)?;
        }
        Ok(())
    }
}

// ─── PBR ──────────────────────────────────────────────────────────────────────

pub struct PbrParams<'p> {
    pub scene: SceneDraw<'p>,
    pub material: &'p Material,
}

pub struct PbrProgram {
    handle: ProgramHandle,
}

impl PbrProgram {
    #[must_use]
    pub fn new(handle: ProgramHandle) -> Self {
        Self { handle }
    }
}

impl ShaderProgram for PbrProgram {
    type Params<'p> = PbrParams<'p>;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &PbrParams<'_>) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        params.scene.bind(stream)?;
        stream.set_uniform_block(TECHNIQUE_SLOT, &MaterialBlock::from(params.material))?;
        // Maps whose flag is off, or that are absent, stay unbound.
        for (slot, handle) in params.material.sampled_textures() {
            stream.bind_texture(slot, TextureView::Asset(handle))?;
        }
        Ok(())
    }
}

// ─── Terrain ──────────────────────────────────────────────────────────────────

pub struct TerrainParams<'p> {
    pub scene: SceneDraw<'p>,
    pub height_map: &'p HeightMapSettings,
    pub tessellation: Tessellation,
    pub height_texture: TextureHandle,
    pub color_texture: TextureHandle,
}

pub struct TerrainProgram {
    handle: ProgramHandle,
}

impl TerrainProgram {
    pub const HEIGHT_SLOT: u32 = 0;
    pub const COLOR_SLOT: u32 = 1;

    #[must_use]
    pub fn new(handle: ProgramHandle) -> Self {
        Self { handle }
    }
}

impl ShaderProgram for TerrainProgram {
    type Params<'p> = TerrainParams<'p>;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &TerrainParams<'_>) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        params.scene.bind(stream)?;
        stream.set_uniform_block(TECHNIQUE_SLOT, &HeightMapBlock::from(params.height_map))?;
        stream.set_uniform_block(
            TESSELLATION_SLOT,
            &TessellationBlock::new(&params.tessellation, params.scene.viewpoint.position),
        )?;
        stream.bind_texture(Self::HEIGHT_SLOT, TextureView::Asset(params.height_texture))?;
        stream.bind_texture(Self::COLOR_SLOT, TextureView::Asset(params.color_texture))
    }
}

// ─── Water ────────────────────────────────────────────────────────────────────

pub struct WaterParams<'p> {
    pub scene: SceneDraw<'p>,
    pub waves: &'p [WaveDescriptor; WAVE_COUNT],
    pub tessellation: Tessellation,
}

pub struct WaterProgram {
    handle: ProgramHandle,
}

impl WaterProgram {
    #[must_use]
    pub fn new(handle: ProgramHandle) -> Self {
        Self { handle }
    }
}

impl ShaderProgram for WaterProgram {
    type Params<'p> = WaterParams<'p>;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &WaterParams<'_>) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        params.scene.bind(stream)?;
        stream.set_uniform_block(TECHNIQUE_SLOT, &WaveBlock::from(params.waves))?;
        stream.set_uniform_block(
            TESSELLATION_SLOT,
            &TessellationBlock::new(&params.tessellation, params.scene.viewpoint.position),
        )
    }
}
