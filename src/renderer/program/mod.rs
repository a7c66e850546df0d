//! Shader Programs
//!
//! A shader program is a compiled pipeline plus the knowledge of how to feed
//! it. Each technique implements [`ShaderProgram`] with its own parameter
//! type, and draws are composed as `bind` followed by a mesh draw:
//!
//! ```text
//! PbrProgram::bind(stream, &PbrParams { scene: SceneDraw { viewpoint, .. }, material })
//!     └─► set_uniform_block × N, bind_texture × M
//! Mesh::draw(stream, topology)
//!     └─► bind_mesh, draw
//! ```
//!
//! The viewpoint is always part of the parameters, never program state.

pub mod post;
pub mod scene;
pub mod uniforms;

pub use post::{
    BloomBlurParams, BloomBlurProgram, BloomCompositeParams, BloomCompositeProgram,
    BloomThresholdParams, BloomThresholdProgram, DofBlurParams, DofBlurProgram,
    DofCompositeParams, DofCompositeProgram, TextureParams, TextureProgram,
};
pub use scene::{
    PbrParams, PbrProgram, SceneDraw, TerrainParams, TerrainProgram, WaterParams, WaterProgram,
};

use log::debug;

use crate::errors::Result;
use crate::renderer::core::{
    Allocator, CommandStream, OwnedResource, ProgramDesc, ProgramId, ResourceId, ShaderStages,
    Topology,
};
use crate::resources::mesh::Mesh;

/// Every technique the pipeline draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Technique {
    Pbr,
    Terrain,
    Water,
    DofBlur,
    DofComposite,
    BloomThreshold,
    BloomBlur,
    BloomComposite,
    Texture,
}

impl Technique {
    pub const ALL: [Self; 9] = [
        Self::Pbr,
        Self::Terrain,
        Self::Water,
        Self::DofBlur,
        Self::DofComposite,
        Self::BloomThreshold,
        Self::BloomBlur,
        Self::BloomComposite,
        Self::Texture,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pbr => "pbr",
            Self::Terrain => "terrain",
            Self::Water => "water",
            Self::DofBlur => "dof_blur",
            Self::DofComposite => "dof_composite",
            Self::BloomThreshold => "bloom_threshold",
            Self::BloomBlur => "bloom_blur",
            Self::BloomComposite => "bloom_composite",
            Self::Texture => "texture",
        }
    }

    /// Stage entry points. Terrain and water are tessellated.
    #[must_use]
    pub fn stages(self) -> ShaderStages {
        match self {
            Self::Pbr => ShaderStages::simple("pbr_vs", "pbr_ps"),
            Self::Terrain => {
                ShaderStages::tessellated("height_map_vs", "height_map_hs", "height_map_ds", "height_map_ps")
            }
            Self::Water => ShaderStages::tessellated("waves_vs", "waves_hs", "waves_ds", "waves_ps"),
            Self::DofBlur => ShaderStages::simple("fullscreen_vs", "dof_blur_ps"),
            Self::DofComposite => ShaderStages::simple("fullscreen_vs", "dof_composite_ps"),
            Self::BloomThreshold => ShaderStages::simple("fullscreen_vs", "bloom_threshold_ps"),
            Self::BloomBlur => ShaderStages::simple("fullscreen_vs", "bloom_blur_ps"),
            Self::BloomComposite => ShaderStages::simple("fullscreen_vs", "bloom_composite_ps"),
            Self::Texture => ShaderStages::simple("fullscreen_vs", "texture_ps"),
        }
    }

    /// Topology the technique's meshes are drawn with.
    #[must_use]
    pub fn topology(self) -> Topology {
        match self {
            Self::Terrain | Self::Water => Topology::PatchList(4),
            _ => Topology::TriangleList,
        }
    }
}

/// A compiled program, released when dropped.
#[derive(Debug)]
pub struct ProgramHandle {
    id: ProgramId,
    technique: Technique,
    _owner: OwnedResource,
}

impl ProgramHandle {
    pub fn compile(allocator: &mut Allocator<'_>, technique: Technique) -> Result<Self> {
        let id = allocator.device().compile_program(&ProgramDesc {
            label: technique.label(),
            technique,
            stages: technique.stages(),
        })?;
        debug!("Compiled program `{}`", technique.label());
        Ok(Self {
            id,
            technique,
            _owner: allocator.own(ResourceId::Program(id)),
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn technique(&self) -> Technique {
        self.technique
    }
}

/// Bind-parameters + draw capability of one technique.
pub trait ShaderProgram {
    type Params<'p>;

    fn handle(&self) -> &ProgramHandle;

    /// Binds the program and uploads everything `params` describes.
    fn bind(&self, stream: &mut CommandStream<'_>, params: &Self::Params<'_>) -> Result<()>;

    fn technique(&self) -> Technique {
        self.handle().technique()
    }

    /// Binds then draws `mesh` with the technique's topology.
    fn draw_mesh(
        &self,
        stream: &mut CommandStream<'_>,
        params: &Self::Params<'_>,
        mesh: &dyn Mesh,
    ) -> Result<()> {
        self.bind(stream, params)?;
        mesh.draw(stream, self.technique().topology())
    }
}

/// One compiled program per technique.
pub struct ProgramSet {
    pub pbr: PbrProgram,
    pub terrain: TerrainProgram,
    pub water: WaterProgram,
    pub dof_blur: DofBlurProgram,
    pub dof_composite: DofCompositeProgram,
    pub bloom_threshold: BloomThresholdProgram,
    pub bloom_blur: BloomBlurProgram,
    pub bloom_composite: BloomCompositeProgram,
    pub texture: TextureProgram,
}

impl ProgramSet {
    pub fn compile(allocator: &mut Allocator<'_>) -> Result<Self> {
        Ok(Self {
            pbr: PbrProgram::new(ProgramHandle::compile(allocator, Technique::Pbr)?),
            terrain: TerrainProgram::new(ProgramHandle::compile(allocator, Technique::Terrain)?),
            water: WaterProgram::new(ProgramHandle::compile(allocator, Technique::Water)?),
            dof_blur: DofBlurProgram::new(ProgramHandle::compile(allocator, Technique::DofBlur)?),
            dof_composite: DofCompositeProgram::new(ProgramHandle::compile(
                allocator,
                Technique::DofComposite,
            )?),
            bloom_threshold: BloomThresholdProgram::new(ProgramHandle::compile(
                allocator,
                Technique::BloomThreshold,
            )?),
            bloom_blur: BloomBlurProgram::new(ProgramHandle::compile(
                allocator,
                Technique::BloomBlur,
            )?),
            bloom_composite: BloomCompositeProgram::new(ProgramHandle::compile(
                allocator,
                Technique::BloomComposite,
            )?),
            texture: TextureProgram::new(ProgramHandle::compile(allocator, Technique::Texture)?),
        })
    }
}
