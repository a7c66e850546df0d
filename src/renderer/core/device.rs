//! GPU Device Contract
//!
//! The pipeline never talks to a graphics API directly. Everything it needs
//! from the GPU goes through [`GpuDevice`]: resource creation, clears,
//! output/input binding, uniform uploads and draws, all issued in
//! submission order on one logical command stream.
//!
//! Resource identities are small `Copy` ids handed out by the device. Owning
//! wrappers with release-on-drop semantics live in
//! [`allocator`](super::allocator).

use crate::errors::Result;
use crate::renderer::program::Technique;
use crate::resources::texture::TextureHandle;

// ─── Resource Ids ─────────────────────────────────────────────────────────────

/// Id of an offscreen colour + depth render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TargetId(pub u32);

/// Id of a depth-only shadow map (1 layer, or 6 layers for a cube).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ShadowMapId(pub u32);

/// Id of a compiled shader program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProgramId(pub u32);

/// Id of uploaded mesh buffers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MeshId(pub u32);

/// Any GPU-side resource, used for hazard tracking and release.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ResourceId {
    Target(TargetId),
    ShadowMap(ShadowMapId),
    Program(ProgramId),
    Mesh(MeshId),
    Texture(TextureHandle),
    /// The presentable back buffer.
    Surface,
}

// ─── Views & Bindings ─────────────────────────────────────────────────────────

/// A readable view of a resource, bound to a texture slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureView {
    /// Colour surface of a render target.
    Color(TargetId),
    /// Depth surface of a render target.
    Depth(TargetId),
    /// Every layer of a shadow map (2D or cube).
    Shadow(ShadowMapId),
    /// An asset texture from the texture library.
    Asset(TextureHandle),
}

impl TextureView {
    /// The resource this view reads from.
    #[must_use]
    pub fn resource(self) -> ResourceId {
        match self {
            Self::Color(id) | Self::Depth(id) => ResourceId::Target(id),
            Self::Shadow(id) => ResourceId::ShadowMap(id),
            Self::Asset(handle) => ResourceId::Texture(handle),
        }
    }
}

/// The surface draws are written to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OutputBinding {
    /// Colour + depth of an offscreen target.
    Target(TargetId),
    /// One depth layer of a shadow map, no colour attachment.
    ShadowFace { map: ShadowMapId, face: u8 },
    /// The back buffer.
    Surface,
}

impl OutputBinding {
    /// The resource this binding writes to.
    #[must_use]
    pub fn resource(self) -> ResourceId {
        match self {
            Self::Target(id) => ResourceId::Target(id),
            Self::ShadowFace { map, .. } => ResourceId::ShadowMap(map),
            Self::Surface => ResourceId::Surface,
        }
    }
}

/// Primitive topology of a draw.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    LineList,
    /// Tessellation patches with the given number of control points.
    PatchList(u8),
}

/// Fixed-function state toggled between passes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct RasterState {
    pub wireframe: bool,
    pub alpha_blend: bool,
}

// ─── Descriptors ──────────────────────────────────────────────────────────────

/// Descriptor for an offscreen colour + depth target.
#[derive(Clone, Debug)]
pub struct RenderTargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

/// Descriptor for a depth-only shadow map.
#[derive(Clone, Debug)]
pub struct ShadowMapDesc {
    pub label: String,
    /// Edge length of each (square) layer.
    pub size: u32,
    /// 1 for a directional map, 6 for a cube map.
    pub layers: u32,
    pub format: wgpu::TextureFormat,
}

/// Entry points of each programmable stage.
///
/// Stages are named, not embedded: how a name maps to byte code or source
/// is up to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderStages {
    pub vertex: &'static str,
    pub hull: Option<&'static str>,
    pub domain: Option<&'static str>,
    pub geometry: Option<&'static str>,
    pub pixel: &'static str,
}

impl ShaderStages {
    /// Vertex + pixel only.
    #[must_use]
    pub const fn simple(vertex: &'static str, pixel: &'static str) -> Self {
        Self {
            vertex,
            hull: None,
            domain: None,
            geometry: None,
            pixel,
        }
    }

    /// Vertex + hull + domain + pixel.
    #[must_use]
    pub const fn tessellated(
        vertex: &'static str,
        hull: &'static str,
        domain: &'static str,
        pixel: &'static str,
    ) -> Self {
        Self {
            vertex,
            hull: Some(hull),
            domain: Some(domain),
            geometry: None,
            pixel,
        }
    }
}

/// Descriptor for [`GpuDevice::compile_program`].
#[derive(Clone, Copy, Debug)]
pub struct ProgramDesc {
    pub label: &'static str,
    pub technique: Technique,
    pub stages: ShaderStages,
}

/// Interleaved vertex layout shared by every mesh.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// Borrowed geometry handed to [`GpuDevice::upload_mesh`].
#[derive(Clone, Copy, Debug)]
pub struct MeshDesc<'a> {
    pub label: &'a str,
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
}

// ─── Device Trait ─────────────────────────────────────────────────────────────

/// The external GPU capability the pipeline is written against.
///
/// Implementations execute commands in call order. The pipeline guarantees
/// it never asks a device to read a resource that is bound as the current
/// output; [`CommandStream`](super::CommandStream) enforces that before a
/// call reaches the device.
pub trait GpuDevice {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetId>;
    fn create_shadow_map(&mut self, desc: &ShadowMapDesc) -> Result<ShadowMapId>;
    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId>;
    fn upload_mesh(&mut self, desc: &MeshDesc<'_>) -> Result<MeshId>;

    /// Frees a resource. Unknown ids are ignored.
    fn release(&mut self, resource: ResourceId);

    fn clear_target(&mut self, target: TargetId, color: wgpu::Color) -> Result<()>;
    /// Clears every layer of a shadow map to `depth`.
    fn clear_shadow_map(&mut self, map: ShadowMapId, depth: f32) -> Result<()>;
    fn clear_surface(&mut self, color: wgpu::Color) -> Result<()>;

    fn set_output(&mut self, output: OutputBinding) -> Result<()>;
    fn bind_program(&mut self, program: ProgramId) -> Result<()>;
    fn set_uniform_block(&mut self, slot: u32, data: &[u8]) -> Result<()>;
    /// Binds `view` at `slot`, or clears the slot when `view` is `None`.
    fn bind_texture(&mut self, slot: u32, view: Option<TextureView>) -> Result<()>;
    fn bind_mesh(&mut self, mesh: MeshId) -> Result<()>;
    fn set_raster_state(&mut self, state: RasterState) -> Result<()>;
    fn draw(&mut self, index_count: u32, topology: Topology) -> Result<()>;

    fn push_debug_group(&mut self, _label: &str) {}
    fn pop_debug_group(&mut self) {}

    /// Presents the surface.
    fn present(&mut self) -> Result<()>;
}
