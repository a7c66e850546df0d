//! GPU abstraction layer
//!
//! - [`GpuDevice`]: the external device contract
//! - [`CommandStream`]: ordered, hazard-checked command recording
//! - [`Allocator`]: owned render targets and shadow maps with release-on-drop

pub mod allocator;
pub mod device;
pub mod stream;

pub use allocator::{
    Allocator, OwnedResource, ReleaseHandle, ReleaseQueue, RenderTarget, ShadowMap, ShadowMapKind,
};
pub use device::{
    GpuDevice, MeshDesc, MeshId, OutputBinding, ProgramDesc, ProgramId, RasterState,
    RenderTargetDesc, ResourceId, ShaderStages, ShadowMapDesc, ShadowMapId, TargetId, TextureView,
    Topology, Vertex,
};
pub use stream::{CommandStream, StreamStats};
