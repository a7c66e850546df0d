//! Owned GPU Resources
//!
//! Every resource the pipeline creates is wrapped in an owner that hands its
//! id back when dropped. Drop cannot reach the device, so the id is pushed
//! into a [`ReleaseQueue`] channel instead; the renderer drains that queue
//! into [`GpuDevice::release`] at the start of every frame and on shutdown.
//!
//! ```text
//! Allocator::render_target() ──► RenderTarget ──drop──► ReleaseHandle ─┐
//!                                                                       │
//! Renderer::render() ◄────────── ReleaseQueue::drain(device) ◄──────────┘
//! ```
//!
//! This holds on every exit path: a pass that fails halfway through drops
//! its temporaries normally and their ids still reach the device.

use log::{debug, info};

use super::device::{
    GpuDevice, OutputBinding, RenderTargetDesc, ResourceId, ShadowMapDesc, ShadowMapId, TargetId,
    TextureView,
};
use crate::errors::Result;

// ─── Release Channel ──────────────────────────────────────────────────────────

/// Receiving end of the release channel. Owned by the renderer.
pub struct ReleaseQueue {
    sender: flume::Sender<ResourceId>,
    receiver: flume::Receiver<ResourceId>,
}

impl Default for ReleaseQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseQueue {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// A cloneable sender for resource owners.
    #[must_use]
    pub fn handle(&self) -> ReleaseHandle {
        ReleaseHandle(self.sender.clone())
    }

    /// Number of releases waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Forwards every queued release to the device. Returns how many ran.
    pub fn drain(&self, device: &mut dyn GpuDevice) -> usize {
        let mut released = 0;
        for resource in self.receiver.try_iter() {
            device.release(resource);
            released += 1;
        }
        if released > 0 {
            debug!("Released {released} GPU resources");
        }
        released
    }
}

/// Sending end of the release channel.
#[derive(Clone, Debug)]
pub struct ReleaseHandle(flume::Sender<ResourceId>);

/// Sends its resource id to the release channel when dropped.
#[derive(Debug)]
pub struct OwnedResource {
    id: ResourceId,
    release: ReleaseHandle,
}

impl OwnedResource {
    #[must_use]
    pub fn new(id: ResourceId, release: ReleaseHandle) -> Self {
        Self { id, release }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl Drop for OwnedResource {
    fn drop(&mut self) {
        // The queue may already be gone during teardown; nothing left to free into.
        let _ = self.release.0.send(self.id);
    }
}

// ─── Render Target ────────────────────────────────────────────────────────────

/// An offscreen colour + depth surface.
#[derive(Debug)]
pub struct RenderTarget {
    id: TargetId,
    desc: RenderTargetDesc,
    _owner: OwnedResource,
}

impl RenderTarget {
    #[inline]
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn color_view(&self) -> TextureView {
        TextureView::Color(self.id)
    }

    #[inline]
    #[must_use]
    pub fn depth_view(&self) -> TextureView {
        TextureView::Depth(self.id)
    }

    #[inline]
    #[must_use]
    pub fn output(&self) -> OutputBinding {
        OutputBinding::Target(self.id)
    }

    #[must_use]
    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }
}

// ─── Shadow Map ───────────────────────────────────────────────────────────────

/// Layout of a shadow map.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShadowMapKind {
    /// One depth layer (directional lights).
    Single,
    /// Six depth layers, one per cube face (point and spot lights).
    Cube,
}

impl ShadowMapKind {
    #[inline]
    #[must_use]
    pub fn face_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Cube => 6,
        }
    }
}

/// A depth-only shadow map owned by one light.
#[derive(Debug)]
pub struct ShadowMap {
    id: ShadowMapId,
    kind: ShadowMapKind,
    size: u32,
    _owner: OwnedResource,
}

impl ShadowMap {
    #[inline]
    #[must_use]
    pub fn id(&self) -> ShadowMapId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ShadowMapKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Depth-only output for one face. `face` must be below
    /// [`ShadowMapKind::face_count`].
    #[inline]
    #[must_use]
    pub fn face_output(&self, face: usize) -> OutputBinding {
        debug_assert!(face < self.kind.face_count());
        OutputBinding::ShadowFace {
            map: self.id,
            face: face as u8,
        }
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> TextureView {
        TextureView::Shadow(self.id)
    }
}

// ─── Allocator ────────────────────────────────────────────────────────────────

/// Creates owned resources on a device.
///
/// Short-lived: borrow one from [`Renderer::allocator`](crate::renderer::Renderer::allocator)
/// (or build one over a [`ReleaseQueue`]) whenever resources are needed.
pub struct Allocator<'a> {
    device: &'a mut dyn GpuDevice,
    release: ReleaseHandle,
}

impl<'a> Allocator<'a> {
    pub fn new(device: &'a mut dyn GpuDevice, release: ReleaseHandle) -> Self {
        Self { device, release }
    }

    /// Direct access for capabilities that create their own resources
    /// (meshes, programs).
    pub fn device(&mut self) -> &mut dyn GpuDevice {
        &mut *self.device
    }

    #[must_use]
    pub fn release_handle(&self) -> ReleaseHandle {
        self.release.clone()
    }

    /// Wraps an already created resource id in an owner.
    #[must_use]
    pub fn own(&self, id: ResourceId) -> OwnedResource {
        OwnedResource::new(id, self.release.clone())
    }

    pub fn render_target(&mut self, desc: RenderTargetDesc) -> Result<RenderTarget> {
        let id = self.device.create_render_target(&desc)?;
        debug!(
            "Created render target `{}` ({}x{})",
            desc.label, desc.width, desc.height
        );
        Ok(RenderTarget {
            id,
            _owner: self.own(ResourceId::Target(id)),
            desc,
        })
    }

    pub fn shadow_map(
        &mut self,
        label: impl Into<String>,
        kind: ShadowMapKind,
        size: u32,
        format: wgpu::TextureFormat,
    ) -> Result<ShadowMap> {
        let desc = ShadowMapDesc {
            label: label.into(),
            size,
            layers: kind.face_count() as u32,
            format,
        };
        let id = self.device.create_shadow_map(&desc)?;
        info!(
            "Allocated {:?} shadow map `{}` ({size}x{size} x{})",
            kind, desc.label, desc.layers
        );
        Ok(ShadowMap {
            id,
            kind,
            size,
            _owner: self.own(ResourceId::ShadowMap(id)),
        })
    }
}
