//! Command Stream
//!
//! [`CommandStream`] is the single logical command stream a frame is
//! recorded on. It forwards every call to the [`GpuDevice`] in program order
//! and shadows just enough binding state to enforce the output/input
//! discipline:
//!
//! - Binding a view of the resource currently bound as output fails with
//!   [`StrataError::ReadWriteHazard`].
//! - Switching the output, or clearing a resource, first unbinds any texture
//!   slot that still reads that resource.
//! - Draws require both a bound output and a bound program.
//!
//! Raster state changes are forwarded only when they actually change. The
//! first change on a new stream always reaches the device.

use log::trace;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::device::{
    GpuDevice, MeshId, OutputBinding, ProgramId, RasterState, ResourceId, ShadowMapId, TargetId,
    TextureView, Topology,
};
use crate::errors::{Result, StrataError};

/// Counters collected while a stream is alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub draws: u32,
    pub clears: u32,
    pub output_changes: u32,
    pub texture_binds: u32,
    pub uniform_uploads: u32,
}

/// Ordered command recorder over a borrowed device.
pub struct CommandStream<'a> {
    device: &'a mut dyn GpuDevice,
    output: Option<OutputBinding>,
    inputs: FxHashMap<u32, TextureView>,
    program: Option<ProgramId>,
    /// Unknown until the first change, since a previous stream may have
    /// stopped mid-frame.
    raster: Option<RasterState>,
    groups: SmallVec<[String; 4]>,
    stats: StreamStats,
}

impl<'a> CommandStream<'a> {
    pub fn new(device: &'a mut dyn GpuDevice) -> Self {
        Self {
            device,
            output: None,
            inputs: FxHashMap::default(),
            program: None,
            raster: None,
            groups: SmallVec::new(),
            stats: StreamStats::default(),
        }
    }

    // === State queries ===

    #[inline]
    #[must_use]
    pub fn output(&self) -> Option<OutputBinding> {
        self.output
    }

    #[inline]
    #[must_use]
    pub fn input(&self, slot: u32) -> Option<TextureView> {
        self.inputs.get(&slot).copied()
    }

    #[inline]
    #[must_use]
    pub fn raster_state(&self) -> RasterState {
        self.raster.unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Label of the innermost debug group, used in error messages.
    #[must_use]
    pub fn current_group(&self) -> &str {
        self.groups.last().map_or("<frame>", String::as_str)
    }

    // === Clears ===

    pub fn clear_target(&mut self, target: TargetId, color: wgpu::Color) -> Result<()> {
        self.unbind_reads_of(ResourceId::Target(target))?;
        trace!("clear {target:?} to {color:?}");
        self.stats.clears += 1;
        self.device.clear_target(target, color)
    }

    pub fn clear_shadow_map(&mut self, map: ShadowMapId, depth: f32) -> Result<()> {
        self.unbind_reads_of(ResourceId::ShadowMap(map))?;
        trace!("clear {map:?} to depth {depth}");
        self.stats.clears += 1;
        self.device.clear_shadow_map(map, depth)
    }

    pub fn clear_surface(&mut self, color: wgpu::Color) -> Result<()> {
        trace!("clear surface to {color:?}");
        self.stats.clears += 1;
        self.device.clear_surface(color)
    }

    // === Bindings ===

    /// Makes `output` the write target for subsequent draws.
    pub fn set_output(&mut self, output: OutputBinding) -> Result<()> {
        self.unbind_reads_of(output.resource())?;
        self.device.set_output(output)?;
        self.output = Some(output);
        self.stats.output_changes += 1;
        Ok(())
    }

    pub fn bind_program(&mut self, program: ProgramId) -> Result<()> {
        if self.program != Some(program) {
            self.device.bind_program(program)?;
            self.program = Some(program);
        }
        Ok(())
    }

    /// Uploads a `Pod` uniform block to `slot` of the bound program.
    pub fn set_uniform_block<T: bytemuck::Pod>(&mut self, slot: u32, block: &T) -> Result<()> {
        if self.program.is_none() {
            return Err(StrataError::NoProgramBound(self.current_group().to_owned()));
        }
        self.stats.uniform_uploads += 1;
        self.device
            .set_uniform_block(slot, bytemuck::bytes_of(block))
    }

    /// Binds `view` for reading at `slot`.
    pub fn bind_texture(&mut self, slot: u32, view: TextureView) -> Result<()> {
        let resource = view.resource();
        if self.output.map(OutputBinding::resource) == Some(resource) {
            return Err(StrataError::ReadWriteHazard { resource, slot });
        }
        self.device.bind_texture(slot, Some(view))?;
        self.inputs.insert(slot, view);
        self.stats.texture_binds += 1;
        Ok(())
    }

    pub fn unbind_texture(&mut self, slot: u32) -> Result<()> {
        if self.inputs.remove(&slot).is_some() {
            self.device.bind_texture(slot, None)?;
        }
        Ok(())
    }

    pub fn unbind_all_textures(&mut self) -> Result<()> {
        let mut slots: SmallVec<[u32; 16]> = self.inputs.keys().copied().collect();
        slots.sort_unstable();
        for slot in slots {
            self.unbind_texture(slot)?;
        }
        Ok(())
    }

    pub fn bind_mesh(&mut self, mesh: MeshId) -> Result<()> {
        self.device.bind_mesh(mesh)
    }

    fn unbind_reads_of(&mut self, resource: ResourceId) -> Result<()> {
        let mut slots: SmallVec<[u32; 16]> = self
            .inputs
            .iter()
            .filter(|(_, view)| view.resource() == resource)
            .map(|(slot, _)| *slot)
            .collect();
        slots.sort_unstable();
        for slot in slots {
            trace!("unbind slot {slot} before writing {resource:?}");
            self.unbind_texture(slot)?;
        }
        Ok(())
    }

    // === Raster state ===

    pub fn set_wireframe(&mut self, wireframe: bool) -> Result<()> {
        self.set_raster_state(RasterState {
            wireframe,
            ..self.raster_state()
        })
    }

    pub fn set_alpha_blend(&mut self, alpha_blend: bool) -> Result<()> {
        self.set_raster_state(RasterState {
            alpha_blend,
            ..self.raster_state()
        })
    }

    fn set_raster_state(&mut self, state: RasterState) -> Result<()> {
        if self.raster != Some(state) {
            self.device.set_raster_state(state)?;
            self.raster = Some(state);
        }
        Ok(())
    }

    // === Draws ===

    pub fn draw(&mut self, index_count: u32, topology: Topology) -> Result<()> {
        if self.output.is_none() {
            return Err(StrataError::NoOutputBound(self.current_group().to_owned()));
        }
        if self.program.is_none() {
            return Err(StrataError::NoProgramBound(self.current_group().to_owned()));
        }
        self.stats.draws += 1;
        self.device.draw(index_count, topology)
    }

    pub fn present(&mut self) -> Result<()> {
        self.device.present()
    }

    // === Debug groups ===

    pub fn push_debug_group(&mut self, label: &str) {
        self.device.push_debug_group(label);
        self.groups.push(label.to_owned());
    }

    pub fn pop_debug_group(&mut self) {
        if self.groups.pop().is_some() {
            self.device.pop_debug_group();
        }
    }
}
