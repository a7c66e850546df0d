use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::errors::{Result, StrataError};
use crate::renderer::core::{
    GpuDevice, MeshDesc, MeshId, OutputBinding, ProgramDesc, ProgramId, RasterState,
    RenderTargetDesc, ResourceId, ShadowMapDesc, ShadowMapId, TargetId, TextureView, Topology,
};
use crate::renderer::program::Technique;

// ============================================================================
// Null device
// ============================================================================

/// Hands out ids and checks that every id it is given is alive.
#[derive(Debug, Default)]
pub struct NullDevice {
    next_id: u32,
    live: FxHashSet<ResourceId>,
}

impl NullDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources created and not yet released.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_live(&self, resource: ResourceId) -> bool {
        self.live.contains(&resource)
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, resource: ResourceId) -> Result<()> {
        match resource {
            // Asset textures and the back buffer are not created through the device.
            ResourceId::Texture(_) | ResourceId::Surface => Ok(()),
            _ if self.live.contains(&resource) => Ok(()),
            _ => Err(StrataError::UnknownResource(resource)),
        }
    }
}

impl GpuDevice for NullDevice {
    fn create_render_target(&mut self, _desc: &RenderTargetDesc) -> Result<TargetId> {
        let id = TargetId(self.allocate());
        self.live.insert(ResourceId::Target(id));
        Ok(id)
    }

    fn create_shadow_map(&mut self, _desc: &ShadowMapDesc) -> Result<ShadowMapId> {
        let id = ShadowMapId(self.allocate());
        self.live.insert(ResourceId::ShadowMap(id));
        Ok(id)
    }

    fn compile_program(&mut self, _desc: &ProgramDesc) -> Result<ProgramId> {
        let id = ProgramId(self.allocate());
        self.live.insert(ResourceId::Program(id));
        Ok(id)
    }

    fn upload_mesh(&mut self, _desc: &MeshDesc<'_>) -> Result<MeshId> {
        let id = MeshId(self.allocate());
        self.live.insert(ResourceId::Mesh(id));
        Ok(id)
    }

    fn release(&mut self, resource: ResourceId) {
        self.live.remove(&resource);
    }

    fn clear_target(&mut self, target: TargetId, _color: wgpu::Color) -> Result<()> {
        self.check(ResourceId::Target(target))
    }

    fn clear_shadow_map(&mut self, map: ShadowMapId, _depth: f32) -> Result<()> {
        self.check(ResourceId::ShadowMap(map))
    }

    fn clear_surface(&mut self, _color: wgpu::Color) -> Result<()> {
        Ok(())
    }

    fn set_output(&mut self, output: OutputBinding) -> Result<()> {
        self.check(output.resource())
    }

    fn bind_program(&mut self, program: ProgramId) -> Result<()> {
        self.check(ResourceId::Program(program))
    }

    fn set_uniform_block(&mut self, _slot: u32, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn bind_texture(&mut self, _slot: u32, view: Option<TextureView>) -> Result<()> {
        view.map_or(Ok(()), |view| self.check(view.resource()))
    }

    fn bind_mesh(&mut self, mesh: MeshId) -> Result<()> {
        self.check(ResourceId::Mesh(mesh))
    }

    fn set_raster_state(&mut self, _state: RasterState) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, _index_count: u32, _topology: Topology) -> Result<()> {
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Recording device
// ============================================================================

/// State a draw was issued with.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub index_count: u32,
    pub topology: Topology,
    pub output: Option<OutputBinding>,
    pub technique: Option<Technique>,
    pub raster: RasterState,
    /// Bound texture slots, ascending.
    pub inputs: SmallVec<[(u32, TextureView); 16]>,
    /// Innermost debug group.
    pub group: Option<String>,
}

impl DrawRecord {
    #[must_use]
    pub fn input(&self, slot: u32) -> Option<TextureView> {
        self.inputs
            .iter()
            .find(|(bound, _)| *bound == slot)
            .map(|(_, view)| *view)
    }
}

/// One call on the device contract.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCommand {
    CreateTarget { id: TargetId, label: String },
    CreateShadowMap { id: ShadowMapId, label: String, layers: u32 },
    CompileProgram { id: ProgramId, technique: Technique },
    UploadMesh { id: MeshId, label: String },
    Release(ResourceId),
    ClearTarget { target: TargetId, color: wgpu::Color },
    ClearShadowMap { map: ShadowMapId, depth: f32 },
    ClearSurface(wgpu::Color),
    SetOutput(OutputBinding),
    BindProgram(ProgramId),
    SetUniformBlock { slot: u32, data: Vec<u8> },
    BindTexture { slot: u32, view: Option<TextureView> },
    BindMesh(MeshId),
    SetRasterState(RasterState),
    Draw(DrawRecord),
    PushDebugGroup(String),
    PopDebugGroup,
    Present,
}

/// Logs every command before forwarding it to `D`.
///
/// Binding state is tracked alongside so each [`DeviceCommand::Draw`]
/// carries the output, program and inputs it saw.
pub struct RecordingDevice<D: GpuDevice = NullDevice> {
    inner: D,
    commands: Vec<DeviceCommand>,
    techniques: FxHashMap<ProgramId, Technique>,
    output: Option<OutputBinding>,
    program: Option<ProgramId>,
    inputs: FxHashMap<u32, TextureView>,
    raster: RasterState,
    groups: Vec<String>,
}

impl Default for RecordingDevice<NullDevice> {
    fn default() -> Self {
        Self::new(NullDevice::new())
    }
}

impl<D: GpuDevice> RecordingDevice<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            commands: Vec::new(),
            techniques: FxHashMap::default(),
            output: None,
            program: None,
            inputs: FxHashMap::default(),
            raster: RasterState::default(),
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Returns and forgets everything recorded so far.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Every draw recorded so far, in order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|command| match command {
            DeviceCommand::Draw(record) => Some(record),
            _ => None,
        })
    }

    #[must_use]
    pub fn technique_of(&self, program: ProgramId) -> Option<Technique> {
        self.techniques.get(&program).copied()
    }

    #[must_use]
    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    fn record(&mut self, command: DeviceCommand) {
        trace!("{command:?}");
        self.commands.push(command);
    }
}

impl<D: GpuDevice> GpuDevice for RecordingDevice<D> {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetId> {
        let id = self.inner.create_render_target(desc)?;
        self.record(DeviceCommand::CreateTarget {
            id,
            label: desc.label.clone(),
        });
        Ok(id)
    }

    fn create_shadow_map(&mut self, desc: &ShadowMapDesc) -> Result<ShadowMapId> {
        let id = self.inner.create_shadow_map(desc)?;
        self.record(DeviceCommand::CreateShadowMap {
            id,
            label: desc.label.clone(),
            layers: desc.layers,
        });
        Ok(id)
    }

    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId> {
        let id = self.inner.compile_program(desc)?;
        self.techniques.insert(id, desc.technique);
        self.record(DeviceCommand::CompileProgram {
            id,
            technique: desc.technique,
        });
        Ok(id)
    }

    fn upload_mesh(&mut self, desc: &MeshDesc<'_>) -> Result<MeshId> {
        let id = self.inner.upload_mesh(desc)?;
        self.record(DeviceCommand::UploadMesh {
            id,
            label: desc.label.to_owned(),
        });
        Ok(id)
    }

    fn release(&mut self, resource: ResourceId) {
        self.inner.release(resource);
        self.record(DeviceCommand::Release(resource));
    }

    fn clear_target(&mut self, target: TargetId, color: wgpu::Color) -> Result<()> {
        self.record(DeviceCommand::ClearTarget { target, color });
        self.inner.clear_target(target, color)
    }

    fn clear_shadow_map(&mut self, map: ShadowMapId, depth: f32) -> Result<()> {
        self.record(DeviceCommand::ClearShadowMap { map, depth });
        self.inner.clear_shadow_map(map, depth)
    }

    fn clear_surface(&mut self, color: wgpu::Color) -> Result<()> {
        self.record(DeviceCommand::ClearSurface(color));
        self.inner.clear_surface(color)
    }

    fn set_output(&mut self, output: OutputBinding) -> Result<()> {
        self.record(DeviceCommand::SetOutput(output));
        self.output = Some(output);
        self.inner.set_output(output)
    }

    fn bind_program(&mut self, program: ProgramId) -> Result<()> {
        self.record(DeviceCommand::BindProgram(program));
        self.program = Some(program);
        self.inner.bind_program(program)
    }

    fn set_uniform_block(&mut self, slot: u32, data: &[u8]) -> Result<()> {
        self.record(DeviceCommand::SetUniformBlock {
            slot,
            data: data.to_vec(),
        });
        self.inner.set_uniform_block(slot, data)
    }

    fn bind_texture(&mut self, slot: u32, view: Option<TextureView>) -> Result<()> {
        self.record(DeviceCommand::BindTexture { slot, view });
        match view {
            Some(view) => self.inputs.insert(slot, view),
            None => self.inputs.remove(&slot),
        };
        self.inner.bind_texture(slot, view)
    }

    fn bind_mesh(&mut self, mesh: MeshId) -> Result<()> {
        self.record(DeviceCommand::BindMesh(mesh));
        self.inner.bind_mesh(mesh)
    }

    fn set_raster_state(&mut self, state: RasterState) -> Result<()> {
        self.record(DeviceCommand::SetRasterState(state));
        self.raster = state;
        self.inner.set_raster_state(state)
    }

    fn draw(&mut self, index_count: u32, topology: Topology) -> Result<()> {
        let mut inputs: SmallVec<[(u32, TextureView); 16]> =
            self.inputs.iter().map(|(slot, view)| (*slot, *view)).collect();
        inputs.sort_unstable_by_key(|(slot, _)| *slot);
        let record = DrawRecord {
            index_count,
            topology,
            output: self.output,
            technique: self.program.and_then(|program| self.technique_of(program)),
            raster: self.raster,
            inputs,
            group: self.groups.last().cloned(),
        };
        self.record(DeviceCommand::Draw(record));
        self.inner.draw(index_count, topology)
    }

    fn push_debug_group(&mut self, label: &str) {
        self.groups.push(label.to_owned());
        self.record(DeviceCommand::PushDebugGroup(label.to_owned()));
        self.inner.push_debug_group(label);
    }

    fn pop_debug_group(&mut self) {
        self.groups.pop();
        self.record(DeviceCommand::PopDebugGroup);
        self.inner.pop_debug_group();
    }

    fn present(&mut self) -> Result<()> {
        self.record(DeviceCommand::Present);
        self.inner.present()
    }
}
