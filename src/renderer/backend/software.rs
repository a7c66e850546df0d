//! CPU reference device.
//!
//! Executes the same command stream a GPU would, at low fidelity but with
//! exact pass semantics, so frames can be checked pixel by pixel without a
//! graphics adapter.
//!
//! | Technique          | Reference behaviour                                      |
//! |--------------------|----------------------------------------------------------|
//! | PBR / terrain / water | flat-lit screen-space bounds of the mesh at its mean depth, depth tested, depth-range discard |
//! | bloom threshold    | keep texels with luminance above the threshold           |
//! | bloom / DOF blur   | 1D blur with the uploaded weights and stride             |
//! | bloom composite    | additive RGB                                             |
//! | DOF composite      | "over", slot 0 (far) to slot `n - 1` (near)              |
//! | texture            | copy                                                     |
//!
//! Asset textures sample as opaque white. Shadow maps keep one depth per
//! face: the nearest caster drawn into it.

use glam::{Vec2, Vec3, Vec4};
use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::errors::{Result, StrataError};
use crate::renderer::core::{
    GpuDevice, MeshDesc, MeshId, OutputBinding, ProgramDesc, ProgramId, RasterState,
    RenderTargetDesc, ResourceId, ShadowMapDesc, ShadowMapId, TargetId, TextureView, Topology,
};
use crate::renderer::program::Technique;
use crate::renderer::program::uniforms::{
    BloomBlock, DEPTH_RANGE_SLOT, DepthRangeBlock, DofBlurBlock, DofCompositeBlock, LIGHT_SLOT,
    LightBlock, MATRIX_SLOT, MaterialBlock, MatrixBlock, POST_SLOT, TECHNIQUE_SLOT,
};
use crate::resources::dof::DepthBand;

/// Rec. 709 luma weights.
const LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Base colour of water before lighting.
const WATER_COLOR: Vec4 = Vec4::new(0.1, 0.35, 0.55, 0.7);

struct Canvas {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![1.0; len],
        }
    }

    fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(1.0);
    }

    /// Clamp-to-edge fetch.
    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        self.color[y * self.width as usize + x]
    }

    /// Fetch at the texel matching `(x, y)` of a `width × height` output.
    fn sample(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        let sx = u64::from(x) * u64::from(self.width) / u64::from(width.max(1));
        let sy = u64::from(y) * u64::from(self.height) / u64::from(height.max(1));
        self.texel(sx as i64, sy as i64)
    }
}

fn to_vec4(color: wgpu::Color) -> Vec4 {
    Vec4::new(color.r as f32, color.g as f32, color.b as f32, color.a as f32)
}

/// Straight-alpha "over".
fn over(src: Vec4, dst: Vec4) -> Vec4 {
    let alpha = src.w + dst.w * (1.0 - src.w);
    if alpha <= 0.0 {
        return Vec4::ZERO;
    }
    let rgb = (src.truncate() * src.w + dst.truncate() * dst.w * (1.0 - src.w)) / alpha;
    rgb.extend(alpha)
}

/// Where a post program reads its colour from.
enum Source<'a> {
    Canvas(&'a Canvas),
    White,
}

impl Source<'_> {
    fn sample(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        match self {
            Self::Canvas(canvas) => canvas.sample(x, y, width, height),
            Self::White => Vec4::ONE,
        }
    }
}

pub struct SoftwareDevice {
    next_id: u32,
    surface: Canvas,
    targets: FxHashMap<TargetId, Canvas>,
    shadow_maps: FxHashMap<ShadowMapId, Vec<f32>>,
    programs: FxHashMap<ProgramId, Technique>,
    meshes: FxHashMap<MeshId, Vec<Vec3>>,

    output: Option<OutputBinding>,
    program: Option<ProgramId>,
    mesh: Option<MeshId>,
    raster: RasterState,
    uniforms: FxHashMap<u32, Vec<u8>>,
    inputs: FxHashMap<u32, TextureView>,

    presented: u64,
}

impl SoftwareDevice {
    /// A device whose back buffer is `width × height`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            next_id: 0,
            surface: Canvas::new(width, height),
            targets: FxHashMap::default(),
            shadow_maps: FxHashMap::default(),
            programs: FxHashMap::default(),
            meshes: FxHashMap::default(),
            output: None,
            program: None,
            mesh: None,
            raster: RasterState::default(),
            uniforms: FxHashMap::default(),
            inputs: FxHashMap::default(),
            presented: 0,
        }
    }

    // === Readback ===

    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface.width, self.surface.height)
    }

    #[must_use]
    pub fn surface_pixels(&self) -> &[Vec4] {
        &self.surface.color
    }

    /// Back buffer as tightly packed RGBA8, rows top to bottom.
    #[must_use]
    pub fn surface_rgba8(&self) -> Vec<u8> {
        self.surface
            .color
            .iter()
            .flat_map(|texel| {
                texel
                    .clamp(Vec4::ZERO, Vec4::ONE)
                    .to_array()
                    .map(|channel| (channel * 255.0).round() as u8)
            })
            .collect()
    }

    #[must_use]
    pub fn target_pixels(&self, target: TargetId) -> Option<&[Vec4]> {
        self.targets.get(&target).map(|canvas| canvas.color.as_slice())
    }

    #[must_use]
    pub fn target_depth(&self, target: TargetId) -> Option<&[f32]> {
        self.targets.get(&target).map(|canvas| canvas.depth.as_slice())
    }

    /// Nearest depth written into one face of a shadow map.
    #[must_use]
    pub fn shadow_depth(&self, map: ShadowMapId, face: usize) -> Option<f32> {
        self.shadow_maps.get(&map)?.get(face).copied()
    }

    #[must_use]
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    /// Resources created and not yet released.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.targets.len() + self.shadow_maps.len() + self.programs.len() + self.meshes.len()
    }

    // === Internals ===

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn uniform<T: bytemuck::Pod>(&self, slot: u32) -> Result<T> {
        let expected = std::mem::size_of::<T>();
        let bytes = self.uniforms.get(&slot).map_or(&[][..], Vec::as_slice);
        if bytes.len() != expected {
            return Err(StrataError::UniformSize {
                slot,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    fn source(&self, slot: u32) -> Result<Source<'_>> {
        match self.inputs.get(&slot) {
            Some(TextureView::Color(target)) => self
                .targets
                .get(target)
                .map(Source::Canvas)
                .ok_or(StrataError::UnknownResource(ResourceId::Target(*target))),
            Some(TextureView::Asset(_)) => Ok(Source::White),
            Some(view) => Err(StrataError::Device(format!(
                "{view:?} at slot {slot} cannot be sampled as colour"
            ))),
            None => Err(StrataError::Device(format!("nothing bound at slot {slot}"))),
        }
    }

    fn output_canvas(&mut self, output: OutputBinding) -> Result<&mut Canvas> {
        match output {
            OutputBinding::Target(target) => self
                .targets
                .get_mut(&target)
                .ok_or(StrataError::UnknownResource(ResourceId::Target(target))),
            OutputBinding::Surface => Ok(&mut self.surface),
            OutputBinding::ShadowFace { map, .. } => Err(StrataError::Device(format!(
                "{map:?} has no colour surface"
            ))),
        }
    }

    fn output_size(&self, output: OutputBinding) -> Result<(u32, u32)> {
        match output {
            OutputBinding::Target(target) => self
                .targets
                .get(&target)
                .map(|canvas| (canvas.width, canvas.height))
                .ok_or(StrataError::UnknownResource(ResourceId::Target(target))),
            OutputBinding::Surface => Ok(self.surface_size()),
            OutputBinding::ShadowFace { map, .. } => Err(StrataError::Device(format!(
                "{map:?} has no colour surface"
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Scene geometry
    // ------------------------------------------------------------------------

    fn draw_geometry(&mut self, technique: Technique, output: OutputBinding) -> Result<()> {
        let matrices: MatrixBlock = self.uniform(MATRIX_SLOT)?;
        let range: DepthRangeBlock = self.uniform(DEPTH_RANGE_SLOT)?;
        let mesh = self
            .mesh
            .ok_or_else(|| StrataError::Device("draw without a mesh".to_owned()))?;
        let positions = self
            .meshes
            .get(&mesh)
            .ok_or(StrataError::UnknownResource(ResourceId::Mesh(mesh)))?;

        let wvp = matrices.world_view_projection();
        let (mut min, mut max) = (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN));
        let (mut depth_sum, mut projected) = (0.0, 0u32);
        for position in positions {
            let clip = wvp * position.extend(1.0);
            if clip.w <= f32::EPSILON {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            min = min.min(ndc.truncate());
            max = max.max(ndc.truncate());
            depth_sum += ndc.z;
            projected += 1;
        }
        if projected == 0 {
            return Ok(());
        }
        let depth = depth_sum / projected as f32;
        let band = DepthBand {
            min: range.min,
            max: range.max,
        };
        if !(0.0..=1.0).contains(&depth) || !band.contains(depth) {
            trace!("software: discarded draw at depth {depth}");
            return Ok(());
        }

        if let OutputBinding::ShadowFace { map, face } = output {
            let faces = self
                .shadow_maps
                .get_mut(&map)
                .ok_or(StrataError::UnknownResource(ResourceId::ShadowMap(map)))?;
            if let Some(nearest) = faces.get_mut(usize::from(face)) {
                *nearest = nearest.min(depth);
            }
            return Ok(());
        }

        let color = self.shade(technique)?;
        let blend = self.raster.alpha_blend;
        let canvas = self.output_canvas(output)?;
        let (w, h) = (canvas.width as f32, canvas.height as f32);
        let x0 = ((min.x + 1.0) * 0.5 * w).floor().clamp(0.0, w) as u32;
        let x1 = ((max.x + 1.0) * 0.5 * w).ceil().clamp(0.0, w) as u32;
        let y0 = ((1.0 - max.y) * 0.5 * h).floor().clamp(0.0, h) as u32;
        let y1 = ((1.0 - min.y) * 0.5 * h).ceil().clamp(0.0, h) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let index = (y * canvas.width + x) as usize;
                if depth > canvas.depth[index] {
                    continue;
                }
                canvas.depth[index] = depth;
                canvas.color[index] = if blend {
                    over(color, canvas.color[index])
                } else {
                    color
                };
            }
        }
        Ok(())
    }

    /// Flat colour of a scene draw: base colour times the summed light
    /// contribution, clamped to `[0, 1]`.
    fn shade(&self, technique: Technique) -> Result<Vec4> {
        let lights: LightBlock = self.uniform(LIGHT_SLOT)?;
        let count = (lights.count as usize).min(lights.lights.len());
        let light = lights.lights[..count]
            .iter()
            .fold(Vec3::ZERO, |sum, light| {
                let ambient = Vec4::from(light.ambient).truncate();
                let diffuse = Vec4::from(light.diffuse).truncate();
                sum + ambient + diffuse * light.power
            })
            .clamp(Vec3::ZERO, Vec3::ONE);

        let base = match technique {
            Technique::Pbr => {
                let material: MaterialBlock = self.uniform(TECHNIQUE_SLOT)?;
                Vec4::from(material.diffuse)
            }
            Technique::Water => WATER_COLOR,
            _ => Vec4::ONE,
        };
        Ok((base.truncate() * light).extend(base.w))
    }

    // ------------------------------------------------------------------------
    // Full-screen techniques
    // ------------------------------------------------------------------------

    fn draw_fullscreen(&mut self, technique: Technique, output: OutputBinding) -> Result<()> {
        let (width, height) = self.output_size(output)?;
        let pixels = (0..height).flat_map(|y| (0..width).map(move |x| (x, y)));

        let result: Vec<Vec4> = match technique {
            Technique::Texture => {
                let source = self.source(0)?;
                pixels.map(|(x, y)| source.sample(x, y, width, height)).collect()
            }
            Technique::BloomThreshold => {
                let block: BloomBlock = self.uniform(POST_SLOT)?;
                let source = self.source(0)?;
                pixels
                    .map(|(x, y)| {
                        let texel = source.sample(x, y, width, height);
                        if texel.truncate().dot(LUMINANCE) > block.threshold {
                            texel
                        } else {
                            Vec4::ZERO
                        }
                    })
                    .collect()
            }
            Technique::BloomBlur => {
                let block: BloomBlock = self.uniform(POST_SLOT)?;
                let source = self.source(0)?;
                let weights = &block.weights[..=block.radius as usize];
                blur(&source, width, height, weights, block.skip, block.horizontal != 0)
            }
            Technique::DofBlur => {
                let block: DofBlurBlock = self.uniform(POST_SLOT)?;
                let source = self.source(0)?;
                let weights = &block.weights[..=block.radius as usize];
                blur(&source, width, height, weights, 1.0, block.horizontal != 0)
            }
            Technique::BloomComposite => {
                let scene = self.source(0)?;
                let bloom = self.source(1)?;
                pixels
                    .map(|(x, y)| {
                        let base = scene.sample(x, y, width, height);
                        let glow = bloom.sample(x, y, width, height);
                        (base.truncate() + glow.truncate()).extend(base.w)
                    })
                    .collect()
            }
            Technique::DofComposite => {
                let block: DofCompositeBlock = self.uniform(POST_SLOT)?;
                let layers = (0..block.layer_count)
                    .map(|slot| self.source(slot))
                    .collect::<Result<Vec<_>>>()?;
                pixels
                    .map(|(x, y)| {
                        layers.iter().fold(Vec4::ZERO, |merged, layer| {
                            over(layer.sample(x, y, width, height), merged)
                        })
                    })
                    .collect()
            }
            Technique::Pbr | Technique::Terrain | Technique::Water => {
                return Err(StrataError::Device(format!(
                    "{} is not a full-screen technique",
                    technique.label()
                )));
            }
        };

        self.output_canvas(output)?.color = result;
        Ok(())
    }
}

/// One direction of a separable blur with one-sided `weights`.
fn blur(
    source: &Source<'_>,
    width: u32,
    height: u32,
    weights: &[f32],
    skip: f32,
    horizontal: bool,
) -> Vec<Vec4> {
    let axis = if horizontal { (1, 0) } else { (0, 1) };
    let mut out = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let fetch = |offset: i64| {
                let sx = (i64::from(x) + axis.0 * offset).clamp(0, i64::from(width) - 1);
                let sy = (i64::from(y) + axis.1 * offset).clamp(0, i64::from(height) - 1);
                source.sample(sx as u32, sy as u32, width, height)
            };
            let mut sum = fetch(0) * weights[0];
            for (k, weight) in weights.iter().enumerate().skip(1) {
                let offset = (k as f32 * skip).round() as i64;
                sum += (fetch(offset) + fetch(-offset)) * *weight;
            }
            out.push(sum);
        }
    }
    out
}

impl GpuDevice for SoftwareDevice {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<TargetId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(StrataError::ResourceCreation {
                kind: "render target",
                label: desc.label.clone(),
                reason: format!("zero extent {}x{}", desc.width, desc.height),
            });
        }
        let id = TargetId(self.allocate());
        self.targets.insert(id, Canvas::new(desc.width, desc.height));
        debug!("software: target `{}` as {id:?}", desc.label);
        Ok(id)
    }

    fn create_shadow_map(&mut self, desc: &ShadowMapDesc) -> Result<ShadowMapId> {
        let id = ShadowMapId(self.allocate());
        self.shadow_maps.insert(id, vec![1.0; desc.layers as usize]);
        Ok(id)
    }

    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId> {
        let id = ProgramId(self.allocate());
        self.programs.insert(id, desc.technique);
        Ok(id)
    }

    fn upload_mesh(&mut self, desc: &MeshDesc<'_>) -> Result<MeshId> {
        let id = MeshId(self.allocate());
        self.meshes.insert(
            id,
            desc.vertices
                .iter()
                .map(|vertex| Vec3::from(vertex.position))
                .collect(),
        );
        Ok(id)
    }

    fn release(&mut self, resource: ResourceId) {
        match resource {
            ResourceId::Target(id) => {
                self.targets.remove(&id);
            }
            ResourceId::ShadowMap(id) => {
                self.shadow_maps.remove(&id);
            }
            ResourceId::Program(id) => {
                self.programs.remove(&id);
            }
            ResourceId::Mesh(id) => {
                self.meshes.remove(&id);
            }
            ResourceId::Texture(_) | ResourceId::Surface => {}
        }
    }

    fn clear_target(&mut self, target: TargetId, color: wgpu::Color) -> Result<()> {
        self.output_canvas(OutputBinding::Target(target))?
            .clear(to_vec4(color));
        Ok(())
    }

    fn clear_shadow_map(&mut self, map: ShadowMapId, depth: f32) -> Result<()> {
        self.shadow_maps
            .get_mut(&map)
            .ok_or(StrataError::UnknownResource(ResourceId::ShadowMap(map)))?
            .fill(depth);
        Ok(())
    }

    fn clear_surface(&mut self, color: wgpu::Color) -> Result<()> {
        self.surface.clear(to_vec4(color));
        Ok(())
    }

    fn set_output(&mut self, output: OutputBinding) -> Result<()> {
        let known = match output {
            OutputBinding::Target(id) => self.targets.contains_key(&id),
            OutputBinding::ShadowFace { map, .. } => self.shadow_maps.contains_key(&map),
            OutputBinding::Surface => true,
        };
        if !known {
            return Err(StrataError::UnknownResource(output.resource()));
        }
        self.output = Some(output);
        Ok(())
    }

    fn bind_program(&mut self, program: ProgramId) -> Result<()> {
        if !self.programs.contains_key(&program) {
            return Err(StrataError::UnknownResource(ResourceId::Program(program)));
        }
        self.program = Some(program);
        Ok(())
    }

    fn set_uniform_block(&mut self, slot: u32, data: &[u8]) -> Result<()> {
        let block = self.uniforms.entry(slot).or_default();
        block.clear();
        block.extend_from_slice(data);
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, view: Option<TextureView>) -> Result<()> {
        match view {
            Some(view) => self.inputs.insert(slot, view),
            None => self.inputs.remove(&slot),
        };
        Ok(())
    }

    fn bind_mesh(&mut self, mesh: MeshId) -> Result<()> {
        if !self.meshes.contains_key(&mesh) {
            return Err(StrataError::UnknownResource(ResourceId::Mesh(mesh)));
        }
        self.mesh = Some(mesh);
        Ok(())
    }

    fn set_raster_state(&mut self, state: RasterState) -> Result<()> {
        self.raster = state;
        Ok(())
    }

    fn draw(&mut self, _index_count: u32, _topology: Topology) -> Result<()> {
        let output = self
            .output
            .ok_or_else(|| StrataError::NoOutputBound("software device".to_owned()))?;
        let technique = self
            .program
            .and_then(|program| self.programs.get(&program).copied())
            .ok_or_else(|| StrataError::NoProgramBound("software device".to_owned()))?;

        match technique {
            Technique::Pbr | Technique::Terrain | Technique::Water => {
                self.draw_geometry(technique, output)
            }
            _ => self.draw_fullscreen(technique, output),
        }
    }

    fn present(&mut self) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}
