//! GPU uniform block layouts.
//!
//! Every block is `#[repr(C)]`, `Pod`, made of 4-byte scalars only and
//! padded to a multiple of 16 bytes, so it can be copied verbatim into a
//! constant buffer.
//!
//! # Slot map
//!
//! | Slot | Scene programs        | Full-screen programs |
//! |------|-----------------------|----------------------|
//! | 0    | [`MatrixBlock`]       | technique block      |
//! | 1    | [`CameraBlock`]       | -                    |
//! | 2    | [`LightBlock`]        | -                    |
//! | 3    | [`DepthRangeBlock`]   | -                    |
//! | 4    | material / height map / waves | -            |
//! | 5    | [`TessellationBlock`] | -                    |

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::renderer::kernel::{MAX_KERNEL_RADIUS, packed_weights};
use crate::resources::dof::DepthBand;
use crate::resources::material::Material;
use crate::scene::SceneLight;
use crate::scene::light::{LightKind, MAX_LIGHTS};
use crate::scene::terrain::{HeightMapSettings, Tessellation};
use crate::scene::waves::{WAVE_COUNT, WaveDescriptor};

pub const MATRIX_SLOT: u32 = 0;
pub const CAMERA_SLOT: u32 = 1;
pub const LIGHT_SLOT: u32 = 2;
pub const DEPTH_RANGE_SLOT: u32 = 3;
pub const TECHNIQUE_SLOT: u32 = 4;
pub const TESSELLATION_SLOT: u32 = 5;

/// Uniform slot of full-screen technique blocks.
pub const POST_SLOT: u32 = 0;

/// First texture slot holding light shadow maps; light `i` uses
/// `SHADOW_TEXTURE_BASE + i`.
pub const SHADOW_TEXTURE_BASE: u32 = 8;

#[inline]
fn mat(m: Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

#[inline]
fn vec4(v: Vec4) -> [f32; 4] {
    v.to_array()
}

#[inline]
fn point(v: Vec3) -> [f32; 4] {
    v.extend(1.0).to_array()
}

// ============================================================================
// Scene blocks
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MatrixBlock {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl MatrixBlock {
    #[must_use]
    pub fn new(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            world: mat(world),
            view: mat(view),
            projection: mat(projection),
        }
    }

    #[must_use]
    pub fn world_view_projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection)
            * Mat4::from_cols_array_2d(&self.view)
            * Mat4::from_cols_array_2d(&self.world)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraBlock {
    pub position: [f32; 4],
}

impl CameraBlock {
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position: point(position),
        }
    }
}

/// One light as the shader sees it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub views: [[[f32; 4]; 4]; 6],
    pub projection: [[f32; 4]; 4],
    /// constant, linear, quadratic
    pub attenuation: [f32; 3],
    pub power: f32,
    /// 0 directional, 1 point, 2 spot
    pub kind: i32,
    pub inner_angle: f32,
    pub outer_angle: f32,
    pub _pad: f32,
}

impl GpuLight {
    #[must_use]
    pub fn from_light(entry: &SceneLight) -> Self {
        let light = &entry.light;
        let matrices = light.shadow_matrices();
        let mut views = [[[0.0; 4]; 4]; 6];
        for (slot, view) in views.iter_mut().zip(matrices.views()) {
            *slot = mat(*view);
        }
        let (inner_angle, outer_angle) = match light.kind() {
            LightKind::Spot { inner, outer } => (inner, outer),
            LightKind::Directional | LightKind::Point => (0.0, 0.0),
        };
        Self {
            ambient: vec4(light.ambient),
            diffuse: vec4(light.diffuse),
            position: point(light.position()),
            direction: light.direction().normalize_or(Vec3::NEG_Y).extend(0.0).to_array(),
            views,
            projection: mat(matrices.projection()),
            attenuation: [
                light.attenuation.constant,
                light.attenuation.linear,
                light.attenuation.quadratic,
            ],
            power: light.power,
            kind: light.kind().gpu_tag(),
            inner_angle,
            outer_angle,
            _pad: 0.0,
        }
    }
}

/// Fixed-size light array plus the live count.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    pub lights: [GpuLight; MAX_LIGHTS],
    pub count: u32,
    pub _pad: [u32; 3],
}

impl LightBlock {
    /// Packs the scene's lights in list order. The scene already refuses
    /// more than [`MAX_LIGHTS`] lights.
    #[must_use]
    pub fn from_lights(lights: &[SceneLight]) -> Self {
        let mut block = Self::zeroed();
        for (slot, entry) in block.lights.iter_mut().zip(lights) {
            *slot = GpuLight::from_light(entry);
        }
        block.count = lights.len().min(MAX_LIGHTS) as u32;
        block
    }
}

/// Fragments with depth outside `(min, max]` are discarded.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DepthRangeBlock {
    pub min: f32,
    pub max: f32,
    pub _pad: [f32; 2],
}

impl From<DepthBand> for DepthRangeBlock {
    fn from(band: DepthBand) -> Self {
        Self {
            min: band.min,
            max: band.max,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialBlock {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub specularity: f32,
    pub smoothness: f32,
    pub anisotropy: f32,
    /// Only flags backed by a bound texture.
    pub texture_flags: u32,
}

impl From<&Material> for MaterialBlock {
    fn from(material: &Material) -> Self {
        Self {
            diffuse: vec4(material.diffuse),
            specular: vec4(material.specular),
            specularity: material.specularity,
            smoothness: material.smoothness,
            anisotropy: material.anisotropy,
            texture_flags: material.effective_flags().bits(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct HeightMapBlock {
    pub amplitude: f32,
    pub world_dimensions: [f32; 2],
    pub smoothing: u32,
}

impl From<&HeightMapSettings> for HeightMapBlock {
    fn from(settings: &HeightMapSettings) -> Self {
        Self {
            amplitude: settings.amplitude,
            world_dimensions: settings.world_dimensions.to_array(),
            smoothing: u32::from(settings.smoothing),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TessellationBlock {
    pub factors: [f32; 2],
    pub distances: [f32; 2],
    /// Eye the distance is measured from.
    pub eye: [f32; 4],
}

impl TessellationBlock {
    #[must_use]
    pub fn new(tessellation: &Tessellation, eye: Vec3) -> Self {
        Self {
            factors: tessellation.factors().to_array(),
            distances: tessellation.distances().to_array(),
            eye: point(eye),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuWave {
    pub time: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub speed: f32,
    pub direction: [f32; 2],
    pub steepness: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct WaveBlock {
    pub waves: [GpuWave; WAVE_COUNT],
}

impl From<&[WaveDescriptor; WAVE_COUNT]> for WaveBlock {
    fn from(waves: &[WaveDescriptor; WAVE_COUNT]) -> Self {
        Self {
            waves: waves.map(|wave| GpuWave {
                time: wave.time,
                amplitude: wave.amplitude,
                frequency: wave.frequency,
                speed: wave.speed,
                direction: wave.direction.to_array(),
                steepness: wave.steepness,
                _pad: 0.0,
            }),
        }
    }
}

// ============================================================================
// Full-screen blocks
// ============================================================================

/// Shared by the three bloom programs; each reads the fields it needs.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BloomBlock {
    pub threshold: f32,
    /// Taps on each side of the centre.
    pub radius: u32,
    /// Texel stride between taps.
    pub skip: f32,
    /// 1 for the horizontal pass, 0 for vertical.
    pub horizontal: u32,
    pub weights: [f32; MAX_KERNEL_RADIUS + 1],
}

impl BloomBlock {
    #[must_use]
    pub fn threshold(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::zeroed()
        }
    }

    #[must_use]
    pub fn blur(horizontal: bool, radius: u32, skip: f32) -> Self {
        Self {
            threshold: 0.0,
            radius: radius.min(MAX_KERNEL_RADIUS as u32),
            skip,
            horizontal: u32::from(horizontal),
            weights: packed_weights(radius),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DofBlurBlock {
    pub layer: u32,
    pub horizontal: u32,
    pub radius: u32,
    pub _pad0: u32,
    /// Depth band of the layer, for edge-aware sampling.
    pub band: [f32; 2],
    pub _pad1: [f32; 2],
    pub weights: [f32; MAX_KERNEL_RADIUS + 1],
}

impl DofBlurBlock {
    #[must_use]
    pub fn new(layer: u32, band: DepthBand, horizontal: bool, radius: u32) -> Self {
        Self {
            layer,
            horizontal: u32::from(horizontal),
            radius: radius.min(MAX_KERNEL_RADIUS as u32),
            _pad0: 0,
            band: [band.min, band.max],
            _pad1: [0.0; 2],
            weights: packed_weights(radius),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DofCompositeBlock {
    /// Layers bound at slots `0..layer_count`, far to near.
    pub layer_count: u32,
    pub _pad: [u32; 3],
}
