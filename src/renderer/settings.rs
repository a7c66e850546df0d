//! Renderer Configuration
//!
//! [`RendererSettings`] is fixed for the lifetime of a
//! [`Renderer`](super::Renderer): it decides resolution, surface formats and
//! shadow map sizes. Per-frame tunables (bloom, depth of field, wireframe)
//! live on the [`Scene`](crate::scene::Scene) instead.
//!
//! # Defaults
//!
//! | Setting                  | Default                    |
//! |--------------------------|----------------------------|
//! | resolution               | 1280 × 720                 |
//! | colour format            | `Rgba16Float`              |
//! | depth format             | `Depth32Float`             |
//! | directional shadow map   | 8192²                      |
//! | cube shadow map (per face) | 1024²                    |
//! | background               | (0.39, 0.58, 0.92, 1)      |
//! | present clear            | opaque black               |

use crate::renderer::core::ShadowMapKind;

/// Shadow map sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Edge length of directional light maps.
    pub directional_size: u32,
    /// Edge length of each cube face for point and spot lights.
    pub cube_size: u32,
    pub format: wgpu::TextureFormat,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            directional_size: 8192,
            cube_size: 1024,
            format: wgpu::TextureFormat::Depth32Float,
        }
    }
}

impl ShadowSettings {
    #[must_use]
    pub fn size_for(&self, kind: ShadowMapKind) -> u32 {
        match kind {
            ShadowMapKind::Single => self.directional_size,
            ShadowMapKind::Cube => self.cube_size,
        }
    }
}

/// Renderer-lifetime configuration.
///
/// ```rust,ignore
/// use strata::renderer::RendererSettings;
///
/// let small = RendererSettings {
///     width: 320,
///     height: 180,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RendererSettings {
    // === Surfaces ===
    pub width: u32,
    pub height: u32,

    /// Format of every offscreen colour target.
    ///
    /// Bloom thresholds above 1.0 only make sense with a float format.
    pub color_format: wgpu::TextureFormat,

    /// Depth format of offscreen targets.
    pub depth_format: wgpu::TextureFormat,

    pub shadows: ShadowSettings,

    // === Clear colours ===
    /// Background of the main pass and of the farthest depth-of-field layer.
    pub background: wgpu::Color,

    /// Back buffer clear before the final blit.
    pub present_clear: wgpu::Color,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            color_format: wgpu::TextureFormat::Rgba16Float,
            depth_format: wgpu::TextureFormat::Depth32Float,
            shadows: ShadowSettings::default(),
            background: wgpu::Color {
                r: 0.39,
                g: 0.58,
                b: 0.92,
                a: 1.0,
            },
            present_clear: wgpu::Color::BLACK,
        }
    }
}

impl RendererSettings {
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
