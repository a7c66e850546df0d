//! Offscreen targets shared by all frames.
//!
//! ```text
//! main ─────────────────────────────┐
//!                                   ├─► bloom_a ⇄ bloom_b ─► surface
//! dof_layers[i] ⇄ dof_scratch       │
//!   └─► dof_blurred[i] ─► dof_output┘
//! ```
//!
//! Everything is allocated once at renderer creation at the output
//! resolution and released when the renderer is dropped.

use log::info;

use crate::errors::Result;
use crate::renderer::core::{Allocator, RenderTarget, RenderTargetDesc, TextureView};
use crate::renderer::settings::RendererSettings;
use crate::resources::dof::DOF_LAYER_COUNT;

pub struct FrameTargets {
    main: RenderTarget,
    dof_layers: Vec<RenderTarget>,
    dof_blurred: Vec<RenderTarget>,
    dof_scratch: RenderTarget,
    dof_output: RenderTarget,
    bloom_a: RenderTarget,
    bloom_b: RenderTarget,
}

impl FrameTargets {
    pub fn allocate(allocator: &mut Allocator<'_>, settings: &RendererSettings) -> Result<Self> {
        let mut target = |label: String| {
            allocator.render_target(RenderTargetDesc {
                label,
                width: settings.width,
                height: settings.height,
                color_format: settings.color_format,
                depth_format: settings.depth_format,
            })
        };

        let main = target("main".to_owned())?;
        let dof_layers = (0..DOF_LAYER_COUNT)
            .map(|i| target(format!("dof_layer_{i}")))
            .collect::<Result<Vec<_>>>()?;
        let dof_blurred = (0..DOF_LAYER_COUNT)
            .map(|i| target(format!("dof_blurred_{i}")))
            .collect::<Result<Vec<_>>>()?;
        let dof_scratch = target("dof_scratch".to_owned())?;
        let dof_output = target("dof_output".to_owned())?;
        let bloom_a = target("bloom_a".to_owned())?;
        let bloom_b = target("bloom_b".to_owned())?;

        info!(
            "Allocated frame targets at {}x{} ({} DOF layers)",
            settings.width, settings.height, DOF_LAYER_COUNT
        );
        Ok(Self {
            main,
            dof_layers,
            dof_blurred,
            dof_scratch,
            dof_output,
            bloom_a,
            bloom_b,
        })
    }

    #[must_use]
    pub fn main(&self) -> &RenderTarget {
        &self.main
    }

    #[must_use]
    pub fn dof_layers(&self) -> &[RenderTarget] {
        &self.dof_layers
    }

    #[must_use]
    pub fn dof_blurred(&self) -> &[RenderTarget] {
        &self.dof_blurred
    }

    #[must_use]
    pub fn dof_scratch(&self) -> &RenderTarget {
        &self.dof_scratch
    }

    #[must_use]
    pub fn dof_output(&self) -> &RenderTarget {
        &self.dof_output
    }

    #[must_use]
    pub fn bloom_a(&self) -> &RenderTarget {
        &self.bloom_a
    }

    /// Holds the final pre-present image after the bloom pass.
    #[must_use]
    pub fn bloom_b(&self) -> &RenderTarget {
        &self.bloom_b
    }

    /// Colour views of the blurred layers, farthest first.
    pub fn blurred_views(&self) -> impl Iterator<Item = TextureView> + '_ {
        self.dof_blurred.iter().map(RenderTarget::color_view)
    }
}
