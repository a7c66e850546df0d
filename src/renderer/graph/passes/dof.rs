//! Layered depth of field.
//!
//! The depth range around the focus plane is cut into nine bands. Each band
//! is rendered into its own layer, blurred in proportion to its distance
//! from the focus band, and the blurred layers are merged far to near:
//!
//! ```text
//! for i in 0..9:
//!     clear layer[i]                      (band 0: background, others: transparent)
//!     draw scene, depth ∈ band[i]         → layer[i]
//!     blur H  layer[i]                    → scratch
//!     blur V  scratch                     → blurred[i]
//! composite blurred[0..9] (slots 0..8)    → dof_output
//! ```

use log::debug;
use smallvec::SmallVec;

use super::geometry::{GeometryFilter, draw_scene};
use super::{TRANSPARENT, fullscreen};
use crate::errors::Result;
use crate::renderer::core::{CommandStream, TextureView};
use crate::renderer::graph::context::FrameContext;
use crate::renderer::graph::node::RenderNode;
use crate::renderer::program::{DofBlurParams, DofCompositeParams};
use crate::resources::dof::DOF_LAYER_COUNT;

pub struct DepthOfFieldNode;

impl RenderNode for DepthOfFieldNode {
    fn name(&self) -> &'static str {
        "depth_of_field"
    }

    fn run(&self, ctx: &mut FrameContext<'_>, stream: &mut CommandStream<'_>) -> Result<()> {
        let targets = ctx.targets;
        let programs = ctx.programs;
        let settings = ctx.scene.dof;
        let bands = settings.bands();
        let camera = ctx.camera;

        for (layer, band) in bands.iter().copied().enumerate() {
            let target = &targets.dof_layers()[layer];
            let clear = if layer == 0 {
                ctx.settings.background
            } else {
                TRANSPARENT
            };
            stream.clear_target(target.id(), clear)?;
            stream.set_output(target.output())?;
            stream.set_wireframe(ctx.scene.wireframe)?;
            draw_scene(ctx, stream, &camera, band, GeometryFilter::Color)?;

            let radius = settings.blur_radius(layer);
            let scratch = targets.dof_scratch();
            fullscreen(
                ctx,
                stream,
                &programs.dof_blur,
                &DofBlurParams {
                    color: target.color_view(),
                    depth: target.depth_view(),
                    layer: layer as u32,
                    band,
                    horizontal: true,
                    radius,
                },
                scratch,
                TRANSPARENT,
            )?;
            fullscreen(
                ctx,
                stream,
                &programs.dof_blur,
                &DofBlurParams {
                    color: scratch.color_view(),
                    depth: target.depth_view(),
                    layer: layer as u32,
                    band,
                    horizontal: false,
                    radius,
                },
                &targets.dof_blurred()[layer],
                TRANSPARENT,
            )?;
        }

        let layers: SmallVec<[TextureView; DOF_LAYER_COUNT]> = targets.blurred_views().collect();
        fullscreen(
            ctx,
            stream,
            &programs.dof_composite,
            &DofCompositeParams { layers: &layers },
            targets.dof_output(),
            TRANSPARENT,
        )?;
        debug!(
            "Depth of field composited {} layers around {:.4}",
            layers.len(),
            settings.focus_plane()
        );

        ctx.scene_color = Some(targets.dof_output().color_view());
        Ok(())
    }
}
