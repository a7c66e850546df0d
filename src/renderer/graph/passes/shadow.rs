//! Shadow depth pass.
//!
//! For each light in list order: clear its map once, then render every
//! face (1 for directional, 6 for cube maps) from that face's viewpoint.
//! All faces of a light finish before the next light starts.

use log::debug;

use super::geometry::{GeometryFilter, draw_scene};
use crate::errors::Result;
use crate::renderer::core::CommandStream;
use crate::renderer::graph::context::FrameContext;
use crate::renderer::graph::node::RenderNode;
use crate::resources::dof::DepthBand;

/// Depth written by a shadow map clear (far plane).
pub const SHADOW_CLEAR_DEPTH: f32 = 1.0;

pub struct ShadowNode;

impl RenderNode for ShadowNode {
    fn name(&self) -> &'static str {
        "shadow"
    }

    fn run(&self, ctx: &mut FrameContext<'_>, stream: &mut CommandStream<'_>) -> Result<()> {
        // Depth-only draws are always filled.
        stream.set_wireframe(false)?;

        let scene = ctx.scene;
        let mut faces = 0;
        for entry in scene.lights() {
            let map = entry.shadow_map();
            stream.clear_shadow_map(map.id(), SHADOW_CLEAR_DEPTH)?;

            for face in 0..map.kind().face_count() {
                let Some(viewpoint) = entry.light.face_viewpoint(face) else {
                    break;
                };
                stream.set_output(map.face_output(face))?;
                draw_scene(
                    ctx,
                    stream,
                    &viewpoint,
                    DepthBand::FULL,
                    GeometryFilter::ShadowCasters,
                )?;
                faces += 1;
            }
        }
        debug!(
            "Shadow pass rendered {faces} faces for {} lights",
            scene.lights().len()
        );
        Ok(())
    }
}
