//! Main scene pass: one full-depth colour render from the camera.

use log::debug;

use super::geometry::{GeometryFilter, draw_scene};
use crate::errors::Result;
use crate::renderer::core::CommandStream;
use crate::renderer::graph::context::FrameContext;
use crate::renderer::graph::node::RenderNode;
use crate::resources::dof::DepthBand;

pub struct MainSceneNode;

impl RenderNode for MainSceneNode {
    fn name(&self) -> &'static str {
        "main_scene"
    }

    fn run(&self, ctx: &mut FrameContext<'_>, stream: &mut CommandStream<'_>) -> Result<()> {
        let targets = ctx.targets;
        let target = targets.main();
        stream.clear_target(target.id(), ctx.settings.background)?;
        stream.set_output(target.output())?;
        stream.set_wireframe(ctx.scene.wireframe)?;

        let camera = ctx.camera;
        let draws = draw_scene(ctx, stream, &camera, DepthBand::FULL, GeometryFilter::Color)?;
        debug!("Main pass issued {draws} draws");

        ctx.scene_color = Some(target.color_view());
        Ok(())
    }
}
