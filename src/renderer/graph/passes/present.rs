//! Final blit to the back buffer, UI overlay and present.

use log::debug;

use crate::errors::{Result, StrataError};
use crate::renderer::core::{CommandStream, OutputBinding};
use crate::renderer::graph::context::FrameContext;
use crate::renderer::graph::node::RenderNode;
use crate::renderer::program::{ShaderProgram, TextureParams};

pub struct PresentNode;

impl RenderNode for PresentNode {
    fn name(&self) -> &'static str {
        "present"
    }

    fn run(&self, ctx: &mut FrameContext<'_>, stream: &mut CommandStream<'_>) -> Result<()> {
        let source = ctx
            .final_color
            .ok_or_else(|| StrataError::NoOutputBound("present source".to_owned()))?;

        stream.set_wireframe(false)?;
        stream.set_output(OutputBinding::Surface)?;
        stream.clear_surface(ctx.settings.present_clear)?;
        ctx.programs
            .texture
            .draw_mesh(stream, &TextureParams { source }, ctx.fullscreen_quad)?;

        if let Some(panel) = ctx.overlay.as_deref_mut() {
            panel.overlay(stream)?;
        }

        stream.present()?;
        debug!("Presented frame");
        Ok(())
    }
}
