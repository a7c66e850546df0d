//! Render pass implementations.

mod bloom;
mod dof;
mod geometry;
mod present;
mod scene;
mod shadow;

pub use bloom::BloomNode;
pub use dof::DepthOfFieldNode;
pub use geometry::{GeometryFilter, draw_scene};
pub use present::PresentNode;
pub use scene::MainSceneNode;
pub use shadow::{SHADOW_CLEAR_DEPTH, ShadowNode};

use crate::errors::Result;
use crate::renderer::core::{CommandStream, RenderTarget};
use crate::renderer::graph::context::FrameContext;
use crate::renderer::program::ShaderProgram;

/// Fully transparent black, the clear colour of every scratch target.
pub const TRANSPARENT: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.0,
};

/// Clears `output`, binds it and draws the full-screen quad with `program`.
///
/// Wireframe is forced off first: it only ever applies to scene geometry.
pub(crate) fn fullscreen<P: ShaderProgram>(
    ctx: &FrameContext<'_>,
    stream: &mut CommandStream<'_>,
    program: &P,
    params: &P::Params<'_>,
    output: &RenderTarget,
    clear: wgpu::Color,
) -> Result<()> {
    stream.set_wireframe(false)?;
    stream.clear_target(output.id(), clear)?;
    stream.set_output(output.output())?;
    program.draw_mesh(stream, params, ctx.fullscreen_quad)
}
