//! Render node trait.
//!
//! One node per pass. The renderer runs them in a fixed order, each inside
//! its own debug group, over the same [`CommandStream`].

use super::context::FrameContext;
use crate::errors::Result;
use crate::renderer::core::CommandStream;

pub trait RenderNode {
    /// Debug group label and report name.
    fn name(&self) -> &'static str;

    /// Records the pass. Outputs meant for later nodes are published on
    /// `ctx` (see [`FrameContext::scene_color`]).
    fn run(&self, ctx: &mut FrameContext<'_>, stream: &mut CommandStream<'_>) -> Result<()>;
}
