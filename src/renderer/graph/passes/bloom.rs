//! Threshold bloom.
//!
//! ```text
//! threshold  scene      → A
//! blur H     A          → B
//! blur V     B          → A
//! composite  scene + A  → B   (final image)
//! ```
//!
//! Every write is preceded by a clear of its target.

use log::debug;

use super::{TRANSPARENT, fullscreen};
use crate::errors::{Result, StrataError};
use crate::renderer::core::CommandStream;
use crate::renderer::graph::context::FrameContext;
use crate::renderer::graph::node::RenderNode;
use crate::renderer::program::{BloomBlurParams, BloomCompositeParams, BloomThresholdParams};

pub struct BloomNode;

impl RenderNode for BloomNode {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn run(&self, ctx: &mut FrameContext<'_>, stream: &mut CommandStream<'_>) -> Result<()> {
        let scene_color = ctx
            .scene_color
            .ok_or_else(|| StrataError::NoOutputBound("bloom source".to_owned()))?;
        let targets = ctx.targets;
        let programs = ctx.programs;
        let settings = ctx.scene.bloom;
        let (a, b) = (targets.bloom_a(), targets.bloom_b());

        fullscreen(
            ctx,
            stream,
            &programs.bloom_threshold,
            &BloomThresholdParams {
                source: scene_color,
                threshold: settings.threshold(),
            },
            a,
            TRANSPARENT,
        )?;

        for (source, output, horizontal) in [(a, b, true), (b, a, false)] {
            fullscreen(
                ctx,
                stream,
                &programs.bloom_blur,
                &BloomBlurParams {
                    source: source.color_view(),
                    horizontal,
                    radius: settings.blur_size(),
                    skip: settings.blur_skip(),
                },
                output,
                TRANSPARENT,
            )?;
        }

        fullscreen(
            ctx,
            stream,
            &programs.bloom_composite,
            &BloomCompositeParams {
                scene: scene_color,
                bloom: a.color_view(),
            },
            b,
            TRANSPARENT,
        )?;
        debug!(
            "Bloom threshold {:.2}, blur {} x{:.1}",
            settings.threshold(),
            settings.blur_size(),
            settings.blur_skip()
        );

        ctx.final_color = Some(b.color_view());
        Ok(())
    }
}
