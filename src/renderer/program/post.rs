//! Full-screen programs.
//!
//! Every post program samples one or more colour views and writes the bound
//! output through a full-screen quad. Their technique block lives at
//! [`POST_SLOT`].

use super::uniforms::{BloomBlock, DofBlurBlock, DofCompositeBlock, POST_SLOT};
use super::{ProgramHandle, ShaderProgram};
use crate::errors::Result;
use crate::renderer::core::{CommandStream, TextureView};
use crate::resources::dof::DepthBand;

macro_rules! post_program {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            handle: ProgramHandle,
        }

        impl $name {
            #[must_use]
            pub fn new(handle: ProgramHandle) -> Self {
                Self { handle }
            }
        }
    };
}

// ============================================================================
// Bloom
// ============================================================================

post_program!(
    /// Keeps texels whose luminance exceeds the threshold.
    BloomThresholdProgram
);

pub struct BloomThresholdParams {
    pub source: TextureView,
    pub threshold: f32,
}

impl ShaderProgram for BloomThresholdProgram {
    type Params<'p> = BloomThresholdParams;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &BloomThresholdParams) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        stream.set_uniform_block(POST_SLOT, &BloomBlock::threshold(params.threshold))?;
        stream.bind_texture(0, params.source)
    }
}

post_program!(
    /// One direction of the separable bloom blur.
    BloomBlurProgram
);

pub struct BloomBlurParams {
    pub source: TextureView,
    pub horizontal: bool,
    pub radius: u32,
    pub skip: f32,
}

impl ShaderProgram for BloomBlurProgram {
    type Params<'p> = BloomBlurParams;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &BloomBlurParams) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        stream.set_uniform_block(
            POST_SLOT,
            &BloomBlock::blur(params.horizontal, params.radius, params.skip),
        )?;
        stream.bind_texture(0, params.source)
    }
}

post_program!(
    /// Adds the blurred highlights on top of the scene image.
    BloomCompositeProgram
);

pub struct BloomCompositeParams {
    pub scene: TextureView,
    pub bloom: TextureView,
}

impl ShaderProgram for BloomCompositeProgram {
    type Params<'p> = BloomCompositeParams;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &BloomCompositeParams) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        stream.bind_texture(0, params.scene)?;
        stream.bind_texture(1, params.bloom)
    }
}

// ============================================================================
// Depth of field
// ============================================================================

post_program!(
    /// One direction of a depth-layer blur.
    DofBlurProgram
);

pub struct DofBlurParams {
    pub color: TextureView,
    pub depth: TextureView,
    pub layer: u32,
    pub band: DepthBand,
    pub horizontal: bool,
    pub radius: u32,
}

impl ShaderProgram for DofBlurProgram {
    type Params<'p> = DofBlurParams;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &DofBlurParams) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        stream.set_uniform_block(
            POST_SLOT,
            &DofBlurBlock::new(params.layer, params.band, params.horizontal, params.radius),
        )?;
        stream.bind_texture(0, params.color)?;
        stream.bind_texture(1, params.depth)
    }
}

post_program!(
    /// Merges the blurred layers back to front.
    DofCompositeProgram
);

pub struct DofCompositeParams<'p> {
    /// Layer views, farthest first. Layer `i` is bound at slot `i`.
    pub layers: &'p [TextureView],
}

impl ShaderProgram for DofCompositeProgram {
    type Params<'p> = DofCompositeParams<'p>;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &DofCompositeParams<'_>) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        stream.set_uniform_block(
            POST_SLOT,
            &DofCompositeBlock {
                layer_count: params.layers.len() as u32,
                _pad: [0; 3],
            },
        )?;
        for (slot, view) in params.layers.iter().enumerate() {
            stream.bind_texture(slot as u32, *view)?;
        }
        Ok(())
    }
}

// ============================================================================
// Blit
// ============================================================================

post_program!(
    /// Copies a colour view to the output.
    TextureProgram
);

pub struct TextureParams {
    pub source: TextureView,
}

impl ShaderProgram for TextureProgram {
    type Params<'p> = TextureParams;

    fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    fn bind(&self, stream: &mut CommandStream<'_>, params: &TextureParams) -> Result<()> {
        stream.bind_program(self.handle.id())?;
        stream.bind_texture(0, params.source)
    }
}
