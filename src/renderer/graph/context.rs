//! Per-frame context shared by every node.
//!
//! Built once per [`Renderer::render`](crate::renderer::Renderer::render)
//! call. Scene inputs are borrowed read-only; the only mutable parts are
//! the two hand-off slots between nodes and the UI overlay.

use smallvec::SmallVec;

use super::targets::FrameTargets;
use crate::app::DebugPanel;
use crate::renderer::core::TextureView;
use crate::renderer::program::ProgramSet;
use crate::renderer::program::uniforms::LightBlock;
use crate::renderer::settings::RendererSettings;
use crate::resources::mesh::Mesh;
use crate::scene::Scene;
use crate::scene::camera::Viewpoint;
use crate::scene::light::MAX_LIGHTS;

pub struct FrameContext<'a> {
    pub scene: &'a Scene,
    pub settings: &'a RendererSettings,
    pub programs: &'a ProgramSet,
    pub targets: &'a FrameTargets,
    pub fullscreen_quad: &'a dyn Mesh,

    /// Camera viewpoint for colour passes.
    pub camera: Viewpoint,
    /// Light uniforms, packed once per frame.
    pub lights: LightBlock,
    /// Shadow map of every light, in light order.
    pub shadow_views: SmallVec<[TextureView; MAX_LIGHTS]>,

    pub overlay: Option<&'a mut dyn DebugPanel>,

    /// Output of the main or depth-of-field node.
    pub scene_color: Option<TextureView>,
    /// Output of the bloom node.
    pub final_color: Option<TextureView>,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        scene: &'a Scene,
        settings: &'a RendererSettings,
        programs: &'a ProgramSet,
        targets: &'a FrameTargets,
        fullscreen_quad: &'a dyn Mesh,
        camera: Viewpoint,
        overlay: Option<&'a mut dyn DebugPanel>,
    ) -> Self {
        Self {
            lights: LightBlock::from_lights(scene.lights()),
            shadow_views: scene
                .lights()
                .iter()
                .map(|entry| entry.shadow_map().view())
                .collect(),
            scene,
            settings,
            programs,
            targets,
            fullscreen_quad,
            camera,
            overlay,
            scene_color: None,
            final_color: None,
        }
    }
}
