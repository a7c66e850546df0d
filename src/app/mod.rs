//! Frame driver and the debug panel hook.
//!
//! [`Showcase`] ties the scene, camera and renderer together: each
//! [`frame`](Showcase::frame) lets the panel edit the scene, advances scene
//! time, then renders. Windowing and input stay with the host; the device
//! is passed in per call.

use log::info;

use crate::errors::Result;
use crate::renderer::core::{CommandStream, GpuDevice};
use crate::renderer::{FrameReport, Renderer, RendererSettings};
use crate::scene::Scene;
use crate::scene::camera::Camera;
use crate::scene::preset::{ShowcaseGeometry, ShowcaseLights, build_showcase, showcase_camera};

/// Immediate-mode UI hook.
///
/// [`edit`](Self::edit) runs once per frame before the scene update, so any
/// tunable may change between frames. [`overlay`](Self::overlay) runs inside
/// the present pass with the back buffer bound.
pub trait DebugPanel {
    fn edit(&mut self, scene: &mut Scene, dt: f32);

    fn overlay(&mut self, _stream: &mut CommandStream<'_>) -> Result<()> {
        Ok(())
    }
}

/// The showcase scene with a renderer attached.
pub struct Showcase {
    renderer: Renderer,
    scene: Scene,
    camera: Camera,
    lights: ShowcaseLights,
    panel: Option<Box<dyn DebugPanel>>,
}

impl Showcase {
    /// Builds the renderer and the showcase scene on placeholder geometry.
    pub fn new(device: &mut dyn GpuDevice, settings: RendererSettings) -> Result<Self> {
        let aspect = settings.aspect_ratio();
        let renderer = Renderer::new(device, settings)?;

        let mut scene = Scene::new();
        let geometry = ShowcaseGeometry::placeholder(&mut scene.meshes);
        let lights = {
            let mut allocator = renderer.allocator(device);
            build_showcase(
                &mut scene,
                &mut allocator,
                &renderer.settings().shadows,
                &geometry,
            )?
        };
        // Shadow matrices must exist before the first shadow pass.
        scene.update(0.0);

        info!("Showcase ready");
        Ok(Self {
            renderer,
            scene,
            camera: showcase_camera(aspect),
            lights,
            panel: None,
        })
    }

    pub fn set_panel(&mut self, panel: impl DebugPanel + 'static) {
        self.panel = Some(Box::new(panel));
    }

    /// Edit, update, render.
    pub fn frame(&mut self, device: &mut dyn GpuDevice, dt: f32) -> Result<FrameReport> {
        if let Some(panel) = self.panel.as_mut() {
            panel.edit(&mut self.scene, dt);
        }
        self.scene.update(dt);

        let overlay = self
            .panel
            .as_deref_mut()
            .map(|panel| panel as &mut dyn DebugPanel);
        self.renderer
            .render(device, &self.scene, &self.camera, overlay)
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub fn lights(&self) -> &ShowcaseLights {
        &self.lights
    }

    /// Releases the scene's resources, then the renderer's. Returns the
    /// number of resources released.
    pub fn shutdown(self, device: &mut dyn GpuDevice) -> usize {
        let Self {
            renderer, scene, ..
        } = self;
        drop(scene);
        renderer.shutdown(device)
    }
}
