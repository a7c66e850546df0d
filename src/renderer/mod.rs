//! Rendering System
//!
//! [`Renderer`] orchestrates a frame:
//!
//! 1. drain GPU releases queued by dropped resources;
//! 2. **shadow**: every light's shadow map, faces in order;
//! 3. **main scene** or **depth of field**, never both;
//! 4. **bloom**: threshold, separable blur, additive composite;
//! 5. **present**: blit, UI overlay, present.
//!
//! The renderer owns the compiled programs and the offscreen targets. The
//! scene owns lights (with their shadow maps), meshes and materials. The
//! device is borrowed for each call and never stored.
//!
//! Submodules:
//! - [`core`]: device contract, command stream, owned resources
//! - [`program`]: shader programs and uniform blocks
//! - [`graph`]: render nodes and the per-frame context
//! - [`backend`]: recording and software devices

pub mod backend;
pub mod core;
pub mod graph;
pub mod kernel;
pub mod program;
pub mod settings;

pub use settings::{RendererSettings, ShadowSettings};

use log::{debug, info, warn};

use self::core::{Allocator, CommandStream, GpuDevice, ReleaseQueue, StreamStats};
use self::graph::{
    BloomNode, DepthOfFieldNode, FrameContext, FrameTargets, MainSceneNode, PresentNode,
    RenderNode, ShadowNode,
};
use self::program::ProgramSet;
use crate::app::DebugPanel;
use crate::errors::Result;
use crate::resources::mesh::{Mesh, StaticMesh};
use crate::scene::camera::Camera;
use crate::scene::light::LightSource;
use crate::scene::{LightId, Scene};

/// Which scene branch a frame took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneBranch {
    Main,
    DepthOfField,
}

/// Summary of one rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub branch: SceneBranch,
    /// Nodes that completed, in order.
    pub passes: Vec<&'static str>,
    pub stats: StreamStats,
    /// Resources released at the start of the frame.
    pub released: usize,
}

/// The frame orchestrator.
pub struct Renderer {
    settings: RendererSettings,
    programs: ProgramSet,
    targets: FrameTargets,
    fullscreen_quad: StaticMesh,
    frame: u64,
    // Declared last: owners above drop before the queue.
    release: ReleaseQueue,
}

impl Renderer {
    /// Compiles every program and allocates the frame targets.
    pub fn new(device: &mut dyn GpuDevice, settings: RendererSettings) -> Result<Self> {
        let release = ReleaseQueue::new();
        let mut allocator = Allocator::new(device, release.handle());

        let programs = ProgramSet::compile(&mut allocator)?;
        let targets = FrameTargets::allocate(&mut allocator, &settings)?;
        let mut fullscreen_quad = StaticMesh::fullscreen_quad();
        fullscreen_quad.upload(&mut allocator)?;

        info!(
            "Renderer ready: {}x{}, {:?}",
            settings.width, settings.height, settings.color_format
        );
        Ok(Self {
            settings,
            programs,
            targets,
            fullscreen_quad,
            frame: 0,
            release,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[must_use]
    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    #[must_use]
    pub fn programs(&self) -> &ProgramSet {
        &self.programs
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// An allocator whose resources release through this renderer.
    pub fn allocator<'d>(&self, device: &'d mut dyn GpuDevice) -> Allocator<'d> {
        Allocator::new(device, self.release.handle())
    }

    /// Adds a light to `scene` with a shadow map sized by the renderer's
    /// shadow settings.
    pub fn add_light(
        &self,
        device: &mut dyn GpuDevice,
        scene: &mut Scene,
        light: LightSource,
    ) -> Result<LightId> {
        let mut allocator = self.allocator(device);
        scene.add_light(&mut allocator, &self.settings.shadows, light)
    }

    /// Renders and presents one frame.
    ///
    /// Every texture slot is unbound before returning, whether the frame
    /// succeeded or not.
    pub fn render(
        &mut self,
        device: &mut dyn GpuDevice,
        scene: &Scene,
        camera: &Camera,
        overlay: Option<&mut dyn DebugPanel>,
    ) -> Result<FrameReport> {
        let released = self.release.drain(device);
        self.frame += 1;

        let branch = if scene.dof.enabled() {
            SceneBranch::DepthOfField
        } else {
            SceneBranch::Main
        };
        let scene_node: &dyn RenderNode = match branch {
            SceneBranch::Main => &MainSceneNode,
            SceneBranch::DepthOfField => &DepthOfFieldNode,
        };
        let nodes: [&dyn RenderNode; 4] = [&ShadowNode, scene_node, &BloomNode, &PresentNode];

        let overlay = overlay.map(|panel| panel as &mut dyn DebugPanel);
        let mut ctx = FrameContext::new(
            scene,
            &self.settings,
            &self.programs,
            &self.targets,
            &self.fullscreen_quad,
            camera.viewpoint(),
            overlay,
        );
        let mut stream = CommandStream::new(device);
        let mut passes = Vec::with_capacity(nodes.len());

        let mut outcome = Ok(());
        for node in nodes {
            stream.push_debug_group(node.name());
            outcome = node.run(&mut ctx, &mut stream);
            stream.pop_debug_group();
            if outcome.is_err() {
                break;
            }
            passes.push(node.name());
        }

        let unbound = stream.unbind_all_textures();
        if let Err(err) = &outcome {
            warn!("Frame {} aborted after {:?}: {err}", self.frame, passes);
        }
        outcome?;
        unbound?;

        let stats = stream.stats();
        debug!(
            "Frame {} ({branch:?}): {} draws, {} clears",
            self.frame, stats.draws, stats.clears
        );
        Ok(FrameReport {
            frame: self.frame,
            branch,
            passes,
            stats,
            released,
        })
    }

    /// Releases everything the renderer owns. Returns how many resources
    /// reached the device.
    ///
    /// Drop the scene first so its shadow maps and meshes are included.
    pub fn shutdown(self, device: &mut dyn GpuDevice) -> usize {
        let Self {
            programs,
            targets,
            fullscreen_quad,
            release,
            ..
        } = self;
        drop(programs);
        drop(targets);
        drop(fullscreen_quad);
        let released = release.drain(device);
        info!("Renderer shut down, released {released} resources");
        released
    }
}
