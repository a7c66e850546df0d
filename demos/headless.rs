//! Headless Showcase
//!
//! Renders the showcase scene on the CPU reference device and writes the
//! back buffer to `showcase.png`.
//!
//! A scripted panel stands in for the debug UI:
//! - frames 0..4: plain scene with bloom
//! - frames 4..8: depth of field focused on the temple
//! - frames 8..: wireframe with the alternate props
//!
//! Run with `RUST_LOG=debug cargo run --example headless` to see pass
//! boundaries.

use anyhow::Context;
use log::info;
use strata::renderer::backend::SoftwareDevice;
use strata::renderer::RendererSettings;
use strata::{DebugPanel, Scene, Showcase};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;
const FRAMES: u32 = 12;

/// Flips tunables at fixed frame numbers.
struct ScriptedPanel {
    frame: u32,
}

impl DebugPanel for ScriptedPanel {
    fn edit(&mut self, scene: &mut Scene, _dt: f32) {
        match self.frame {
            0 => {
                scene.bloom.set_threshold(0.6);
                scene.bloom.set_blur_size(6);
            }
            4 => {
                scene.dof.set_enabled(true);
                scene.dof.set_focus_plane(0.99);
            }
            8 => {
                scene.dof.set_enabled(false);
                scene.wireframe = true;
                scene.alternate_props = true;
            }
            _ => {}
        }
        self.frame += 1;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = RendererSettings {
        width: WIDTH,
        height: HEIGHT,
        ..Default::default()
    };
    let mut device = SoftwareDevice::new(WIDTH, HEIGHT);
    let mut showcase = Showcase::new(&mut device, settings)?;
    showcase.set_panel(ScriptedPanel { frame: 0 });

    let dt = 1.0 / 60.0;
    for _ in 0..FRAMES {
        let report = showcase.frame(&mut device, dt)?;
        info!(
            "frame {} ({:?}): {} draws, {} clears",
            report.frame, report.branch, report.stats.draws, report.stats.clears
        );
    }

    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, device.surface_rgba8())
        .context("back buffer size mismatch")?;
    image.save("showcase.png")?;
    info!("Wrote showcase.png after {} frames", device.presented_frames());

    let released = showcase.shutdown(&mut device);
    info!("Released {released} resources, {} still live", device.live_resources());
    Ok(())
}
