//! Frame Orchestration Tests
//!
//! Every test renders through a `RecordingDevice` and inspects the command
//! log. Tests for:
//! - Node order and the main / depth-of-field branch
//! - Shadow pass: one clear per light, faces in order, lights in order
//! - Depth of field: nine layers, each cleared before drawing, all nine composited
//! - Bloom ping-pong wiring
//! - Wireframe confined to scene geometry, alpha blend confined to water
//! - Terrain tessellation per pass
//! - Error propagation and cleanup, including raster state after an aborted frame
//! - Resource release on shutdown

use glam::Vec3;
use rustc_hash::FxHashMap;

use strata::renderer::backend::{DeviceCommand, DrawRecord, RecordingDevice};
use strata::renderer::core::{OutputBinding, TargetId, TextureView};
use strata::renderer::program::Technique;
use strata::renderer::program::uniforms::{TESSELLATION_SLOT, TessellationBlock};
use strata::renderer::{RendererSettings, SceneBranch};
use strata::resources::dof::DOF_LAYER_COUNT;
use strata::scene::Tessellation;
use strata::scene::light::{LightSource, MAX_LIGHTS};
use strata::{Renderer, Scene, Showcase, StrataError};

const DT: f32 = 1.0 / 60.0;

// ============================================================================
// Helpers
// ============================================================================

fn small_settings() -> RendererSettings {
    RendererSettings {
        width: 64,
        height: 36,
        ..Default::default()
    }
}

/// Showcase on a recording device, with setup commands discarded.
fn showcase() -> (RecordingDevice, Showcase) {
    let mut device = RecordingDevice::default();
    let showcase = Showcase::new(&mut device, small_settings()).unwrap();
    device.take_commands();
    (device, showcase)
}

fn draws_in<'a>(commands: &'a [DeviceCommand], group: &'a str) -> impl Iterator<Item = &'a DrawRecord> {
    commands.iter().filter_map(move |command| match command {
        DeviceCommand::Draw(record) if record.group.as_deref() == Some(group) => Some(record),
        _ => None,
    })
}

fn draws_to(commands: &[DeviceCommand], target: TargetId) -> usize {
    commands
        .iter()
        .filter(|command| {
            matches!(command, DeviceCommand::Draw(record) if record.output == Some(OutputBinding::Target(target)))
        })
        .count()
}

fn groups(commands: &[DeviceCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::PushDebugGroup(label) => Some(label.as_str()),
            _ => None,
        })
        .collect()
}

/// Texture slots still bound after replaying `commands`.
fn bound_slots(commands: &[DeviceCommand]) -> FxHashMap<u32, TextureView> {
    let mut slots = FxHashMap::default();
    for command in commands {
        if let DeviceCommand::BindTexture { slot, view } = command {
            match view {
                Some(view) => slots.insert(*slot, *view),
                None => slots.remove(slot),
            };
        }
    }
    slots
}

/// Tessellation blocks uploaded in each debug group, in order.
fn tessellation_uploads(commands: &[DeviceCommand]) -> Vec<(String, TessellationBlock)> {
    let mut group: Option<&str> = None;
    let mut uploads = Vec::new();
    for command in commands {
        match command {
            DeviceCommand::PushDebugGroup(label) => group = Some(label.as_str()),
            DeviceCommand::PopDebugGroup => group = None,
            DeviceCommand::SetUniformBlock { slot, data } if *slot == TESSELLATION_SLOT => {
                let block: TessellationBlock = bytemuck::pod_read_unaligned(data);
                uploads.push((group.unwrap_or_default().to_owned(), block));
            }
            _ => {}
        }
    }
    uploads
}

// ============================================================================
// Frame Structure
// ============================================================================

#[test]
fn nodes_run_in_order() {
    let (mut device, mut showcase) = showcase();
    let report = showcase.frame(&mut device, DT).unwrap();

    assert_eq!(report.branch, SceneBranch::Main);
    assert_eq!(report.passes, vec!["shadow", "main_scene", "bloom", "present"]);
    assert_eq!(
        groups(device.commands()),
        vec!["shadow", "main_scene", "bloom", "present"]
    );
}

#[test]
fn depth_of_field_replaces_main_pass() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().dof.set_enabled(true);
    let report = showcase.frame(&mut device, DT).unwrap();

    assert_eq!(report.branch, SceneBranch::DepthOfField);
    assert_eq!(report.passes, vec!["shadow", "depth_of_field", "bloom", "present"]);

    let main = showcase.renderer().targets().main().id();
    assert_eq!(draws_to(device.commands(), main), 0, "main target untouched");
}

#[test]
fn main_pass_leaves_layers_untouched() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    for layer in showcase.renderer().targets().dof_layers() {
        assert_eq!(draws_to(device.commands(), layer.id()), 0);
    }
}

#[test]
fn frame_presents_once() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();
    let presents = device
        .commands()
        .iter()
        .filter(|command| **command == DeviceCommand::Present)
        .count();
    assert_eq!(presents, 1);
}

#[test]
fn frame_counter_advances() {
    let (mut device, mut showcase) = showcase();
    for expected in 1..=3 {
        assert_eq!(showcase.frame(&mut device, DT).unwrap().frame, expected);
    }
    assert_eq!(showcase.renderer().frame_count(), 3);
}

#[test]
fn frame_ends_with_no_textures_bound() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();
    assert!(bound_slots(device.commands()).is_empty());
}

// ============================================================================
// Shadow Pass
// ============================================================================

#[derive(Debug, PartialEq)]
enum ShadowEvent {
    Clear(u32),
    Face(u32, u8),
}

#[test]
fn shadow_maps_clear_once_then_render_every_face() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let mut expected = Vec::new();
    for entry in showcase.scene().lights() {
        let map = entry.shadow_map();
        expected.push(ShadowEvent::Clear(map.id().0));
        for face in 0..map.kind().face_count() {
            expected.push(ShadowEvent::Face(map.id().0, face as u8));
        }
    }

    let actual: Vec<ShadowEvent> = device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::ClearShadowMap { map, .. } => Some(ShadowEvent::Clear(map.0)),
            DeviceCommand::SetOutput(OutputBinding::ShadowFace { map, face }) => {
                Some(ShadowEvent::Face(map.0, *face))
            }
            _ => None,
        })
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn shadow_pass_draws_casters_only() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let faces: usize = showcase
        .scene()
        .lights()
        .iter()
        .map(|entry| entry.shadow_map().kind().face_count())
        .sum();
    // Temple, three spheres and the island; never water, markers or the
    // inactive sausage roll.
    let per_face = 5;
    let shadow_draws: Vec<_> = draws_in(device.commands(), "shadow").collect();
    assert_eq!(shadow_draws.len(), faces * per_face);
    assert!(shadow_draws
        .iter()
        .all(|draw| draw.technique != Some(Technique::Water)));
}

#[test]
fn shadow_draws_never_sample_shadow_maps() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();
    for draw in draws_in(device.commands(), "shadow") {
        assert!(
            draw.inputs
                .iter()
                .all(|(_, view)| !matches!(view, TextureView::Shadow(_))),
            "{draw:?}"
        );
        assert!(!draw.raster.wireframe);
    }
}

#[test]
fn colour_draws_sample_every_shadow_map() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let maps: Vec<TextureView> = showcase
        .scene()
        .lights()
        .iter()
        .map(|entry| entry.shadow_map().view())
        .collect();
    for draw in draws_in(device.commands(), "main_scene") {
        for (i, view) in maps.iter().enumerate() {
            assert_eq!(draw.input(8 + i as u32), Some(*view));
        }
    }
}

// ============================================================================
// Main Pass
// ============================================================================

#[test]
fn shadow_pass_uses_minimum_tessellation() {
    let (mut device, mut showcase) = showcase();
    let tessellation = &mut showcase.scene_mut().tessellation;
    tessellation.set_factors(4.0, 16.0);
    tessellation.set_distances(5.0, 50.0);
    let scene_tessellation = showcase.scene().tessellation;
    assert_ne!(scene_tessellation, Tessellation::MINIMUM);
    showcase.frame(&mut device, DT).unwrap();

    let uploads = tessellation_uploads(device.commands());
    let shadow: Vec<_> = uploads.iter().filter(|(group, _)| group == "shadow").collect();
    let main: Vec<_> = uploads.iter().filter(|(group, _)| group == "main_scene").collect();
    assert!(!shadow.is_empty());
    assert!(!main.is_empty());

    for (_, block) in shadow {
        assert_eq!(block.factors, Tessellation::MINIMUM.factors().to_array());
        assert_eq!(block.distances, Tessellation::MINIMUM.distances().to_array());
    }
    for (_, block) in main {
        assert_eq!(block.factors, [4.0, 16.0]);
        assert_eq!(block.distances, [5.0, 50.0]);
    }
}

#[test]
fn main_pass_draws_in_rank_order() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let techniques: Vec<Technique> = draws_in(device.commands(), "main_scene")
        .filter_map(|draw| draw.technique)
        .collect();
    // Temple, five markers, three spheres, island, water.
    let mut expected = vec![Technique::Pbr; 9];
    expected.extend([Technique::Terrain, Technique::Water]);
    assert_eq!(techniques, expected);
}

#[test]
fn alternate_props_swap_spheres_for_the_roll() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().alternate_props = true;
    showcase.frame(&mut device, DT).unwrap();
    // Temple, five markers, roll, island, water.
    assert_eq!(draws_in(device.commands(), "main_scene").count(), 9);
}

#[test]
fn only_water_is_alpha_blended() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();
    for draw in device.draws() {
        assert_eq!(
            draw.raster.alpha_blend,
            draw.technique == Some(Technique::Water),
            "{draw:?}"
        );
    }
}

#[test]
fn wireframe_is_forced_off_before_post_processing() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().wireframe = true;
    showcase.frame(&mut device, DT).unwrap();

    let commands = device.commands();
    assert!(draws_in(commands, "main_scene").all(|draw| draw.raster.wireframe));
    assert!(draws_in(commands, "shadow").all(|draw| !draw.raster.wireframe));
    assert!(draws_in(commands, "bloom").all(|draw| !draw.raster.wireframe));
    assert!(draws_in(commands, "present").all(|draw| !draw.raster.wireframe));
}

#[test]
fn wireframe_applies_to_layers_but_not_blurs() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().wireframe = true;
    showcase.scene_mut().dof.set_enabled(true);
    showcase.frame(&mut device, DT).unwrap();

    for draw in draws_in(device.commands(), "depth_of_field") {
        let scene_geometry = matches!(
            draw.technique,
            Some(Technique::Pbr | Technique::Terrain | Technique::Water)
        );
        assert_eq!(draw.raster.wireframe, scene_geometry, "{draw:?}");
    }
}

// ============================================================================
// Depth of Field
// ============================================================================

#[test]
fn nine_layers_each_cleared_before_drawing() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().dof.set_enabled(true);
    showcase.scene_mut().dof.set_focus_plane(0.99);
    showcase.frame(&mut device, DT).unwrap();

    let commands = device.commands();
    let layers = showcase.renderer().targets().dof_layers();
    assert_eq!(layers.len(), DOF_LAYER_COUNT);

    for (i, layer) in layers.iter().enumerate() {
        let clears: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, command)| {
                matches!(command, DeviceCommand::ClearTarget { target, .. } if *target == layer.id())
            })
            .map(|(index, _)| index)
            .collect();
        assert_eq!(clears.len(), 1, "layer {i} cleared {} times", clears.len());

        let first_draw = commands
            .iter()
            .position(|command| {
                matches!(command, DeviceCommand::Draw(record) if record.output == Some(layer.output()))
            })
            .unwrap_or_else(|| panic!("layer {i} never drawn"));
        assert!(clears[0] < first_draw, "layer {i} drawn before clear");
    }
}

#[test]
fn only_the_far_layer_clears_to_background() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().dof.set_enabled(true);
    showcase.frame(&mut device, DT).unwrap();

    let background = showcase.renderer().settings().background;
    for (i, layer) in showcase.renderer().targets().dof_layers().iter().enumerate() {
        let color = device
            .commands()
            .iter()
            .find_map(|command| match command {
                DeviceCommand::ClearTarget { target, color } if *target == layer.id() => Some(*color),
                _ => None,
            })
            .unwrap();
        if i == 0 {
            assert_eq!(color, background);
        } else {
            assert_eq!(color.a, 0.0, "layer {i} must clear transparent");
        }
    }
}

#[test]
fn composite_reads_all_nine_blurred_layers() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().dof.set_enabled(true);
    showcase.scene_mut().dof.set_focus_plane(0.99);
    showcase.frame(&mut device, DT).unwrap();

    let targets = showcase.renderer().targets();
    let composites: Vec<&DrawRecord> = device
        .draws()
        .filter(|draw| draw.technique == Some(Technique::DofComposite))
        .collect();
    assert_eq!(composites.len(), 1);
    let composite = composites[0];

    assert_eq!(composite.output, Some(targets.dof_output().output()));
    for (slot, blurred) in targets.dof_blurred().iter().enumerate() {
        assert_eq!(composite.input(slot as u32), Some(blurred.color_view()));
    }
}

#[test]
fn every_layer_is_blurred_horizontally_then_vertically() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().dof.set_enabled(true);
    showcase.frame(&mut device, DT).unwrap();

    let targets = showcase.renderer().targets();
    let blurs: Vec<&DrawRecord> = device
        .draws()
        .filter(|draw| draw.technique == Some(Technique::DofBlur))
        .collect();
    assert_eq!(blurs.len(), 2 * DOF_LAYER_COUNT);

    for (i, pair) in blurs.chunks(2).enumerate() {
        let (h, v) = (pair[0], pair[1]);
        let layer = &targets.dof_layers()[i];
        assert_eq!(h.input(0), Some(layer.color_view()));
        assert_eq!(h.input(1), Some(layer.depth_view()));
        assert_eq!(h.output, Some(targets.dof_scratch().output()));
        assert_eq!(v.input(0), Some(targets.dof_scratch().color_view()));
        assert_eq!(v.output, Some(targets.dof_blurred()[i].output()));
    }
}

#[test]
fn bloom_reads_the_dof_output_when_enabled() {
    let (mut device, mut showcase) = showcase();
    showcase.scene_mut().dof.set_enabled(true);
    showcase.frame(&mut device, DT).unwrap();

    let dof_output = showcase.renderer().targets().dof_output().color_view();
    let threshold = device
        .draws()
        .find(|draw| draw.technique == Some(Technique::BloomThreshold))
        .unwrap();
    assert_eq!(threshold.input(0), Some(dof_output));
}

// ============================================================================
// Bloom & Present
// ============================================================================

#[test]
fn bloom_ping_pongs_between_two_targets() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let targets = showcase.renderer().targets();
    let (main, a, b) = (targets.main(), targets.bloom_a(), targets.bloom_b());
    let bloom: Vec<&DrawRecord> = draws_in(device.commands(), "bloom").collect();
    assert_eq!(bloom.len(), 4);

    let wiring: Vec<(Option<Technique>, Option<TextureView>, Option<OutputBinding>)> = bloom
        .iter()
        .map(|draw| (draw.technique, draw.input(0), draw.output))
        .collect();
    assert_eq!(
        wiring,
        vec![
            (Some(Technique::BloomThreshold), Some(main.color_view()), Some(a.output())),
            (Some(Technique::BloomBlur), Some(a.color_view()), Some(b.output())),
            (Some(Technique::BloomBlur), Some(b.color_view()), Some(a.output())),
            (Some(Technique::BloomComposite), Some(main.color_view()), Some(b.output())),
        ]
    );
    assert_eq!(bloom[3].input(1), Some(a.color_view()));
}

#[test]
fn present_blits_the_bloom_result_to_the_surface() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let present: Vec<&DrawRecord> = draws_in(device.commands(), "present").collect();
    assert_eq!(present.len(), 1);
    assert_eq!(present[0].technique, Some(Technique::Texture));
    assert_eq!(present[0].output, Some(OutputBinding::Surface));
    assert_eq!(
        present[0].input(0),
        Some(showcase.renderer().targets().bloom_b().color_view())
    );
}

// ============================================================================
// Debug Panel
// ============================================================================

struct CountingPanel {
    edits: std::rc::Rc<std::cell::Cell<u32>>,
    overlays: std::rc::Rc<std::cell::Cell<u32>>,
}

impl strata::DebugPanel for CountingPanel {
    fn edit(&mut self, scene: &mut Scene, _dt: f32) {
        self.edits.set(self.edits.get() + 1);
        scene.bloom.set_threshold(0.25);
    }

    fn overlay(&mut self, stream: &mut strata::CommandStream<'_>) -> strata::Result<()> {
        assert_eq!(stream.output(), Some(OutputBinding::Surface));
        self.overlays.set(self.overlays.get() + 1);
        Ok(())
    }
}

#[test]
fn panel_edits_before_render_and_overlays_during_present() {
    let (mut device, mut showcase) = showcase();
    let edits = std::rc::Rc::new(std::cell::Cell::new(0));
    let overlays = std::rc::Rc::new(std::cell::Cell::new(0));
    showcase.set_panel(CountingPanel {
        edits: edits.clone(),
        overlays: overlays.clone(),
    });

    showcase.frame(&mut device, DT).unwrap();
    showcase.frame(&mut device, DT).unwrap();
    assert_eq!(edits.get(), 2);
    assert_eq!(overlays.get(), 2);
    assert!((showcase.scene().bloom.threshold() - 0.25).abs() < 1e-6);
}

// ============================================================================
// Errors & Resources
// ============================================================================

#[test]
fn missing_mesh_aborts_the_frame_and_unbinds() {
    let (mut device, mut showcase) = showcase();
    let temple_mesh = showcase.scene().objects()[0].mesh;
    assert!(showcase.scene_mut().meshes.remove(temple_mesh));

    let err = showcase.frame(&mut device, DT).unwrap_err();
    assert!(matches!(err, StrataError::MissingMesh(ref name) if name == "temple"));
    assert!(bound_slots(device.commands()).is_empty());
    assert!(!device.commands().contains(&DeviceCommand::Present));
}

#[test]
fn aborted_frame_does_not_leak_wireframe() {
    let (mut device, mut showcase) = showcase();
    let marker_mesh = showcase.scene().marker.as_ref().unwrap().mesh;
    showcase.scene_mut().wireframe = true;
    assert!(showcase.scene_mut().meshes.remove(marker_mesh));

    let err = showcase.frame(&mut device, DT).unwrap_err();
    assert!(matches!(err, StrataError::MissingMesh(ref name) if name == "light_marker"));
    device.take_commands();

    showcase.scene_mut().wireframe = false;
    showcase.scene_mut().marker = None;
    showcase.frame(&mut device, DT).unwrap();

    let wireframe = device
        .draws()
        .filter(|draw| draw.raster.wireframe)
        .count();
    assert_eq!(wireframe, 0, "wireframe carried over from the aborted frame");
}

#[test]
fn light_capacity_is_enforced_through_the_renderer() {
    let mut device = RecordingDevice::default();
    let renderer = Renderer::new(&mut device, small_settings()).unwrap();
    let mut scene = Scene::new();

    for _ in 0..MAX_LIGHTS {
        renderer
            .add_light(&mut device, &mut scene, LightSource::point(Vec3::ZERO))
            .unwrap();
    }
    assert!(matches!(
        renderer.add_light(&mut device, &mut scene, LightSource::directional(Vec3::NEG_Y)),
        Err(StrataError::LightCapacityExceeded { .. })
    ));
}

#[test]
fn empty_scene_still_renders_every_pass() {
    let mut device = RecordingDevice::default();
    let mut renderer = Renderer::new(&mut device, small_settings()).unwrap();
    let scene = Scene::new();
    let camera = strata::Camera::look_at(Vec3::Z, Vec3::ZERO, 16.0 / 9.0);

    let report = renderer.render(&mut device, &scene, &camera, None).unwrap();
    assert_eq!(report.passes, vec!["shadow", "main_scene", "bloom", "present"]);
    assert_eq!(report.stats.draws, 5, "four bloom draws and the blit");
}

#[test]
fn replaced_shadow_maps_release_on_next_frame() {
    let (mut device, mut showcase) = showcase();
    let sun = showcase.lights().sun;
    let shadows = showcase.renderer().settings().shadows;
    {
        let mut allocator = showcase.renderer().allocator(&mut device);
        showcase
            .scene_mut()
            .set_light_kind(&mut allocator, &shadows, sun, strata::LightKind::Point)
            .unwrap();
    }
    let report = showcase.frame(&mut device, DT).unwrap();
    assert_eq!(report.released, 1);
}

#[test]
fn shutdown_releases_every_resource() {
    let (mut device, mut showcase) = showcase();
    showcase.frame(&mut device, DT).unwrap();

    let live = device.inner().live_resources();
    assert!(live > 0);
    let released = showcase.shutdown(&mut device);
    assert_eq!(released, live);
    assert_eq!(device.inner().live_resources(), 0);
}
