//! Command Stream and Resource Ownership Tests
//!
//! Tests for:
//! - Read/write hazard detection
//! - Automatic unbinding when a read resource becomes the output or is cleared
//! - Draw preconditions (output and program bound)
//! - Raster state deduplication
//! - Release-on-drop through the release queue
//! - Mesh upload and draw

use strata::StrataError;
use strata::renderer::backend::{DeviceCommand, NullDevice, RecordingDevice};
use strata::renderer::core::{
    Allocator, CommandStream, GpuDevice, OutputBinding, RasterState, ReleaseQueue, RenderTarget,
    RenderTargetDesc, ResourceId, TextureView, Topology,
};
use strata::renderer::program::{ProgramHandle, Technique};
use strata::resources::mesh::{Mesh, StaticMesh};

// ============================================================================
// Helpers
// ============================================================================

fn target_desc(label: &str) -> RenderTargetDesc {
    RenderTargetDesc {
        label: label.to_owned(),
        width: 4,
        height: 4,
        color_format: wgpu::TextureFormat::Rgba16Float,
        depth_format: wgpu::TextureFormat::Depth32Float,
    }
}

fn two_targets(allocator: &mut Allocator<'_>) -> (RenderTarget, RenderTarget) {
    (
        allocator.render_target(target_desc("a")).unwrap(),
        allocator.render_target(target_desc("b")).unwrap(),
    )
}

// ============================================================================
// Hazards
// ============================================================================

#[test]
fn reading_the_current_output_is_a_hazard() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, _b) = two_targets(&mut allocator);
    drop(allocator);

    let mut stream = CommandStream::new(&mut device);
    stream.set_output(a.output()).unwrap();
    let err = stream.bind_texture(0, a.color_view()).unwrap_err();
    assert!(matches!(
        err,
        StrataError::ReadWriteHazard { resource, slot: 0 } if resource == ResourceId::Target(a.id())
    ));

    // The depth surface of the same target is the same resource.
    assert!(stream.bind_texture(1, a.depth_view()).is_err());
}

#[test]
fn binding_a_different_target_is_fine() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, b) = two_targets(&mut allocator);
    drop(allocator);

    let mut stream = CommandStream::new(&mut device);
    stream.set_output(a.output()).unwrap();
    stream.bind_texture(0, b.color_view()).unwrap();
    assert_eq!(stream.input(0), Some(b.color_view()));
}

#[test]
fn switching_output_unbinds_its_readers() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, b) = two_targets(&mut allocator);
    drop(allocator);

    {
        let mut stream = CommandStream::new(&mut device);
        stream.set_output(a.output()).unwrap();
        stream.bind_texture(3, b.color_view()).unwrap();
        stream.set_output(b.output()).unwrap();
        assert_eq!(stream.input(3), None, "slot reading b must be released");
    }

    let commands = device.commands();
    let unbind = commands
        .iter()
        .position(|c| *c == DeviceCommand::BindTexture { slot: 3, view: None })
        .expect("unbind recorded");
    let rebind = commands
        .iter()
        .position(|c| *c == DeviceCommand::SetOutput(b.output()))
        .expect("output switch recorded");
    assert!(unbind < rebind, "unbind must reach the device before the output switch");
}

#[test]
fn clearing_a_target_unbinds_its_readers() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, b) = two_targets(&mut allocator);
    drop(allocator);

    let mut stream = CommandStream::new(&mut device);
    stream.set_output(a.output()).unwrap();
    stream.bind_texture(0, b.color_view()).unwrap();
    stream.bind_texture(1, b.depth_view()).unwrap();
    stream.clear_target(b.id(), wgpu::Color::BLACK).unwrap();
    assert_eq!(stream.input(0), None);
    assert_eq!(stream.input(1), None);
}

#[test]
fn unbind_all_clears_every_slot() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, b) = two_targets(&mut allocator);
    drop(allocator);

    let mut stream = CommandStream::new(&mut device);
    stream.bind_texture(0, a.color_view()).unwrap();
    stream.bind_texture(5, b.color_view()).unwrap();
    stream.unbind_all_textures().unwrap();
    assert_eq!(stream.input(0), None);
    assert_eq!(stream.input(5), None);
}

// ============================================================================
// Draw Preconditions
// ============================================================================

#[test]
fn draw_without_output_fails() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let program = {
        let mut allocator = Allocator::new(&mut device, queue.handle());
        ProgramHandle::compile(&mut allocator, Technique::Texture).unwrap()
    };

    let mut stream = CommandStream::new(&mut device);
    stream.push_debug_group("bloom");
    stream.bind_program(program.id()).unwrap();
    let err = stream.draw(6, Topology::TriangleList).unwrap_err();
    assert!(matches!(err, StrataError::NoOutputBound(ref pass) if pass == "bloom"));
}

#[test]
fn draw_without_program_fails() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, _b) = two_targets(&mut allocator);
    drop(allocator);

    let mut stream = CommandStream::new(&mut device);
    stream.set_output(a.output()).unwrap();
    assert!(matches!(
        stream.draw(6, Topology::TriangleList),
        Err(StrataError::NoProgramBound(_))
    ));
    assert!(matches!(
        stream.set_uniform_block(0, &[0u32; 4]),
        Err(StrataError::NoProgramBound(_))
    ));
}

#[test]
fn unknown_output_is_rejected_by_the_device() {
    let mut device = NullDevice::new();
    let queue = ReleaseQueue::new();
    let id = {
        let mut allocator = Allocator::new(&mut device, queue.handle());
        allocator.render_target(target_desc("gone")).unwrap().id()
    };
    queue.drain(&mut device);

    let mut stream = CommandStream::new(&mut device);
    assert!(matches!(
        stream.set_output(OutputBinding::Target(id)),
        Err(StrataError::UnknownResource(ResourceId::Target(_)))
    ));
}

// ============================================================================
// Raster State
// ============================================================================

#[test]
fn raster_changes_are_deduplicated() {
    let mut device = RecordingDevice::default();
    {
        let mut stream = CommandStream::new(&mut device);
        stream.set_wireframe(false).unwrap();
        stream.set_wireframe(true).unwrap();
        stream.set_wireframe(true).unwrap();
        stream.set_alpha_blend(true).unwrap();
        assert_eq!(
            stream.raster_state(),
            RasterState {
                wireframe: true,
                alpha_blend: true
            }
        );
    }
    let changes = device
        .commands()
        .iter()
        .filter(|c| matches!(c, DeviceCommand::SetRasterState(_)))
        .count();
    assert_eq!(changes, 3);
}

#[test]
fn first_raster_change_always_reaches_the_device() {
    let mut device = RecordingDevice::default();
    {
        let mut stream = CommandStream::new(&mut device);
        stream.set_wireframe(true).unwrap();
    }
    device.take_commands();

    // A new stream cannot know what the last one left behind.
    {
        let mut stream = CommandStream::new(&mut device);
        stream.set_wireframe(false).unwrap();
        stream.set_wireframe(false).unwrap();
    }
    assert_eq!(
        device.commands(),
        &[DeviceCommand::SetRasterState(RasterState::default())]
    );
}

#[test]
fn stats_count_draws_and_clears() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, _b) = two_targets(&mut allocator);
    let program = ProgramHandle::compile(&mut allocator, Technique::Texture).unwrap();
    let mut quad = StaticMesh::fullscreen_quad();
    quad.upload(&mut allocator).unwrap();
    drop(allocator);

    let mut stream = CommandStream::new(&mut device);
    stream.clear_target(a.id(), wgpu::Color::BLACK).unwrap();
    stream.set_output(a.output()).unwrap();
    stream.bind_program(program.id()).unwrap();
    quad.draw(&mut stream, Topology::TriangleList).unwrap();
    quad.draw(&mut stream, Topology::TriangleList).unwrap();

    let stats = stream.stats();
    assert_eq!(stats.clears, 1);
    assert_eq!(stats.draws, 2);
    assert_eq!(stats.output_changes, 1);
}

// ============================================================================
// Meshes
// ============================================================================

#[test]
fn drawing_before_upload_fails() {
    let mut device = RecordingDevice::default();
    let quad = StaticMesh::fullscreen_quad();
    let mut stream = CommandStream::new(&mut device);
    assert!(matches!(
        quad.draw(&mut stream, Topology::TriangleList),
        Err(StrataError::MeshNotUploaded(_))
    ));
}

#[test]
fn fullscreen_quad_has_six_indices() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut quad = StaticMesh::fullscreen_quad();
    {
        let mut allocator = Allocator::new(&mut device, queue.handle());
        quad.upload(&mut allocator).unwrap();
    }
    assert!(quad.is_uploaded());
    assert_eq!(quad.index_count(), 6);
}

// ============================================================================
// Release Queue
// ============================================================================

#[test]
fn dropped_resources_are_released_on_drain() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, b) = two_targets(&mut allocator);
    let map = allocator
        .shadow_map(
            "light",
            strata::renderer::core::ShadowMapKind::Cube,
            64,
            wgpu::TextureFormat::Depth32Float,
        )
        .unwrap();
    drop(allocator);
    assert_eq!(device.inner().live_resources(), 3);

    drop(a);
    drop(map);
    assert_eq!(queue.pending(), 2);
    assert_eq!(device.inner().live_resources(), 3, "nothing released before drain");

    assert_eq!(queue.drain(&mut device), 2);
    assert_eq!(device.inner().live_resources(), 1);
    assert!(device.inner().is_live(ResourceId::Target(b.id())));
    assert_eq!(queue.pending(), 0);
}

#[test]
fn release_reaches_the_device_in_drop_order() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let (a, b) = two_targets(&mut allocator);
    drop(allocator);
    let (a_id, b_id) = (a.id(), b.id());

    drop(b);
    drop(a);
    device.take_commands();
    queue.drain(&mut device);
    assert_eq!(
        device.commands(),
        &[
            DeviceCommand::Release(ResourceId::Target(b_id)),
            DeviceCommand::Release(ResourceId::Target(a_id)),
        ]
    );
}

#[test]
fn devices_share_the_contract() {
    fn create(device: &mut dyn GpuDevice) -> bool {
        device.create_render_target(&target_desc("probe")).is_ok()
    }
    assert!(create(&mut NullDevice::new()));
    assert!(create(&mut RecordingDevice::default()));
    assert!(create(&mut strata::SoftwareDevice::new(4, 4)));
    let view = TextureView::Color(strata::renderer::core::TargetId(1));
    assert_eq!(view.resource(), ResourceId::Target(strata::renderer::core::TargetId(1)));
}
