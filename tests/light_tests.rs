//! Light and Shadow Matrix Tests
//!
//! Tests for:
//! - Cube face views for point and spot lights (6 faces, direction untouched)
//! - Directional light placement and single-face projection
//! - Matrix regeneration idempotence
//! - Attenuation falloff
//! - Light list capacity and shadow map allocation
//! - Packed light directions
//! - Swinging light animation

use glam::{Mat4, Vec3, Vec4};

use strata::StrataError;
use strata::renderer::backend::RecordingDevice;
use strata::renderer::core::{Allocator, ReleaseQueue, ShadowMapKind};
use strata::renderer::program::uniforms::LightBlock;
use strata::renderer::settings::ShadowSettings;
use strata::scene::light::{
    Attenuation, CubeFace, DIRECTIONAL_DISTANCE, LightKind, LightSource, MAX_LIGHTS,
    cube_face_view,
};
use strata::scene::{Scene, SwingingLight};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

/// Camera-space forward of a right-handed view matrix, in world space.
fn view_forward(view: Mat4) -> Vec3 {
    view.inverse().transform_vector3(Vec3::NEG_Z).normalize()
}

fn view_eye(view: Mat4) -> Vec3 {
    view.inverse().transform_point3(Vec3::ZERO)
}

// ============================================================================
// Cube Faces (Point / Spot)
// ============================================================================

#[test]
fn point_light_has_six_faces() {
    let light = LightSource::point(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(light.shadow_matrices().face_count(), 6);
    assert_eq!(light.kind().face_count(), 6);
}

#[test]
fn spot_light_has_six_faces() {
    let light = LightSource::spot(Vec3::ZERO, Vec3::NEG_Y, 20.0, 25.0);
    assert_eq!(light.shadow_matrices().face_count(), 6);
}

#[test]
fn cube_faces_look_along_each_axis_in_order() {
    let position = Vec3::new(-0.2, -5.0, -2.1);
    let light = LightSource::point(position);
    let matrices = light.shadow_matrices();

    for (face, expected) in CubeFace::ALL.iter().zip(matrices.views()) {
        let forward = view_forward(*expected);
        assert!(
            vec3_approx(forward, face.direction()),
            "{face:?}: expected forward {:?}, got {forward:?}",
            face.direction()
        );
        assert!(vec3_approx(view_eye(*expected), position));
    }
}

#[test]
fn cube_face_view_is_pure() {
    let position = Vec3::new(4.0, -5.0, -8.5);
    let a = cube_face_view(position, CubeFace::NegativeY);
    let b = cube_face_view(position, CubeFace::NegativeY);
    assert_eq!(a, b);
}

#[test]
fn spot_direction_survives_matrix_generation() {
    let direction = Vec3::new(-0.8, -1.0, 0.0);
    let mut light = LightSource::spot(Vec3::new(4.0, -5.0, -8.5), direction, 23.0, 25.0);
    light.generate_shadow_matrices();
    assert_eq!(light.direction(), direction, "cube faces must not overwrite the spot direction");
}

#[test]
fn cube_projection_is_ninety_degrees_square() {
    let light = LightSource::point(Vec3::ZERO);
    let projection = light.shadow_matrices().projection();
    let expected = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 200.0);
    assert!(projection.abs_diff_eq(expected, EPSILON));
}

#[test]
fn face_viewpoint_out_of_range_is_none() {
    let light = LightSource::point(Vec3::ZERO);
    assert!(light.face_viewpoint(5).is_some());
    assert!(light.face_viewpoint(6).is_none());
}

// ============================================================================
// Directional
// ============================================================================

#[test]
fn directional_light_has_one_face() {
    let light = LightSource::directional(Vec3::new(1.0, -1.0, -1.0));
    assert_eq!(light.shadow_matrices().face_count(), 1);
}

#[test]
fn directional_light_sits_back_along_its_direction() {
    let light = LightSource::directional(Vec3::new(1.0, -1.0, -1.0));
    let unit = Vec3::new(1.0, -1.0, -1.0).normalize();

    assert!(vec3_approx(light.direction(), unit));
    assert!(vec3_approx(light.position(), -unit * DIRECTIONAL_DISTANCE));

    let view = light.shadow_matrices().view(0).unwrap();
    assert!(vec3_approx(view_eye(view), -unit * DIRECTIONAL_DISTANCE));
    assert!(vec3_approx(view_forward(view), unit));
}

#[test]
fn directional_projection_is_orthographic_200() {
    let light = LightSource::directional(Vec3::NEG_Y);
    let projection = light.shadow_matrices().projection();
    let expected = Mat4::orthographic_rh(-100.0, 100.0, -100.0, 100.0, 0.01, 200.0);
    assert!(projection.abs_diff_eq(expected, EPSILON));
}

#[test]
fn straight_down_directional_light_has_valid_view() {
    let light = LightSource::directional(Vec3::NEG_Y);
    let view = light.shadow_matrices().view(0).unwrap();
    assert!(view.is_finite(), "up vector must not be parallel to the direction");
}

#[test]
fn zero_direction_falls_back_to_down() {
    let light = LightSource::directional(Vec3::ZERO);
    assert!(vec3_approx(light.direction(), Vec3::NEG_Y));
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn regenerating_matrices_is_idempotent() {
    for mut light in [
        LightSource::directional(Vec3::new(0.3, -1.0, 0.2)),
        LightSource::point(Vec3::new(1.0, 2.0, 3.0)),
        LightSource::spot(Vec3::new(-3.6, -5.0, -4.9), Vec3::new(0.8, -1.0, 0.0), 15.0, 25.0),
    ] {
        light.generate_shadow_matrices();
        let first = light.clone();
        light.generate_shadow_matrices();
        assert_eq!(light, first, "{:?} changed on second generation", light.kind());
    }
}

#[test]
fn moving_a_light_rebuilds_its_faces() {
    let mut light = LightSource::point(Vec3::ZERO);
    light.set_position(Vec3::new(0.0, 0.0, 3.0));
    let view = light.shadow_matrices().view(0).unwrap();
    assert!(vec3_approx(view_eye(view), Vec3::new(0.0, 0.0, 3.0)));
}

// ============================================================================
// Attenuation
// ============================================================================

#[test]
fn default_attenuation_is_constant() {
    let attenuation = Attenuation::default();
    assert!(approx(attenuation.factor(0.0), 1.0));
    assert!(approx(attenuation.factor(50.0), 1.0));
}

#[test]
fn quadratic_attenuation_falls_off() {
    let attenuation = Attenuation {
        constant: 1.0,
        linear: 0.0,
        quadratic: 1.0,
    };
    assert!(approx(attenuation.factor(1.0), 0.5));
    assert!(attenuation.factor(10.0) < attenuation.factor(2.0));
}

#[test]
fn degenerate_attenuation_is_zero() {
    let attenuation = Attenuation {
        constant: 0.0,
        linear: 0.0,
        quadratic: 0.0,
    };
    assert!(approx(attenuation.factor(3.0), 0.0));
}

// ============================================================================
// Scene Light List
// ============================================================================

#[test]
fn light_list_rejects_past_capacity() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    for i in 0..MAX_LIGHTS {
        let id = scene
            .add_light(&mut allocator, &shadows, LightSource::point(Vec3::X * i as f32))
            .unwrap();
        assert_eq!(id.0, i);
    }

    let err = scene
        .add_light(&mut allocator, &shadows, LightSource::point(Vec3::ZERO))
        .unwrap_err();
    assert!(matches!(err, StrataError::LightCapacityExceeded { max } if max == MAX_LIGHTS));
    assert_eq!(scene.lights().len(), MAX_LIGHTS);
    drop(allocator);
    assert_eq!(device.inner().live_resources(), MAX_LIGHTS, "rejected light allocated nothing");
}

#[test]
fn shadow_map_layout_follows_light_kind() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    let sun = scene
        .add_light(&mut allocator, &shadows, LightSource::directional(Vec3::NEG_Y))
        .unwrap();
    let lamp = scene
        .add_light(&mut allocator, &shadows, LightSource::point(Vec3::ZERO))
        .unwrap();

    let maps: Vec<_> = scene.lights().iter().map(|entry| entry.shadow_map()).collect();
    assert_eq!(maps[sun.0].kind(), ShadowMapKind::Single);
    assert_eq!(maps[sun.0].size(), shadows.directional_size);
    assert_eq!(maps[lamp.0].kind(), ShadowMapKind::Cube);
    assert_eq!(maps[lamp.0].size(), shadows.cube_size);
}

#[test]
fn changing_kind_reallocates_shadow_map() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    let id = {
        let mut allocator = Allocator::new(&mut device, queue.handle());
        let id = scene
            .add_light(&mut allocator, &shadows, LightSource::point(Vec3::ZERO))
            .unwrap();
        let old_map = scene.lights()[id.0].shadow_map().id();

        scene
            .set_light_kind(&mut allocator, &shadows, id, LightKind::Directional)
            .unwrap();
        assert_ne!(scene.lights()[id.0].shadow_map().id(), old_map);
        assert_eq!(scene.lights()[id.0].shadow_map().kind(), ShadowMapKind::Single);
        id
    };

    assert_eq!(queue.pending(), 1, "old cube map queued for release");
    assert_eq!(queue.drain(&mut device), 1);
    assert_eq!(scene.light(id).unwrap().shadow_matrices().face_count(), 1);
}

#[test]
fn spot_to_point_keeps_cube_map() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    let id = scene
        .add_light(
            &mut allocator,
            &shadows,
            LightSource::spot(Vec3::ZERO, Vec3::NEG_Y, 20.0, 25.0),
        )
        .unwrap();
    let map = scene.lights()[id.0].shadow_map().id();
    scene
        .set_light_kind(&mut allocator, &shadows, id, LightKind::Point)
        .unwrap();
    assert_eq!(scene.lights()[id.0].shadow_map().id(), map);
    assert_eq!(queue.pending(), 0);
}

#[test]
fn light_colour_builders() {
    let light = LightSource::point(Vec3::ZERO)
        .with_ambient(Vec4::new(0.1, 0.0, 0.0, 1.0))
        .with_diffuse(Vec4::new(0.5, 0.1, 0.1, 1.0))
        .with_power(0.3);
    assert_eq!(light.ambient, Vec4::new(0.1, 0.0, 0.0, 1.0));
    assert_eq!(light.diffuse, Vec4::new(0.5, 0.1, 0.1, 1.0));
    assert!(approx(light.power, 0.3));
}

#[test]
fn packed_spot_direction_is_normalized() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    let aim = Vec3::new(-0.8, -1.0, 0.0);
    scene
        .add_light(
            &mut allocator,
            &shadows,
            LightSource::spot(Vec3::new(4.0, 5.0, 0.0), aim, 20.0, 25.0),
        )
        .unwrap();

    let block = LightBlock::from_lights(scene.lights());
    let packed = Vec4::from_array(block.lights[0].direction);
    assert!(approx(packed.truncate().length(), 1.0));
    assert!(vec3_approx(packed.truncate(), aim.normalize()));
    assert!(approx(packed.w, 0.0));
}

// ============================================================================
// Swinging Light
// ============================================================================

#[test]
fn swinging_light_follows_a_sine_along_z() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    let anchor = Vec3::new(-0.2, -5.0, -2.1);
    let id = scene
        .add_light(&mut allocator, &shadows, LightSource::point(anchor))
        .unwrap();
    scene.swing = Some(SwingingLight {
        light: id,
        enabled: true,
        anchor,
        amplitude: 3.0,
    });

    for _ in 0..10 {
        scene.update(0.25);
        let expected = anchor + Vec3::Z * (scene.time().sin() * 3.0);
        let light = scene.light(id).unwrap();
        assert!(vec3_approx(light.position(), expected), "t = {}", scene.time());

        let matrices = light.shadow_matrices();
        for (face, view) in CubeFace::ALL.iter().zip(matrices.views()) {
            assert!(vec3_approx(view_eye(*view), expected));
            assert_eq!(*view, cube_face_view(expected, *face));
        }
    }
}

#[test]
fn disabled_swing_leaves_the_light_in_place() {
    let mut device = RecordingDevice::default();
    let queue = ReleaseQueue::new();
    let mut allocator = Allocator::new(&mut device, queue.handle());
    let shadows = ShadowSettings::default();
    let mut scene = Scene::new();

    let anchor = Vec3::new(1.0, 2.0, 3.0);
    let id = scene
        .add_light(&mut allocator, &shadows, LightSource::point(anchor))
        .unwrap();
    scene.swing = Some(SwingingLight {
        light: id,
        enabled: false,
        anchor: Vec3::ZERO,
        amplitude: 3.0,
    });

    scene.update(1.0);
    assert_eq!(scene.light(id).unwrap().position(), anchor);
}
