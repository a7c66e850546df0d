//! The showcase scene: a temple on an island, three material spheres (or a
//! sausage roll in their place), water around the shore, a sun, three
//! coloured spot lights and a swinging red point light.
//!
//! Geometry is supplied by the caller through [`ShowcaseGeometry`];
//! [`ShowcaseGeometry::placeholder`] builds stand-in boxes and planes so the
//! scene can be rendered without any model files.

use glam::{Vec3, Vec4};
use log::info;

use crate::errors::Result;
use crate::renderer::core::{Allocator, Vertex};
use crate::renderer::settings::ShadowSettings;
use crate::resources::material::{Material, TextureFlags};
use crate::resources::mesh::{MeshKey, MeshLibrary, StaticMesh};
use crate::resources::texture::{TextureHandle, TextureLibrary};
use crate::scene::camera::Camera;
use crate::scene::light::LightSource;
use crate::scene::object::{LightMarker, PropSet, SceneObject, Shading};
use crate::scene::scene::{LightId, Scene, SwingingLight};

/// Edge length of the terrain and water planes.
pub const ISLAND_SIZE: f32 = 200.0;

/// Meshes the showcase scene draws.
#[derive(Debug, Clone, Copy)]
pub struct ShowcaseGeometry {
    pub temple: MeshKey,
    pub sphere: MeshKey,
    pub sausage_roll: MeshKey,
    pub marker: MeshKey,
    /// Quad patch plane, `ISLAND_SIZE` on a side, corner at the origin.
    pub terrain: MeshKey,
    pub water: MeshKey,
}

impl ShowcaseGeometry {
    /// Boxes for models and a single quad for each plane.
    pub fn placeholder(meshes: &mut MeshLibrary) -> Self {
        Self {
            temple: meshes.insert(cuboid("temple", Vec3::new(2.0, 1.5, 2.0))),
            sphere: meshes.insert(cuboid("sphere", Vec3::ONE)),
            sausage_roll: meshes.insert(cuboid("sausage_roll", Vec3::new(0.03, 0.015, 0.015))),
            marker: meshes.insert(cuboid("light_marker", Vec3::ONE)),
            terrain: meshes.insert(patch_plane("terrain", ISLAND_SIZE)),
            water: meshes.insert(patch_plane("water", ISLAND_SIZE)),
        }
    }
}

/// Lights the showcase creates, in list order.
#[derive(Debug, Clone, Copy)]
pub struct ShowcaseLights {
    pub sun: LightId,
    pub spots: [LightId; 3],
    pub swinging: LightId,
}

/// Populates `scene` and returns its lights. Meshes in `scene.meshes` must
/// already contain `geometry`; they are uploaded here.
pub fn build_showcase(
    scene: &mut Scene,
    allocator: &mut Allocator<'_>,
    shadows: &ShadowSettings,
    geometry: &ShowcaseGeometry,
) -> Result<ShowcaseLights> {
    scene.meshes.upload_all(allocator)?;

    // === Textures ===
    let tex = &mut scene.textures;
    let bricks = [
        tex.load_texture("PBRSphereColorMap")?,
        tex.load_texture("PBRSphereNormalMap")?,
        tex.load_texture("PBRSphereAOMap")?,
        tex.load_texture("PBRSphereRoughnessMap")?,
    ];
    let metal_color = tex.load_texture("BrushedMetalColorMap")?;
    let metal_normal = tex.load_texture("BrushedMetalNormalMap")?;
    let metal_roughness = tex.load_texture("BrushedMetalRoughnessMap")?;
    let wood = [
        tex.load_texture("WoodFloorColorMap")?,
        tex.load_texture("WoodFloorNormalMap")?,
        tex.load_texture("WoodFloorAOMap")?,
        tex.load_texture("WoodFloorRoughnessMap")?,
    ];
    let roll_color = tex.load_texture("SausageRollColorMap")?;
    let roll_normal = tex.load_texture("SausageRollNormalMap")?;
    let roll_ao = tex.load_texture("SausageRollAOMap")?;
    let height_map = tex.load_texture("IslandHeightMap")?;
    let color_map = tex.load_texture("IslandTextureMap")?;

    // === Materials ===
    let temple = scene.add_material(Material::new(Vec4::new(0.98, 0.98, 0.90, 1.0)));
    let bricks = scene.add_material(fully_mapped(bricks));
    let metal = scene.add_material(
        Material::default()
            .with_anisotropy(1.0)
            .with_texture(TextureFlags::COLOR, metal_color)
            .with_texture(TextureFlags::NORMAL, metal_normal)
            .with_texture(TextureFlags::ROUGHNESS, metal_roughness),
    );
    let wood = scene.add_material(fully_mapped(wood));
    let roll = scene.add_material(
        Material::default()
            .with_smoothness(0.1)
            .with_texture(TextureFlags::COLOR, roll_color)
            .with_texture(TextureFlags::NORMAL, roll_normal)
            .with_texture(TextureFlags::AO, roll_ao),
    );

    // === Objects ===
    scene.add_object(
        SceneObject::new("temple", geometry.temple, Shading::Pbr(temple))
            .at(Vec3::new(0.0, -10.5, -5.0)),
    );
    for (name, material, z) in [
        ("metal_sphere", metal, -2.0),
        ("wood_sphere", wood, -5.0),
        ("bricks_sphere", bricks, -8.0),
    ] {
        scene.add_object(
            SceneObject::new(name, geometry.sphere, Shading::Pbr(material))
                .at(Vec3::new(0.0, -9.0, z))
                .in_prop_set(PropSet::Primary),
        );
    }
    scene.add_object(
        SceneObject::new("sausage_roll", geometry.sausage_roll, Shading::Pbr(roll))
            .at(Vec3::new(0.0, -9.0, -5.0))
            .scaled(Vec3::splat(50.0))
            .in_prop_set(PropSet::Alternate),
    );
    scene.add_object(
        SceneObject::new(
            "island",
            geometry.terrain,
            Shading::Terrain {
                height_map,
                color_map,
            },
        )
        .at(Vec3::new(-100.0, -10.5, -100.0)),
    );
    scene.add_object(
        SceneObject::new("water", geometry.water, Shading::Water)
            .at(Vec3::new(-100.0, -11.0, -100.0)),
    );
    scene.marker = Some(LightMarker::new(geometry.marker, temple));

    // === Lights ===
    let sun = scene.add_light(
        allocator,
        shadows,
        LightSource::directional(Vec3::new(1.0, -1.0, -1.0))
            .with_ambient(Vec4::new(0.1, 0.1, 0.12, 1.0))
            .with_diffuse(Vec4::new(0.8, 0.8, 0.75, 1.0))
            .with_power(0.5),
    )?;
    let spot_a = scene.add_light(
        allocator,
        shadows,
        LightSource::spot(Vec3::new(4.0, -5.0, -8.5), Vec3::new(-0.8, -1.0, 0.0), 23.0, 25.0)
            .with_ambient(Vec4::new(0.0, 0.1, 0.12, 1.0))
            .with_diffuse(Vec4::new(0.0, 0.8, 0.75, 1.0))
            .with_power(0.3),
    )?;
    let spot_b = scene.add_light(
        allocator,
        shadows,
        LightSource::spot(Vec3::new(-3.6, -5.0, -4.9), Vec3::new(0.8, -1.0, 0.0), 15.0, 25.0)
            .with_ambient(Vec4::new(0.1, 0.1, 0.0, 1.0))
            .with_diffuse(Vec4::new(0.9, 0.8, 0.0, 1.0))
            .with_power(0.3),
    )?;
    let spot_c = scene.add_light(
        allocator,
        shadows,
        LightSource::spot(Vec3::new(-0.2, -5.0, -2.1), Vec3::NEG_Y, 25.0, 30.0)
            .with_ambient(Vec4::new(0.1, 0.02, 0.12, 1.0))
            .with_diffuse(Vec4::new(0.5, 0.2, 0.75, 1.0))
            .with_power(0.3),
    )?;
    let swinging = scene.add_light(
        allocator,
        shadows,
        LightSource::point(Vec3::new(-0.2, -5.0, -2.1))
            .with_ambient(Vec4::new(0.1, 0.0, 0.0, 1.0))
            .with_diffuse(Vec4::new(0.5, 0.1, 0.1, 1.0))
            .with_power(0.3),
    )?;
    scene.swing = Some(SwingingLight {
        light: swinging,
        enabled: true,
        anchor: Vec3::new(-0.2, -5.0, -6.0),
        amplitude: 3.0,
    });

    info!(
        "Showcase scene: {} objects, {} lights",
        scene.objects().len(),
        scene.lights().len()
    );
    Ok(ShowcaseLights {
        sun,
        spots: [spot_a, spot_b, spot_c],
        swinging,
    })
}

/// Camera overlooking the temple from the shore.
#[must_use]
pub fn showcase_camera(aspect: f32) -> Camera {
    Camera::look_at(Vec3::new(0.0, -7.0, 6.0), Vec3::new(0.0, -9.5, -5.0), aspect)
}

fn fully_mapped([color, normal, ao, roughness]: [TextureHandle; 4]) -> Material {
    Material::default()
        .with_texture(TextureFlags::COLOR, color)
        .with_texture(TextureFlags::NORMAL, normal)
        .with_texture(TextureFlags::AO, ao)
        .with_texture(TextureFlags::ROUGHNESS, roughness)
}

// ─── Placeholder geometry ─────────────────────────────────────────────────────

fn vertex(position: Vec3, uv: [f32; 2], normal: Vec3) -> Vertex {
    Vertex {
        position: position.to_array(),
        uv,
        normal: normal.to_array(),
    }
}

/// Axis-aligned box centred on the origin, one quad per side.
fn cuboid(label: &str, half: Vec3) -> StaticMesh {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for normal in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
        let tangent = if normal.y.abs() > 0.5 { Vec3::X } else { Vec3::Y };
        let bitangent = normal.cross(tangent);
        let base = vertices.len() as u32;
        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = (normal + tangent * u + bitangent * v) * half;
            vertices.push(vertex(corner, [(u + 1.0) * 0.5, (v + 1.0) * 0.5], normal));
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    StaticMesh::new(label, vertices, indices)
}

/// One 4-point patch spanning `[0, size]` on X and Z.
fn patch_plane(label: &str, size: f32) -> StaticMesh {
    let corner = |x: f32, z: f32| vertex(Vec3::new(x, 0.0, z), [x / size, z / size], Vec3::Y);
    StaticMesh::new(
        label,
        vec![
            corner(0.0, 0.0),
            corner(size, 0.0),
            corner(size, size),
            corner(0.0, size),
        ],
        vec![0, 1, 2, 3],
    )
}
