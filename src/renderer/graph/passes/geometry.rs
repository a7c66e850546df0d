//! Scene geometry drawing shared by the shadow, main and depth-of-field
//! nodes.
//!
//! Colour passes draw in rank order: static models, light markers, the
//! active prop set, terrain, then water alpha-blended over everything
//! opaque. Shadow passes draw casters only, terrain at minimum
//! tessellation, and never sample shadow maps.

use glam::Vec3;
use log::trace;
use smallvec::SmallVec;

use crate::errors::{Result, StrataError};
use crate::renderer::core::{CommandStream, TextureView};
use crate::renderer::graph::context::FrameContext;
use crate::renderer::program::{PbrParams, SceneDraw, ShaderProgram, TerrainParams, WaterParams};
use crate::resources::dof::DepthBand;
use crate::resources::material::MaterialKey;
use crate::resources::mesh::{Mesh, MeshKey};
use crate::scene::camera::Viewpoint;
use crate::scene::object::{LightMarker, SceneObject, Shading};
use crate::scene::terrain::Tessellation;

/// Which part of the scene a pass draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryFilter {
    /// Shadow casters into a depth-only output.
    ShadowCasters,
    /// Everything visible, lit and shadowed.
    Color,
}

#[derive(Clone, Copy)]
enum DrawItem<'s> {
    Object(&'s SceneObject),
    Marker(&'s LightMarker, Vec3),
}

fn draw_list<'s>(
    ctx: &FrameContext<'s>,
    filter: GeometryFilter,
) -> SmallVec<[(u8, DrawItem<'s>); 32]> {
    let scene = ctx.scene;
    let mut items: SmallVec<[(u8, DrawItem<'s>); 32]> = scene
        .objects()
        .iter()
        .filter(|object| object.prop_set.is_active(scene.alternate_props))
        .filter(|object| match filter {
            GeometryFilter::ShadowCasters => {
                object.casts_shadow && !matches!(object.shading, Shading::Water)
            }
            GeometryFilter::Color => true,
        })
        .map(|object| (object.draw_rank(), DrawItem::Object(object)))
        .collect();

    if filter == GeometryFilter::Color
        && let Some(marker) = &scene.marker
    {
        items.extend(scene.lights().iter().map(|entry| {
            (
                LightMarker::DRAW_RANK,
                DrawItem::Marker(marker, entry.light.position()),
            )
        }));
    }

    // Stable: insertion order is kept within a rank.
    items.sort_by_key(|(rank, _)| *rank);
    items
}

/// Draws the scene through `viewpoint`, discarding fragments outside
/// `depth_range`. Returns the number of draws issued.
pub fn draw_scene(
    ctx: &FrameContext<'_>,
    stream: &mut CommandStream<'_>,
    viewpoint: &Viewpoint,
    depth_range: DepthBand,
    filter: GeometryFilter,
) -> Result<u32> {
    let shadow_maps: &[TextureView] = match filter {
        GeometryFilter::ShadowCasters => &[],
        GeometryFilter::Color => ctx.shadow_views.as_slice(),
    };
    let tessellation = match filter {
        GeometryFilter::ShadowCasters => Tessellation::MINIMUM,
        GeometryFilter::Color => ctx.scene.tessellation,
    };

    let mut draws = 0;
    for (_, item) in draw_list(ctx, filter) {
        let (name, world) = match &item {
            DrawItem::Object(object) => (object.name.as_str(), object.transform.world_matrix()),
            DrawItem::Marker(marker, position) => {
                ("light_marker", marker.transform_at(*position).world_matrix())
            }
        };
        let scene_draw = SceneDraw {
            viewpoint,
            world,
            lights: &ctx.lights,
            shadow_maps,
            depth_range,
        };
        trace!("draw `{name}` in {}", stream.current_group());

        match item {
            DrawItem::Object(object) => {
                draw_object(ctx, stream, object, scene_draw, tessellation)?;
            }
            DrawItem::Marker(marker, _) => {
                draw_pbr(ctx, stream, name, marker.mesh, marker.material, scene_draw)?;
            }
        }
        draws += 1;
    }
    Ok(draws)
}

fn draw_object(
    ctx: &FrameContext<'_>,
    stream: &mut CommandStream<'_>,
    object: &SceneObject,
    scene_draw: SceneDraw<'_>,
    tessellation: Tessellation,
) -> Result<()> {
    let programs = ctx.programs;
    match object.shading {
        Shading::Pbr(material) => {
            draw_pbr(ctx, stream, &object.name, object.mesh, material, scene_draw)
        }
        Shading::Terrain {
            height_map,
            color_map,
        } => {
            let mesh = lookup_mesh(ctx, &object.name, object.mesh)?;
            programs.terrain.draw_mesh(
                stream,
                &TerrainParams {
                    scene: scene_draw,
                    height_map: &ctx.scene.height_map,
                    tessellation,
                    height_texture: height_map,
                    color_texture: color_map,
                },
                mesh,
            )
        }
        Shading::Water => {
            let mesh = lookup_mesh(ctx, &object.name, object.mesh)?;
            let waves = ctx.scene.waves.descriptors();
            stream.set_alpha_blend(true)?;
            let drawn = programs.water.draw_mesh(
                stream,
                &WaterParams {
                    scene: scene_draw,
                    waves: &waves,
                    tessellation,
                },
                mesh,
            );
            stream.set_alpha_blend(false)?;
            drawn
        }
    }
}

fn draw_pbr(
    ctx: &FrameContext<'_>,
    stream: &mut CommandStream<'_>,
    name: &str,
    mesh_key: MeshKey,
    material: MaterialKey,
    scene_draw: SceneDraw<'_>,
) -> Result<()> {
    let mesh = lookup_mesh(ctx, name, mesh_key)?;
    let material = ctx
        .scene
        .material(material)
        .ok_or_else(|| StrataError::MissingMaterial(name.to_owned()))?;
    ctx.programs.pbr.draw_mesh(
        stream,
        &PbrParams {
            scene: scene_draw,
            material,
        },
        mesh,
    )
}

fn lookup_mesh<'s>(ctx: &FrameContext<'s>, name: &str, key: MeshKey) -> Result<&'s dyn Mesh> {
    ctx.scene
        .meshes
        .get(key)
        .ok_or_else(|| StrataError::MissingMesh(name.to_owned()))
}
