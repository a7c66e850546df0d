//! Mesh capability.
//!
//! Geometry generation happens elsewhere; the pipeline only uploads meshes
//! once and then issues indexed draws with a caller-chosen topology.
//! Meshes live in a [`MeshLibrary`] and scene objects refer to them by
//! [`MeshKey`], so one mesh can back any number of objects.

use slotmap::{SlotMap, new_key_type};

use crate::errors::{Result, StrataError};
use crate::renderer::core::{
    Allocator, CommandStream, MeshDesc, MeshId, OwnedResource, ResourceId, Topology, Vertex,
};

new_key_type! {
    /// Key of a mesh in the [`MeshLibrary`].
    pub struct MeshKey;
}

/// Upload + draw capability of a piece of geometry.
pub trait Mesh {
    fn label(&self) -> &str;

    /// Creates the GPU buffers. Calling it again re-uploads.
    fn upload(&mut self, allocator: &mut Allocator<'_>) -> Result<()>;

    fn index_count(&self) -> u32;

    /// Binds the buffers and issues one indexed draw.
    fn draw(&self, stream: &mut CommandStream<'_>, topology: Topology) -> Result<()>;
}

/// Geometry supplied as plain vertex and index arrays.
pub struct StaticMesh {
    label: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    gpu: Option<(MeshId, OwnedResource)>,
}

impl StaticMesh {
    pub fn new(label: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            vertices,
            indices,
            gpu: None,
        }
    }

    /// Two triangles covering clip space, used by every full-screen pass.
    #[must_use]
    pub fn fullscreen_quad() -> Self {
        let corner = |x: f32, y: f32| Vertex {
            position: [x, y, 0.0],
            uv: [(x + 1.0) * 0.5, (1.0 - y) * 0.5],
            normal: [0.0, 0.0, 1.0],
        };
        Self::new(
            "fullscreen_quad",
            vec![
                corner(-1.0, 1.0),
                corner(1.0, 1.0),
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
            ],
            vec![0, 1, 2, 2, 1, 3],
        )
    }

    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }
}

impl Mesh for StaticMesh {
    fn label(&self) -> &str {
        &self.label
    }

    fn upload(&mut self, allocator: &mut Allocator<'_>) -> Result<()> {
        let id = allocator.device().upload_mesh(&MeshDesc {
            label: &self.label,
            vertices: &self.vertices,
            indices: &self.indices,
        })?;
        // Replacing the old owner queues the previous buffers for release.
        self.gpu = Some((id, allocator.own(ResourceId::Mesh(id))));
        Ok(())
    }

    fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn draw(&self, stream: &mut CommandStream<'_>, topology: Topology) -> Result<()> {
        let (id, _) = self
            .gpu
            .as_ref()
            .ok_or_else(|| StrataError::MeshNotUploaded(self.label.clone()))?;
        stream.bind_mesh(*id)?;
        stream.draw(self.index_count(), topology)
    }
}

/// Shared storage for every mesh in a scene.
#[derive(Default)]
pub struct MeshLibrary {
    meshes: SlotMap<MeshKey, Box<dyn Mesh>>,
}

impl MeshLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: impl Mesh + 'static) -> MeshKey {
        self.meshes.insert(Box::new(mesh))
    }

    #[must_use]
    pub fn get(&self, key: MeshKey) -> Option<&dyn Mesh> {
        self.meshes.get(key).map(|mesh| &**mesh)
    }

    pub fn remove(&mut self, key: MeshKey) -> bool {
        self.meshes.remove(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Uploads every mesh in insertion order.
    pub fn upload_all(&mut self, allocator: &mut Allocator<'_>) -> Result<()> {
        for mesh in self.meshes.values_mut() {
            mesh.upload(allocator)?;
        }
        log::info!("Uploaded {} meshes", self.meshes.len());
        Ok(())
    }
}
