//! Scene-facing resources: meshes, materials, textures and post-processing
//! settings.

pub mod bloom;
pub mod dof;
pub mod material;
pub mod mesh;
pub mod texture;

pub use bloom::BloomSettings;
pub use dof::{DOF_LAYER_COUNT, DepthBand, DepthBands, DofSettings};
pub use material::{Material, MaterialKey, MaterialTextures, TextureFlags};
pub use mesh::{Mesh, MeshKey, MeshLibrary, StaticMesh};
pub use texture::{TextureHandle, TextureLibrary, TextureRegistry};
