//! Scene System
//!
//! What a frame renders and the tunables that shape it:
//! - [`Scene`]: lights with their shadow maps, objects, materials, meshes
//! - [`LightSource`]: light parameters and derived shadow matrices
//! - [`Camera`] / [`Viewpoint`]: the eye a pass draws through
//! - [`SceneObject`]: a placed mesh with its shading model
//! - [`WaveSet`], [`HeightMapSettings`], [`Tessellation`]: water and terrain
//! - [`preset`]: the showcase scene

pub mod camera;
pub mod light;
pub mod object;
pub mod preset;
pub mod scene;
pub mod terrain;
pub mod transform;
pub mod waves;

pub use camera::{Camera, Viewpoint};
pub use light::{Attenuation, CubeFace, LightKind, LightSource, MAX_LIGHTS, ShadowMatrices};
pub use object::{LightMarker, ObjectId, PropSet, SceneObject, Shading};
pub use scene::{LightId, Scene, SceneLight, SwingingLight};
pub use terrain::{HeightMapSettings, Tessellation};
pub use transform::Transform;
pub use waves::{WAVE_COUNT, Wave, WaveDescriptor, WaveSet};
