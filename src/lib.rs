#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use app::{DebugPanel, Showcase};
pub use errors::{Result, StrataError};
pub use renderer::backend::{NullDevice, RecordingDevice, SoftwareDevice};
pub use renderer::core::{CommandStream, GpuDevice};
pub use renderer::{FrameReport, Renderer, RendererSettings, SceneBranch, ShadowSettings};
pub use resources::{BloomSettings, DofSettings, Material, StaticMesh, TextureRegistry};
pub use scene::{Camera, LightId, LightKind, LightSource, Scene, SceneObject, Shading};
