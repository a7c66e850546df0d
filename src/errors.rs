//! Error Types
//!
//! This module defines the error type used throughout the pipeline.
//!
//! # Overview
//!
//! [`StrataError`] covers every failure the orchestration layer can report:
//! - Configuration errors (light list capacity, out-of-range settings)
//! - GPU resource creation and lookup failures
//! - Binding errors (read/write hazards, draws without an output or program)
//! - Opaque errors forwarded from a [`GpuDevice`](crate::renderer::core::GpuDevice)
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, StrataError>`.
//!
//! ```rust,ignore
//! use strata::errors::{StrataError, Result};
//!
//! fn add_fill_light(
//!     renderer: &Renderer,
//!     device: &mut dyn GpuDevice,
//!     scene: &mut Scene,
//! ) -> Result<LightId> {
//!     renderer.add_light(device, scene, LightSource::point(Vec3::Y))
//! }
//! ```

use thiserror::Error;

use crate::renderer::core::ResourceId;

/// The main error type for the render pipeline.
///
/// Each variant carries enough context to tell which pass or resource
/// failed without consulting a GPU debugger.
#[derive(Error, Debug)]
pub enum StrataError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// More lights were added than the shader-side light array can hold.
    #[error("Light capacity exceeded: the scene holds at most {max} lights")]
    LightCapacityExceeded {
        /// Maximum number of lights a scene may hold
        max: usize,
    },

    /// A setting was given a value it cannot represent.
    #[error("Invalid setting `{name}`: {reason}")]
    InvalidSetting {
        /// Name of the offending setting
        name: &'static str,
        /// Human readable reason
        reason: String,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The device failed to create a resource.
    #[error("Failed to create {kind} `{label}`: {reason}")]
    ResourceCreation {
        /// Resource kind (render target, shadow map, program, ...)
        kind: &'static str,
        /// Debug label of the resource
        label: String,
        /// Device-provided reason
        reason: String,
    },

    /// A resource id was used after release or was never created.
    #[error("Unknown GPU resource: {0:?}")]
    UnknownResource(ResourceId),

    /// A mesh was drawn before `Mesh::upload` succeeded.
    #[error("Mesh `{0}` has not been uploaded to the GPU")]
    MeshNotUploaded(String),

    /// A scene object references a mesh key that is not in the library.
    #[error("Scene object `{0}` references a missing mesh")]
    MissingMesh(String),

    /// A scene object references a material key that is not in the scene.
    #[error("Scene object `{0}` references a missing material")]
    MissingMaterial(String),

    /// A texture name was requested before it was loaded.
    #[error("Texture not loaded: {0}")]
    MissingTexture(String),

    // ========================================================================
    // Binding Errors
    // ========================================================================
    /// A resource was bound as an input while it is the current output.
    #[error("Read/write hazard: {resource:?} is bound as output and cannot be read at slot {slot}")]
    ReadWriteHazard {
        /// The aliased resource
        resource: ResourceId,
        /// Texture slot the read was requested on
        slot: u32,
    },

    /// A draw was issued with no output bound.
    #[error("Draw issued without a bound output (pass `{0}`)")]
    NoOutputBound(String),

    /// A draw or uniform upload was issued with no program bound.
    #[error("No shader program bound (pass `{0}`)")]
    NoProgramBound(String),

    /// A uniform block did not have the byte size the technique expects.
    #[error("Uniform block at slot {slot} has {actual} bytes, expected {expected}")]
    UniformSize {
        /// Uniform slot
        slot: u32,
        /// Expected byte size
        expected: usize,
        /// Received byte size
        actual: usize,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// Opaque error reported by a device implementation.
    #[error("GPU device error: {0}")]
    Device(String),
}

/// Alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
