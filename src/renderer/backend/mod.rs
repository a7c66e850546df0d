//! Device implementations that need no GPU.
//!
//! - [`NullDevice`]: validates ids, discards output
//! - [`RecordingDevice`]: logs every command, then forwards to an inner device
//! - [`SoftwareDevice`]: CPU reference renderer with pixel readback

mod recording;
mod software;

pub use recording::{DeviceCommand, DrawRecord, NullDevice, RecordingDevice};
pub use software::SoftwareDevice;
