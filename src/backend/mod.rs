//! Device abstraction layer
//!
//! Provides the [`RenderDevice`] trait the renderer draws through, the
//! handle and descriptor types it exchanges with a device, and a
//! [`RecordingDevice`] used by tests and headless runs.

pub mod recording;
pub mod traits;
pub mod types;

pub use recording::{DeviceCommand, RecordingDevice};
pub use traits::*;
pub use types::*;
