//! # Light Probe Graphics
//!
//! GPU pass recording and the light-probe filtering pipelines built on it.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Resource creation and command submission over a [`backend`]
//! - [`CommandList`] - Recorded barriers, copies, dispatches and full-screen draws
//! - [`barrier`] - Per-subresource state tracking and barrier batching
//! - [`probe`] - The [`LightProbe`] mip-pyramid and spherical-harmonics filters
//! - Two backends: Dummy (validation only) and Software (CPU execution)
//!
//! ## Example
//!
//! ```ignore
//! use lightprobe_graphics::{BackendType, GraphicsDevice, LightProbe, PipelineType};
//!
//! let device = GraphicsDevice::new(BackendType::Software);
//! let mut probe = LightProbe::init(&device, &mut cmd, &mut tables, &mut uploaders,
//!     &sources, LightProbeDescriptor::new())?;
//! probe.update_frame(time, frame);
//! probe.process(&mut cmd, frame, PipelineType::Hybrid)?;
//! device.submit(&cmd)?;
//! ```

pub mod backend;
pub mod barrier;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendType, GpuBackend, create_backend};
pub use barrier::{BarrierBatch, ResourceState, StateTracker, Subresource};
pub use command::{Command, CommandList};
pub use descriptor::{Descriptor, DescriptorTable, DescriptorTableCache};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use pipeline::{PassId, Pipeline, PipelineDescriptor, PipelineSet};
pub use probe::{LightProbe, LightProbeDescriptor, PipelineType, ShSlot};
pub use resources::{Buffer, Texture, TextureView};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, TextureDescriptor, TextureFormat, TextureUsage,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("LightProbe Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_device_creation() {
        let device = GraphicsDevice::new(BackendType::Dummy);
        assert_eq!(device.name(), "Dummy Adapter");
        assert_eq!(device.texture_count(), 0);
    }
}
