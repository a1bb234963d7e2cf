//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction for GPU backends, allowing
//! the probe to record its passes once and run them on different devices.
//!
//! # Available Backends
//!
//! - `dummy`: validates resource-state discipline but computes nothing
//! - `software`: CPU reference device executing every pass kind on f32 texels
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Resource creation and destruction (buffers, textures, pipelines)
//! - Command list submission
//! - Readback of texture and buffer contents

pub mod dummy;
pub mod software;
mod validation;

pub use validation::StateValidator;

use crate::command::CommandList;
use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::pipeline::PipelineDescriptor;
use crate::types::{BufferDescriptor, BufferId, PipelineId, TextureDescriptor, TextureId};

use lightprobe_core::math::Rgba;

/// Backend selection for [`GraphicsDevice::new`](crate::GraphicsDevice::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    /// State validation only.
    #[default]
    Dummy,
    /// CPU execution.
    Software,
}

impl BackendType {
    /// Backend name, as accepted by [`BackendType::from_name`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::Software => "software",
        }
    }

    /// Parse a backend name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dummy" => Some(Self::Dummy),
            "software" | "cpu" => Some(Self::Software),
            _ => None,
        }
    }
}

/// A device implementation.
///
/// Identifiers are allocated by [`GraphicsDevice`](crate::GraphicsDevice);
/// backends only map them to their own storage.
pub trait GpuBackend: Send {
    /// Human readable backend name.
    fn name(&self) -> &'static str;

    /// Capabilities reported to the device.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Allocate storage for a texture.
    fn create_texture(
        &mut self,
        id: TextureId,
        descriptor: &TextureDescriptor,
    ) -> Result<(), GraphicsError>;

    /// Allocate storage for a buffer.
    fn create_buffer(&mut self, id: BufferId, descriptor: &BufferDescriptor)
    -> Result<(), GraphicsError>;

    /// Build a pipeline.
    ///
    /// Returns [`GraphicsError::FeatureNotSupported`] when the device cannot
    /// run the pass at all.
    fn create_pipeline(
        &mut self,
        id: PipelineId,
        descriptor: &PipelineDescriptor,
    ) -> Result<(), GraphicsError>;

    /// Release a texture.
    fn destroy_texture(&mut self, id: TextureId);

    /// Release a buffer.
    fn destroy_buffer(&mut self, id: BufferId);

    /// Write bytes into a buffer from the CPU.
    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8])
    -> Result<(), GraphicsError>;

    /// Execute a command list to completion.
    fn submit(&mut self, commands: &CommandList) -> Result<(), GraphicsError>;

    /// Read every layer of one mip level, layer after layer.
    fn read_texture(&self, id: TextureId, mip: u32) -> Result<Vec<Rgba>, GraphicsError>;

    /// Read the whole contents of a buffer.
    fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, GraphicsError>;
}

/// Create the backend for `backend_type` with default capabilities.
pub fn create_backend(backend_type: BackendType) -> Box<dyn GpuBackend> {
    match backend_type {
        BackendType::Dummy => Box::new(dummy::DummyBackend::new()),
        BackendType::Software => Box::new(software::SoftwareBackend::new()),
    }
}

/// Reject pipelines that need capabilities the device does not have.
pub(crate) fn check_pipeline_support(
    capabilities: &DeviceCapabilities,
    descriptor: &PipelineDescriptor,
) -> Result<(), GraphicsError> {
    if descriptor.kind.is_compute() && !capabilities.compute_shaders {
        return Err(GraphicsError::FeatureNotSupported(format!(
            "compute pipeline '{}' on a device without compute shaders",
            descriptor.pass.label()
        )));
    }

    if descriptor.pass.needs_typed_uav_load() {
        let supported = descriptor.format.is_some_and(|format| {
            format.supports_typed_uav_load(capabilities.typed_uav_load_additional_formats)
        });
        if !supported {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "typed UAV load of {:?} for '{}'",
                descriptor.format,
                descriptor.pass.label()
            )));
        }
    }

    Ok(())
}
