//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't compute anything but validates every submitted
//! command the way a debug layer would, so recorded pass sequences can be
//! checked without requiring GPU hardware. Readbacks return zeros.

use std::collections::HashMap;

use lightprobe_core::math::Rgba;

use crate::command::CommandList;
use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::pipeline::{PassId, PipelineDescriptor};
use crate::types::{BufferDescriptor, BufferId, PipelineId, TextureDescriptor, TextureId};

use super::{GpuBackend, StateValidator, check_pipeline_support};

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    capabilities: DeviceCapabilities,
    failing_pass: Option<PassId>,
    validator: StateValidator,
    buffers: HashMap<BufferId, Vec<u8>>,
    submitted_commands: usize,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report different capabilities.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Fail pipeline creation for `pass`, simulating a shader build error.
    pub fn with_failing_pass(mut self, pass: PassId) -> Self {
        self.failing_pass = Some(pass);
        self
    }

    /// Number of commands accepted so far.
    pub fn submitted_commands(&self) -> usize {
        self.submitted_commands
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_texture(
        &mut self,
        id: TextureId,
        descriptor: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        self.validator.add_texture(id, descriptor);
        Ok(())
    }

    fn create_buffer(
        &mut self,
        id: BufferId,
        descriptor: &BufferDescriptor,
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        self.validator.add_buffer(id, descriptor.size);
        self.buffers.insert(id, vec![0; descriptor.size as usize]);
        Ok(())
    }

    fn create_pipeline(
        &mut self,
        id: PipelineId,
        descriptor: &PipelineDescriptor,
    ) -> Result<(), GraphicsError> {
        if self.failing_pass == Some(descriptor.pass) {
            return Err(GraphicsError::ShaderCompilationFailed(format!(
                "'{}' failed to build",
                descriptor.pass.label()
            )));
        }
        check_pipeline_support(&self.capabilities, descriptor)?;
        log::trace!("DummyBackend: creating pipeline {:?}", descriptor.pass);
        self.validator.add_pipeline(id, descriptor);
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.validator.remove_texture(id);
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.validator.remove_buffer(id);
        self.buffers.remove(&id);
    }

    fn write_buffer(
        &mut self,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let buffer = self.buffers.get_mut(&id).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown buffer {}", id.raw()))
        })?;
        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write past the end of buffer {}",
                id.raw()
            )));
        }
        buffer[start..end].copy_from_slice(data);
        Ok(())
    }

    fn submit(&mut self, commands: &CommandList) -> Result<(), GraphicsError> {
        for command in commands.commands() {
            self.validator.validate(command)?;
            log::trace!("DummyBackend: {}", command.name());
            self.submitted_commands += 1;
        }
        Ok(())
    }

    fn read_texture(&self, id: TextureId, mip: u32) -> Result<Vec<Rgba>, GraphicsError> {
        let descriptor = self.validator.texture(id).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown texture {}", id.raw()))
        })?;
        let extent = descriptor.size.mip_level(mip);
        let texels = extent.texels_per_layer() * extent.depth as usize;
        Ok(vec![[0.0; 4]; texels])
    }

    fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, GraphicsError> {
        self.buffers.get(&id).cloned().ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown buffer {}", id.raw()))
        })
    }
}
