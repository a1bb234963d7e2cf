//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources and
//! submitting recorded work. It owns one [`GpuBackend`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use lightprobe_core::math::Rgba;
use parking_lot::{Mutex, RwLock};

use crate::backend::{BackendType, GpuBackend, create_backend};
use crate::command::CommandList;
use crate::error::GraphicsError;
use crate::pipeline::{Pipeline, PipelineDescriptor};
use crate::resources::{Buffer, Texture};
use crate::types::{BufferDescriptor, BufferId, PipelineId, TextureDescriptor, TextureId};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture dimension.
    pub max_texture_dimension: u32,
    /// Maximum buffer size.
    pub max_buffer_size: u64,
    /// Whether compute shaders are supported.
    pub compute_shaders: bool,
    /// Whether multi-channel formats support typed UAV loads.
    pub typed_uav_load_additional_formats: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_buffer_size: 1 << 30, // 1 GB
            compute_shaders: true,
            typed_uav_load_additional_formats: true,
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// The backend sits behind a mutex; submission is synchronous.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::new(BackendType::Software);
///
/// let staging = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::COPY_SRC))?;
/// let cube = device.create_texture(&TextureDescriptor::new_cube(
///     64, 64,
///     TextureFormat::Rg11b10Float,
///     TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
/// ))?;
/// device.submit(&cmd)?;
/// ```
pub struct GraphicsDevice {
    name: String,
    capabilities: DeviceCapabilities,
    backend: Mutex<Box<dyn GpuBackend>>,
    next_id: AtomicU64,
    // Track allocated resources (weak references for counting/debugging)
    buffers: RwLock<Vec<Weak<Buffer>>>,
    textures: RwLock<Vec<Weak<Texture>>>,
}

impl GraphicsDevice {
    /// Create a device on a backend with default capabilities.
    pub fn new(backend_type: BackendType) -> Arc<Self> {
        Self::from_backend(create_backend(backend_type))
    }

    /// Create a device on an already configured backend.
    pub fn from_backend(backend: Box<dyn GpuBackend>) -> Arc<Self> {
        let name = format!("{} Adapter", backend.name());
        let capabilities = backend.capabilities();
        log::debug!("GraphicsDevice: created '{name}' with {capabilities:?}");
        Arc::new(Self {
            name,
            capabilities,
            backend: Mutex::new(backend),
            next_id: AtomicU64::new(1),
            buffers: RwLock::new(Vec::new()),
            textures: RwLock::new(Vec::new()),
        })
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size exceeds device limits or allocation fails.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        // Validate
        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        if descriptor.size % 4 != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} is not a multiple of 4",
                descriptor.size
            )));
        }

        let id = BufferId(self.allocate_id());
        self.backend.lock().create_buffer(id, descriptor)?;

        let buffer = Arc::new(Buffer::new(id, Arc::clone(self), descriptor.clone()));
        self.buffers.write().push(Arc::downgrade(&buffer));

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture dimensions exceed device limits, the mip
    /// chain is longer than the full chain, or allocation fails.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        // Validate
        let max_dim = self.capabilities.max_texture_dimension;
        if descriptor.size.width > max_dim
            || descriptor.size.height > max_dim
            || descriptor.size.depth > max_dim
        {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }

        if descriptor.size.width == 0 || descriptor.size.height == 0 || descriptor.size.depth == 0
        {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let full_chain =
            lightprobe_core::cube::mip_level_count(descriptor.size.width, descriptor.size.height);
        if descriptor.mip_level_count == 0 || descriptor.mip_level_count > full_chain {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level count {} outside 1..={full_chain}",
                descriptor.mip_level_count
            )));
        }

        let id = TextureId(self.allocate_id());
        self.backend.lock().create_texture(id, descriptor)?;

        let texture = Arc::new(Texture::new(id, Arc::clone(self), descriptor.clone()));
        self.textures.write().push(Arc::downgrade(&texture));

        log::trace!(
            "GraphicsDevice: created texture {:?}, size={}x{}x{}, mips={}",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth,
            descriptor.mip_level_count
        );

        Ok(texture)
    }

    /// Create a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::FeatureNotSupported`] if the device cannot run
    /// the pass, or any other backend error if the build fails.
    pub fn create_pipeline(
        &self,
        descriptor: &PipelineDescriptor,
    ) -> Result<Arc<Pipeline>, GraphicsError> {
        let id = PipelineId(self.allocate_id());
        self.backend.lock().create_pipeline(id, descriptor)?;

        log::trace!(
            "GraphicsDevice: created pipeline {:?} for {:?}",
            descriptor.label,
            descriptor.pass
        );

        Ok(Arc::new(Pipeline::new(id, descriptor.clone())))
    }

    /// Write bytes into a buffer from the CPU.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the write does not fit.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let end = offset.checked_add(data.len() as u64);
        if end.is_none_or(|end| end > buffer.size()) {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at {offset} overflows buffer of {} bytes",
                data.len(),
                buffer.size()
            )));
        }
        self.backend.lock().write_buffer(buffer.id(), offset, data)
    }

    /// Execute a recorded command list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ResourceState`] when a command violates state
    /// discipline; commands before the failing one have already executed.
    pub fn submit(&self, commands: &CommandList) -> Result<(), GraphicsError> {
        lightprobe_core::profile_scope!("GraphicsDevice::submit");
        log::trace!(
            "GraphicsDevice: submitting '{}' ({} commands)",
            commands.label(),
            commands.len()
        );
        self.backend.lock().submit(commands)
    }

    /// Read every layer of one mip level of a texture, layer after layer.
    pub fn read_texture(&self, texture: &Texture, mip: u32) -> Result<Vec<Rgba>, GraphicsError> {
        if mip >= texture.mip_level_count() {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip {mip} out of range for texture with {} levels",
                texture.mip_level_count()
            )));
        }
        self.backend.lock().read_texture(texture.id(), mip)
    }

    /// Read the contents of a buffer.
    pub fn read_buffer(&self, buffer: &Buffer) -> Result<Vec<u8>, GraphicsError> {
        self.backend.lock().read_buffer(buffer.id())
    }

    pub(crate) fn release_texture(&self, id: TextureId) {
        self.backend.lock().destroy_texture(id);
        self.textures.write().retain(|w| w.strong_count() > 0);
    }

    pub(crate) fn release_buffer(&self, id: BufferId) {
        self.backend.lock().destroy_buffer(id);
        self.buffers.write().retain(|w| w.strong_count() > 0);
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PassId;
    use crate::types::{BufferUsage, TextureFormat, TextureUsage};

    fn create_test_device() -> Arc<GraphicsDevice> {
        GraphicsDevice::new(BackendType::Dummy)
    }

    #[test]
    fn test_device_name() {
        let device = create_test_device();
        assert_eq!(device.name(), "Dummy Adapter");
    }

    #[test]
    fn test_create_buffer() {
        let device = create_test_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE))
            .unwrap();
        assert_eq!(buffer.size(), 1024);
        assert_eq!(device.buffer_count(), 1);
    }

    #[test]
    fn test_create_buffer_invalid_size() {
        let device = create_test_device();
        assert!(
            device
                .create_buffer(&BufferDescriptor::new(0, BufferUsage::STORAGE))
                .is_err()
        );
        assert!(
            device
                .create_buffer(&BufferDescriptor::new(6, BufferUsage::STORAGE))
                .is_err()
        );
    }

    #[test]
    fn test_create_texture() {
        let device = create_test_device();
        let texture = device
            .create_texture(
                &TextureDescriptor::new_cube(
                    512,
                    512,
                    TextureFormat::Rg11b10Float,
                    TextureUsage::TEXTURE_BINDING,
                )
                .with_mip_levels(10),
            )
            .unwrap();
        assert_eq!(texture.width(), 512);
        assert_eq!(texture.mip_level_count(), 10);
        assert_eq!(device.texture_count(), 1);
    }

    #[test]
    fn test_create_texture_invalid() {
        let device = create_test_device();
        let zero = device.create_texture(&TextureDescriptor::new_2d(
            0,
            512,
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING,
        ));
        assert!(zero.is_err());

        let too_many_mips = device.create_texture(
            &TextureDescriptor::new_cube(
                4,
                4,
                TextureFormat::Rgba16Float,
                TextureUsage::TEXTURE_BINDING,
            )
            .with_mip_levels(4),
        );
        assert!(too_many_mips.is_err());
    }

    #[test]
    fn test_write_buffer_bounds() {
        let device = create_test_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(16, BufferUsage::COPY_SRC))
            .unwrap();
        assert!(device.write_buffer(&buffer, 0, &[0u8; 16]).is_ok());
        assert!(device.write_buffer(&buffer, 4, &[0u8; 16]).is_err());
    }

    #[test]
    fn test_create_pipeline_ids_are_unique() {
        let device = create_test_device();
        let a = device
            .create_pipeline(&PipelineDescriptor::new(PassId::Resample))
            .unwrap();
        let b = device
            .create_pipeline(&PipelineDescriptor::new(PassId::ShSum))
            .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.pass(), PassId::ShSum);
    }

    #[test]
    fn test_resource_cleanup() {
        let device = create_test_device();
        {
            let _buffer = device
                .create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE))
                .unwrap();
            assert_eq!(device.buffer_count(), 1);
        }
        // Buffer dropped
        assert_eq!(device.buffer_count(), 0);
    }
}
