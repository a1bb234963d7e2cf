//! GPU texture resource.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::types::{Extent3d, TextureDescriptor, TextureFormat, TextureId, TextureUsage};

/// A GPU texture resource.
///
/// Textures are created by [`GraphicsDevice::create_texture`] and are reference-counted.
/// They hold a strong reference to their parent device, keeping it alive, and
/// release their backend storage when the last reference is dropped.
///
/// # Example
///
/// ```ignore
/// let cube = device.create_texture(&TextureDescriptor::new_cube(
///     256, 256,
///     TextureFormat::Rg11b10Float,
///     TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
/// ).with_mip_levels(9))?;
/// let level_two = cube.mip_view(2);
/// ```
pub struct Texture {
    id: TextureId,
    device: Arc<GraphicsDevice>,
    descriptor: TextureDescriptor,
}

impl Texture {
    /// Create a new texture (called by GraphicsDevice).
    pub(crate) fn new(
        id: TextureId,
        device: Arc<GraphicsDevice>,
        descriptor: TextureDescriptor,
    ) -> Self {
        Self {
            id,
            device,
            descriptor,
        }
    }

    /// Get the device-unique identifier.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the texture size.
    pub fn size(&self) -> Extent3d {
        self.descriptor.size
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.size.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.size.height
    }

    /// Get the number of array layers.
    pub fn array_layers(&self) -> u32 {
        self.descriptor.size.depth
    }

    /// Get the texture format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Get the usage flags.
    pub fn usage(&self) -> TextureUsage {
        self.descriptor.usage
    }

    /// Get the mip level count.
    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    /// Get the extent of a mip level.
    pub fn mip_size(&self, level: u32) -> Extent3d {
        self.descriptor.size.mip_level(level)
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// View of a single mip level across all layers.
    pub fn mip_view(&self, level: u32) -> TextureView {
        TextureView {
            texture: self.id,
            base_mip: level,
            mip_count: 1,
            base_layer: 0,
            layer_count: self.array_layers(),
        }
    }

    /// View of every mip level and layer.
    pub fn full_view(&self) -> TextureView {
        TextureView {
            texture: self.id,
            base_mip: 0,
            mip_count: self.mip_level_count(),
            base_layer: 0,
            layer_count: self.array_layers(),
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.device.release_texture(self.id);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("size", &self.descriptor.size)
            .field("mips", &self.descriptor.mip_level_count)
            .field("format", &self.descriptor.format)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);

/// A range of mip levels and array layers of one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureView {
    /// Texture the view refers to.
    pub texture: TextureId,
    /// First mip level.
    pub base_mip: u32,
    /// Number of mip levels.
    pub mip_count: u32,
    /// First array layer.
    pub base_layer: u32,
    /// Number of array layers.
    pub layer_count: u32,
}

impl TextureView {
    /// Every `(mip, layer)` pair covered by the view.
    pub fn subresources(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.base_mip..self.base_mip + self.mip_count).flat_map(move |mip| {
            (self.base_layer..self.base_layer + self.layer_count).map(move |layer| (mip, layer))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendType;

    fn create_test_texture() -> Arc<Texture> {
        let device = GraphicsDevice::new(BackendType::Dummy);
        device
            .create_texture(
                &TextureDescriptor::new_cube(
                    16,
                    8,
                    TextureFormat::Rgba16Float,
                    TextureUsage::TEXTURE_BINDING,
                )
                .with_mip_levels(5)
                .with_label("cube"),
            )
            .unwrap()
    }

    #[test]
    fn test_texture_debug() {
        let texture = create_test_texture();
        let debug = format!("{:?}", texture);
        assert!(debug.contains("Texture"));
        assert!(debug.contains("cube"));
    }

    #[test]
    fn test_texture_dimensions() {
        let texture = create_test_texture();
        assert_eq!(texture.width(), 16);
        assert_eq!(texture.height(), 8);
        assert_eq!(texture.array_layers(), 6);
        assert_eq!(texture.mip_size(3), Extent3d::new_3d(2, 1, 6));
    }

    #[test]
    fn test_views() {
        let texture = create_test_texture();
        let mip = texture.mip_view(2);
        assert_eq!(mip.subresources().count(), 6);
        assert!(mip.subresources().all(|(m, _)| m == 2));

        let full = texture.full_view();
        assert_eq!(full.subresources().count(), 5 * 6);
    }

    #[test]
    fn test_texture_release() {
        let texture = create_test_texture();
        let device = Arc::clone(texture.device());
        assert_eq!(device.texture_count(), 1);
        drop(texture);
        assert_eq!(device.texture_count(), 0);
    }
}
