//! Common types shared across the graphics system.

// ============================================================================
// Extent3d
// ============================================================================

/// 3D extent for textures.
///
/// Cube textures use `depth` as their array layer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels, or array layers.
    pub depth: u32,
}

impl Extent3d {
    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Create a new 3D extent.
    pub fn new_3d(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Extent of mip `level`, never smaller than one texel.
    ///
    /// The depth (layer count) is not reduced.
    pub fn mip_level(&self, level: u32) -> Self {
        Self {
            width: lightprobe_core::cube::mip_extent(self.width, level),
            height: lightprobe_core::cube::mip_extent(self.height, level),
            depth: self.depth,
        }
    }

    /// Number of texels in one layer.
    pub fn texels_per_layer(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Device-unique identifier of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u64);

/// Device-unique identifier of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u64);

/// Device-unique identifier of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub(crate) u64);

macro_rules! impl_raw_id {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Raw numeric value, for logging.
                pub fn raw(self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

impl_raw_id!(TextureId, BufferId, PipelineId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_extent() {
        let extent = Extent3d::new_3d(64, 32, 6);
        assert_eq!(extent.mip_level(0), extent);
        assert_eq!(extent.mip_level(3), Extent3d::new_3d(8, 4, 6));
        assert_eq!(extent.mip_level(6), Extent3d::new_3d(1, 1, 6));
        assert_eq!(extent.mip_level(10), Extent3d::new_3d(1, 1, 6));
    }

    #[test]
    fn test_texels_per_layer() {
        assert_eq!(Extent3d::new_3d(4, 3, 6).texels_per_layer(), 12);
    }
}
