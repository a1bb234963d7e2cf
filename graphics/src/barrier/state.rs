//! Resource states and subresource addressing.

use crate::types::{BufferId, TextureId};

/// State a subresource must be in for a given kind of access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// Freshly created, no access declared yet.
    #[default]
    Common,
    /// Source of a copy.
    CopySource,
    /// Destination of a copy.
    CopyDest,
    /// Read by shaders (SRV).
    ShaderRead,
    /// Read and written by shaders (UAV).
    UnorderedAccess,
    /// Bound as a color render target (RTV).
    RenderTarget,
}

impl ResourceState {
    /// Returns true if the state allows the GPU to write the resource.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CopyDest | Self::UnorderedAccess | Self::RenderTarget
        )
    }

    /// Returns true if the state allows the GPU to read the resource.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::CopySource | Self::ShaderRead | Self::UnorderedAccess
        )
    }
}

/// One independently tracked piece of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subresource {
    /// A single mip level of a single array layer.
    Texture {
        /// Owning texture.
        texture: TextureId,
        /// Mip level.
        mip: u32,
        /// Array layer (cube face).
        layer: u32,
    },
    /// A whole buffer.
    Buffer(BufferId),
}

impl Subresource {
    /// Address one texture subresource.
    pub fn texture(texture: TextureId, mip: u32, layer: u32) -> Self {
        Self::Texture {
            texture,
            mip,
            layer,
        }
    }
}

impl std::fmt::Display for Subresource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Texture {
                texture,
                mip,
                layer,
            } => write!(f, "texture {} mip {mip} layer {layer}", texture.raw()),
            Self::Buffer(buffer) => write!(f, "buffer {}", buffer.raw()),
        }
    }
}

/// A single state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceBarrier {
    /// Transitioned subresource.
    pub subresource: Subresource,
    /// State the subresource is in before the barrier.
    pub before: ResourceState,
    /// State the subresource is in after the barrier.
    pub after: ResourceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_classification() {
        assert!(ResourceState::RenderTarget.is_write());
        assert!(!ResourceState::RenderTarget.is_read());
        assert!(ResourceState::UnorderedAccess.is_write());
        assert!(ResourceState::UnorderedAccess.is_read());
        assert!(ResourceState::ShaderRead.is_read());
        assert!(!ResourceState::ShaderRead.is_write());
        assert!(!ResourceState::Common.is_read());
    }

    #[test]
    fn test_subresource_display() {
        let sub = Subresource::texture(TextureId(3), 2, 5);
        assert_eq!(sub.to_string(), "texture 3 mip 2 layer 5");
        assert_eq!(Subresource::Buffer(BufferId(9)).to_string(), "buffer 9");
    }
}
