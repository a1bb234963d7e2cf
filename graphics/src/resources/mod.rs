//! GPU resources.
//!
//! This module contains the GPU resource types that are created by [`GraphicsDevice`]:
//! - [`Buffer`] - GPU memory buffer
//! - [`Texture`] - GPU texture, usually a mipmapped cube
//! - [`TextureView`] - mip/layer range of a texture, used in descriptor tables
//!
//! Resources are reference-counted with [`Arc`] and can be shared across threads.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`Arc`]: std::sync::Arc

mod buffer;
mod texture;

pub use buffer::Buffer;
pub use texture::{Texture, TextureView};
