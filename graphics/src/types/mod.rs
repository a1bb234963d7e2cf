//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, usage flags, handles and descriptor
//! structs used throughout the graphics system.

mod buffer;
mod common;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::{BufferId, Extent3d, PipelineId, TextureId};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
