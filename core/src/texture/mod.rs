//! CPU-side cube textures.
//!
//! Provides [`CubeImage`] for holding six RGBA32F faces, and the cross-layout
//! loader used to read environment maps from disk.

mod cross;
mod cube_image;
mod error;

pub use cross::{CrossLayout, cube_from_cross, load_cross_cube};
pub use cube_image::CubeImage;
pub use error::TextureError;
