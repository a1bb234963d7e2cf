//! # Light Probe Core
//!
//! CPU-side building blocks for light-probe filtering:
//!
//! - [`cube`] - cube-map face geometry, texel solid angles and mip chains
//! - [`texture`] - [`CubeImage`](texture::CubeImage) storage and cross-layout loading
//! - [`sh`] - real spherical harmonics and CPU projection
//! - [`irradiance`] - brute-force cosine convolution used as ground truth
//! - [`profiling`] - optional Tracy instrumentation

pub mod cube;
pub mod irradiance;
pub mod math;
pub mod profiling;
pub mod sh;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
