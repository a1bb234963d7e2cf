//! Push-constant layouts shared by the recording side and the shaders.

use bytemuck::{Pod, Zeroable};

/// Constants of the cosine upsample passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CosineConstants {
    /// Average of the radiance cube's width and height.
    pub map_size: u32,
    /// Mip levels of the irradiance cube.
    pub num_levels: u32,
    /// Destination level of the pass.
    pub level: u32,
    pub _pad: u32,
}

impl CosineConstants {
    pub fn new(map_size: u32, num_levels: u32, level: u32) -> Self {
        Self {
            map_size,
            num_levels,
            level,
            _pad: 0,
        }
    }
}

/// Constants of the 2x box resample passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ResampleConstants {
    /// Destination level of the pass.
    pub level: u32,
    /// Destination width in texels.
    pub width: u32,
    /// Destination height in texels.
    pub height: u32,
    pub _pad: u32,
}

impl ResampleConstants {
    pub fn new(level: u32, width: u32, height: u32) -> Self {
        Self {
            level,
            width,
            height,
            _pad: 0,
        }
    }
}

/// Constants of the radiance cross-fade pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RadianceConstants {
    /// Weight of the second source, in `[0, 1)`.
    pub blend: f32,
    /// Index of the first source.
    pub source_index: u32,
    pub _pad: [u32; 2],
}

impl RadianceConstants {
    pub fn new(blend: f32, source_index: u32) -> Self {
        Self {
            blend,
            source_index,
            _pad: [0; 2],
        }
    }
}

/// Constants of the spherical-harmonics passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ShConstants {
    /// SH order (bands).
    pub order: u32,
    /// Face size of the projection proxy cube.
    pub proxy_size: u32,
    /// Number of input entries of a reduction pass.
    pub count: u32,
    pub _pad: u32,
}

impl ShConstants {
    pub fn new(order: u32, proxy_size: u32, count: u32) -> Self {
        Self {
            order,
            proxy_size,
            count,
            _pad: 0,
        }
    }
}

// Every block is one 16-byte constant register.
static_assertions::assert_eq_size!(CosineConstants, [u32; 4]);
static_assertions::assert_eq_size!(ResampleConstants, [u32; 4]);
static_assertions::assert_eq_size!(RadianceConstants, [u32; 4]);
static_assertions::assert_eq_size!(ShConstants, [u32; 4]);
