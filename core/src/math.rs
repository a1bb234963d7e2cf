//! Math type aliases and helper functions.
//!
//! Directions are nalgebra vectors; texel colors are plain `[f32; 4]` arrays so
//! they can be handed to GPU uploads through `bytemuck` without conversion.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// Linear RGBA texel value.
pub type Rgba = [f32; 4];

/// Component-wise linear interpolation between two texels.
#[inline]
pub fn lerp_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Scale the color channels of a texel, leaving alpha untouched.
#[inline]
pub fn scale_rgb(c: Rgba, s: f32) -> Rgba {
    [c[0] * s, c[1] * s, c[2] * s, c[3]]
}

/// Accumulate `c * w` into `acc` (all four channels).
#[inline]
pub fn accumulate_rgba(acc: &mut Rgba, c: Rgba, w: f32) {
    acc[0] += c[0] * w;
    acc[1] += c[1] * w;
    acc[2] += c[2] * w;
    acc[3] += c[3] * w;
}

/// Rec. 709 luminance of a linear color.
#[inline]
pub fn luminance(c: Rgba) -> f32 {
    0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2]
}
