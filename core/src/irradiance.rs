//! Brute-force irradiance reference.
//!
//! Integrates the full cosine lobe over every source texel. Results are
//! expressed as the outgoing radiance of a white Lambertian surface (`E / π`),
//! the quantity stored in a filtered irradiance cube, so a constant
//! environment maps to itself.

use crate::cube::{CubeFace, texel_direction, texel_solid_angle};
use crate::math::{Rgba, Vec3};
use crate::texture::{CubeImage, TextureError};

struct SourceTexel {
    dir: Vec3,
    d_omega: f32,
    radiance: Rgba,
}

/// Cosine-convolve `source` into a cube of `size x size` faces.
///
/// Cost is `O(6·size² · 6·source_texels)`; callers should downsample large
/// sources first (see [`CubeImage::downsample`]).
pub fn reference_irradiance(source: &CubeImage, size: u32) -> Result<CubeImage, TextureError> {
    let (w, h) = (source.width(), source.height());
    let mut texels = Vec::with_capacity((6 * w * h) as usize);
    for face in CubeFace::ALL {
        for y in 0..h {
            for x in 0..w {
                texels.push(SourceTexel {
                    dir: texel_direction(face, x, y, w, h),
                    d_omega: texel_solid_angle(x, y, w, h),
                    radiance: source.texel(face, x, y),
                });
            }
        }
    }

    CubeImage::from_fn(size, size, |normal| {
        let mut sum = [0.0f64; 3];
        let mut weight = 0.0f64;
        for texel in &texels {
            let cos = normal.dot(&texel.dir);
            if cos <= 0.0 {
                continue;
            }
            let w = (cos * texel.d_omega) as f64;
            for c in 0..3 {
                sum[c] += texel.radiance[c] as f64 * w;
            }
            weight += w;
        }
        if weight <= 0.0 {
            return [0.0, 0.0, 0.0, 1.0];
        }
        [
            (sum[0] / weight) as f32,
            (sum[1] / weight) as f32,
            (sum[2] / weight) as f32,
            1.0,
        ]
    })
}

/// Root-mean-square color difference between two cubes of equal size.
pub fn rms_difference(a: &CubeImage, b: &CubeImage) -> Option<f32> {
    if a.width() != b.width() || a.height() != b.height() {
        return None;
    }
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for face in CubeFace::ALL {
        for (ta, tb) in a.face(face).iter().zip(b.face(face)) {
            for c in 0..3 {
                let d = (ta[c] - tb[c]) as f64;
                sum += d * d;
                count += 1;
            }
        }
    }
    Some((sum / count.max(1) as f64).sqrt() as f32)
}
