//! Real spherical harmonics.
//!
//! Basis functions are indexed `l * (l + 1) + m` for band `l` and
//! `m` in `-l..=l`, normalized so that they are orthonormal over the sphere.
//! The Condon-Shortley phase is not applied, so the first bands read
//! `Y00 = 0.282095`, `(Y1-1, Y10, Y11) = 0.488603 * (y, z, x)`.

use std::f32::consts::PI;

use crate::cube::{CubeFace, texel_direction, texel_solid_angle};
use crate::math::Vec3;
use crate::texture::CubeImage;

/// Highest supported SH order (bands `0..6`, 36 basis functions).
pub const MAX_SH_ORDER: u32 = 6;

/// Number of basis functions of an SH expansion of `order` bands.
#[inline]
pub const fn term_count(order: u32) -> usize {
    (order * order) as usize
}

/// Flat index of basis function `(l, m)`.
#[inline]
pub const fn sh_index(l: i32, m: i32) -> usize {
    (l * (l + 1) + m) as usize
}

/// Convolution factor of the clamped cosine lobe for band `l`.
///
/// Multiplying band `l` of a radiance expansion by this factor yields the
/// irradiance expansion.
pub fn cosine_lobe_band(l: u32) -> f32 {
    match l {
        0 => PI,
        1 => 2.0 * PI / 3.0,
        2 => PI / 4.0,
        4 => -PI / 24.0,
        _ => 0.0,
    }
}

fn factorial(n: u32) -> f64 {
    (1..=n).fold(1.0f64, |acc, k| acc * k as f64)
}

fn normalization(l: u32, m: u32) -> f32 {
    let k = (2 * l + 1) as f64 / (4.0 * std::f64::consts::PI) * factorial(l - m)
        / factorial(l + m);
    k.sqrt() as f32
}

/// Evaluate the first `order²` basis functions for a unit direction.
///
/// `out` must hold at least [`term_count`]`(order)` values; extra entries are
/// left untouched.
pub fn eval_basis(order: u32, dir: &Vec3, out: &mut [f32]) {
    let order = order.min(MAX_SH_ORDER);
    let (x, y, z) = (dir.x, dir.y, dir.z);

    // (x + iy)^m gives sin^m(theta) * (cos(m phi), sin(m phi)).
    let mut cos_m = [0.0f32; MAX_SH_ORDER as usize];
    let mut sin_m = [0.0f32; MAX_SH_ORDER as usize];
    cos_m[0] = 1.0;
    for m in 1..order as usize {
        cos_m[m] = cos_m[m - 1] * x - sin_m[m - 1] * y;
        sin_m[m] = sin_m[m - 1] * x + cos_m[m - 1] * y;
    }

    for m in 0..order {
        // Associated Legendre polynomial with the sin^m factor removed.
        let mut p_mm = 1.0f32;
        for k in 1..=m {
            p_mm *= (2 * k - 1) as f32;
        }
        let mut p_prev = 0.0f32;
        let mut p_curr = p_mm;

        for l in m..order {
            if l == m + 1 {
                p_prev = p_curr;
                p_curr = z * (2 * m + 1) as f32 * p_mm;
            } else if l > m + 1 {
                let next = ((2 * l - 1) as f32 * z * p_curr - (l + m - 1) as f32 * p_prev)
                    / (l - m) as f32;
                p_prev = p_curr;
                p_curr = next;
            }

            let k = normalization(l, m);
            let (li, mi) = (l as i32, m as i32);
            if m == 0 {
                out[sh_index(li, 0)] = k * p_curr;
            } else {
                let scaled = std::f32::consts::SQRT_2 * k * p_curr;
                out[sh_index(li, mi)] = scaled * cos_m[m as usize];
                out[sh_index(li, -mi)] = scaled * sin_m[m as usize];
            }
        }
    }
}

/// RGB spherical-harmonic coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct ShCoefficients {
    order: u32,
    coefficients: Vec<[f32; 3]>,
}

impl ShCoefficients {
    /// Zero coefficients of the given order (clamped to `1..=MAX_SH_ORDER`).
    pub fn new(order: u32) -> Self {
        let order = order.clamp(1, MAX_SH_ORDER);
        Self {
            order,
            coefficients: vec![[0.0; 3]; term_count(order)],
        }
    }

    /// Build from a flat list of RGB coefficients.
    ///
    /// Extra entries are ignored and missing ones are zero.
    pub fn from_rgb(order: u32, values: &[[f32; 3]]) -> Self {
        let mut sh = Self::new(order);
        for (dst, src) in sh.coefficients.iter_mut().zip(values) {
            *dst = *src;
        }
        sh
    }

    /// Number of bands.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Coefficients in basis index order.
    pub fn coefficients(&self) -> &[[f32; 3]] {
        &self.coefficients
    }

    /// Coefficient of basis function `(l, m)`.
    pub fn get(&self, l: i32, m: i32) -> [f32; 3] {
        self.coefficients[sh_index(l, m)]
    }

    /// Reconstruct the projected function in direction `dir`.
    pub fn evaluate(&self, dir: &Vec3) -> [f32; 3] {
        self.weighted_sum(dir, |_| 1.0)
    }

    /// Irradiance arriving at a surface with normal `dir`.
    pub fn irradiance(&self, dir: &Vec3) -> [f32; 3] {
        self.weighted_sum(dir, cosine_lobe_band)
    }

    fn weighted_sum(&self, dir: &Vec3, band_weight: impl Fn(u32) -> f32) -> [f32; 3] {
        let mut basis = [0.0f32; term_count(MAX_SH_ORDER)];
        eval_basis(self.order, &dir.normalize(), &mut basis);

        let mut out = [0.0f32; 3];
        for l in 0..self.order {
            let w = band_weight(l);
            for m in -(l as i32)..=(l as i32) {
                let i = sh_index(l as i32, m);
                for c in 0..3 {
                    out[c] += w * basis[i] * self.coefficients[i][c];
                }
            }
        }
        out
    }

    /// Project a cube image on the CPU.
    ///
    /// Every texel is weighted by its solid angle and the result is rescaled by
    /// `4π / Σ dω` so that the discretized sphere integrates exactly to `4π`.
    pub fn project(image: &CubeImage, order: u32) -> Self {
        let mut sh = Self::new(order);
        let terms = term_count(sh.order);
        let mut basis = [0.0f32; term_count(MAX_SH_ORDER)];
        let mut accum = vec![[0.0f64; 3]; terms];
        let mut weight = 0.0f64;

        let (w, h) = (image.width(), image.height());
        for face in CubeFace::ALL {
            for y in 0..h {
                for x in 0..w {
                    let dir = texel_direction(face, x, y, w, h);
                    let d_omega = texel_solid_angle(x, y, w, h);
                    let radiance = image.texel(face, x, y);
                    eval_basis(sh.order, &dir, &mut basis);
                    for (k, acc) in accum.iter_mut().enumerate() {
                        for c in 0..3 {
                            acc[c] += (radiance[c] * basis[k] * d_omega) as f64;
                        }
                    }
                    weight += d_omega as f64;
                }
            }
        }

        let scale = 4.0 * std::f64::consts::PI / weight;
        for (dst, acc) in sh.coefficients.iter_mut().zip(&accum) {
            *dst = [
                (acc[0] * scale) as f32,
                (acc[1] * scale) as f32,
                (acc[2] * scale) as f32,
            ];
        }
        sh
    }
}
