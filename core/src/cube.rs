//! Cube-map geometry.
//!
//! Face orientation follows the Direct3D convention: `u` grows to the right and
//! `v` grows downward on every face, and faces are stored in the order
//! `+X, -X, +Y, -Y, +Z, -Z` (array layers 0..6).

use crate::math::Vec3;

/// Number of faces (array layers) of a cube map.
pub const CUBE_FACE_COUNT: u32 = 6;

/// One face of a cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    /// All faces in array-layer order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Face stored at the given array layer.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short name used in file names and logs.
    pub fn name(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "px",
            CubeFace::NegativeX => "nx",
            CubeFace::PositiveY => "py",
            CubeFace::NegativeY => "ny",
            CubeFace::PositiveZ => "pz",
            CubeFace::NegativeZ => "nz",
        }
    }

    /// Unnormalized direction through face coordinates `u, v` in `[-1, 1]`.
    #[inline]
    pub fn direction(self, u: f32, v: f32) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::new(1.0, -v, -u),
            CubeFace::NegativeX => Vec3::new(-1.0, -v, u),
            CubeFace::PositiveY => Vec3::new(u, 1.0, v),
            CubeFace::NegativeY => Vec3::new(u, -1.0, -v),
            CubeFace::PositiveZ => Vec3::new(u, -v, 1.0),
            CubeFace::NegativeZ => Vec3::new(-u, -v, -1.0),
        }
    }
}

/// Project a direction onto the cube.
///
/// Returns the face hit by `dir` and the face coordinates `u, v` in `[-1, 1]`.
/// A zero direction maps to the center of `+Z`.
pub fn direction_to_face_uv(dir: &Vec3) -> (CubeFace, f32, f32) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());

    if ax >= ay && ax >= az && ax > 0.0 {
        if dir.x > 0.0 {
            (CubeFace::PositiveX, -dir.z / ax, -dir.y / ax)
        } else {
            (CubeFace::NegativeX, dir.z / ax, -dir.y / ax)
        }
    } else if ay >= az && ay > 0.0 {
        if dir.y > 0.0 {
            (CubeFace::PositiveY, dir.x / ay, dir.z / ay)
        } else {
            (CubeFace::NegativeY, dir.x / ay, -dir.z / ay)
        }
    } else if az > 0.0 {
        if dir.z > 0.0 {
            (CubeFace::PositiveZ, dir.x / az, -dir.y / az)
        } else {
            (CubeFace::NegativeZ, -dir.x / az, -dir.y / az)
        }
    } else {
        (CubeFace::PositiveZ, 0.0, 0.0)
    }
}

/// Face coordinate in `[-1, 1]` of the center of texel `i` out of `size`.
#[inline]
pub fn texel_center(i: u32, size: u32) -> f32 {
    2.0 * (i as f32 + 0.5) / size as f32 - 1.0
}

/// Normalized direction through the center of texel `(x, y)` of a face.
pub fn texel_direction(face: CubeFace, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    face.direction(texel_center(x, width), texel_center(y, height))
        .normalize()
}

fn area_element(x: f32, y: f32) -> f32 {
    (x * y).atan2((x * x + y * y + 1.0).sqrt())
}

/// Solid angle subtended by texel `(x, y)` of a `width x height` face.
///
/// The six faces together sum to `4π`.
pub fn texel_solid_angle(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let x0 = 2.0 * x as f32 / width as f32 - 1.0;
    let x1 = 2.0 * (x + 1) as f32 / width as f32 - 1.0;
    let y0 = 2.0 * y as f32 / height as f32 - 1.0;
    let y1 = 2.0 * (y + 1) as f32 / height as f32 - 1.0;

    area_element(x0, y0) - area_element(x0, y1) - area_element(x1, y0) + area_element(x1, y1)
}

/// Average solid angle of one texel of a cube map with `size x size` faces.
#[inline]
pub fn mean_texel_solid_angle(size: u32) -> f32 {
    let size = size.max(1) as f32;
    4.0 * std::f32::consts::PI / (6.0 * size * size)
}

/// Number of mip levels of a full chain down to 1x1.
///
/// Equals `floor(log2(max(width, height))) + 1`, and at least 1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Extent of one dimension at mip `level`.
#[inline]
pub fn mip_extent(base: u32, level: u32) -> u32 {
    base.checked_shr(level).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1, 1)]
    #[case(2, 2, 2)]
    #[case(3, 3, 2)]
    #[case(4, 4, 3)]
    #[case(256, 256, 9)]
    #[case(256, 128, 9)]
    #[case(100, 300, 9)]
    fn test_mip_level_count(#[case] w: u32, #[case] h: u32, #[case] expected: u32) {
        assert_eq!(mip_level_count(w, h), expected);
    }

    #[test]
    fn test_mip_extent_never_zero() {
        assert_eq!(mip_extent(256, 0), 256);
        assert_eq!(mip_extent(256, 3), 32);
        assert_eq!(mip_extent(256, 8), 1);
        assert_eq!(mip_extent(256, 12), 1);
        assert_eq!(mip_extent(5, 40), 1);
    }

    #[test]
    fn test_face_uv_roundtrip() {
        for face in CubeFace::ALL {
            for &(u, v) in &[(0.0, 0.0), (0.5, -0.25), (-0.75, 0.9), (0.3, 0.3)] {
                let dir = face.direction(u, v);
                let (hit, hu, hv) = direction_to_face_uv(&dir);
                assert_eq!(hit, face);
                assert!((hu - u).abs() < 1e-5, "{face:?} u {u} -> {hu}");
                assert!((hv - v).abs() < 1e-5, "{face:?} v {v} -> {hv}");
            }
        }
    }

    #[test]
    fn test_face_centers_point_along_axes() {
        assert_eq!(CubeFace::PositiveX.direction(0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(CubeFace::NegativeY.direction(0.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(CubeFace::NegativeZ.direction(0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    #[case(32)]
    fn test_solid_angles_cover_sphere(#[case] size: u32) {
        let mut total = 0.0f64;
        for _ in 0..6 {
            for y in 0..size {
                for x in 0..size {
                    total += texel_solid_angle(x, y, size, size) as f64;
                }
            }
        }
        assert!((total - 4.0 * std::f64::consts::PI).abs() < 1e-3);
    }

    #[test]
    fn test_corner_texels_are_smaller() {
        let center = texel_solid_angle(4, 4, 8, 8);
        let corner = texel_solid_angle(0, 0, 8, 8);
        assert!(corner < center);
    }

    #[test]
    fn test_texel_direction_is_normalized() {
        let d = texel_direction(CubeFace::PositiveY, 0, 3, 4, 4);
        assert!((d.norm() - 1.0).abs() < 1e-6);
        assert!(d.y > 0.0);
    }
}
