//! CPU-side cube map storage.

use crate::cube::{CubeFace, direction_to_face_uv, texel_direction};
use crate::math::{Rgba, Vec3, accumulate_rgba};

use super::TextureError;

/// Six RGBA32F faces of equal size.
///
/// Texels of each face are stored row-major with `y` growing downward, faces
/// in [`CubeFace::ALL`] order. This is the layout expected by GPU uploads of
/// a single cube mip level.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeImage {
    width: u32,
    height: u32,
    faces: [Vec<Rgba>; 6],
}

impl CubeImage {
    /// Create a cube image filled with transparent black.
    pub fn new(width: u32, height: u32) -> Result<Self, TextureError> {
        Self::uniform(width, height, [0.0; 4])
    }

    /// Create a cube image where every texel has the same value.
    pub fn uniform(width: u32, height: u32, value: Rgba) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyFace);
        }
        let texels = (width * height) as usize;
        Ok(Self {
            width,
            height,
            faces: std::array::from_fn(|_| vec![value; texels]),
        })
    }

    /// Create a cube image by evaluating `f` at every texel center direction.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(&Vec3) -> Rgba,
    ) -> Result<Self, TextureError> {
        let mut image = Self::new(width, height)?;
        for face in CubeFace::ALL {
            for y in 0..height {
                for x in 0..width {
                    let dir = texel_direction(face, x, y, width, height);
                    image.set_texel(face, x, y, f(&dir));
                }
            }
        }
        Ok(image)
    }

    /// Create a cube image from six faces of texels.
    pub fn from_faces(width: u32, height: u32, faces: [Vec<Rgba>; 6]) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyFace);
        }
        let expected = (width * height) as usize;
        if let Some(face) = faces.iter().find(|f| f.len() != expected) {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: face.len(),
            });
        }
        Ok(Self {
            width,
            height,
            faces,
        })
    }

    /// Create a cube image from a layer-major texel slice (face 0 first).
    pub fn from_layers(width: u32, height: u32, texels: &[Rgba]) -> Result<Self, TextureError> {
        let per_face = (width * height) as usize;
        if texels.len() != per_face * 6 {
            return Err(TextureError::SizeMismatch {
                expected: per_face * 6,
                actual: texels.len(),
            });
        }
        let faces = std::array::from_fn(|i| texels[i * per_face..(i + 1) * per_face].to_vec());
        Self::from_faces(width, height, faces)
    }

    /// Face width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Face height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texels of one face.
    pub fn face(&self, face: CubeFace) -> &[Rgba] {
        &self.faces[face.index()]
    }

    /// Read one texel.
    #[inline]
    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> Rgba {
        self.faces[face.index()][(y * self.width + x) as usize]
    }

    /// Write one texel.
    #[inline]
    pub fn set_texel(&mut self, face: CubeFace, x: u32, y: u32, value: Rgba) {
        let width = self.width;
        self.faces[face.index()][(y * width + x) as usize] = value;
    }

    /// All texels, face after face.
    pub fn to_layers(&self) -> Vec<Rgba> {
        self.faces.iter().flatten().copied().collect()
    }

    /// Bytes of [`to_layers`](Self::to_layers), ready for a staging buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_layers()).to_vec()
    }

    /// Bilinear sample of one face at normalized coordinates `s, t` in `[0, 1]`.
    ///
    /// Coordinates are clamped to the face, matching a clamp-to-edge sampler.
    pub fn sample_face(&self, face: CubeFace, s: f32, t: f32) -> Rgba {
        let fx = (s * self.width as f32 - 0.5).clamp(0.0, (self.width - 1) as f32);
        let fy = (t * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let mut out = [0.0; 4];
        accumulate_rgba(&mut out, self.texel(face, x0, y0), (1.0 - tx) * (1.0 - ty));
        accumulate_rgba(&mut out, self.texel(face, x1, y0), tx * (1.0 - ty));
        accumulate_rgba(&mut out, self.texel(face, x0, y1), (1.0 - tx) * ty);
        accumulate_rgba(&mut out, self.texel(face, x1, y1), tx * ty);
        out
    }

    /// Bilinear sample in direction `dir`.
    pub fn sample(&self, dir: &Vec3) -> Rgba {
        let (face, u, v) = direction_to_face_uv(dir);
        self.sample_face(face, 0.5 * (u + 1.0), 0.5 * (v + 1.0))
    }

    /// Halve each face with a 2x2 box filter.
    ///
    /// Odd extents clamp the last row or column; a 1-texel dimension stays 1.
    pub fn downsample(&self) -> CubeImage {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let faces = std::array::from_fn(|i| {
            let face = CubeFace::ALL[i];
            let mut texels = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    let xs = [(2 * x).min(self.width - 1), (2 * x + 1).min(self.width - 1)];
                    let ys = [(2 * y).min(self.height - 1), (2 * y + 1).min(self.height - 1)];
                    let mut acc = [0.0; 4];
                    for sy in ys {
                        for sx in xs {
                            accumulate_rgba(&mut acc, self.texel(face, sx, sy), 0.25);
                        }
                    }
                    texels.push(acc);
                }
            }
            texels
        });
        CubeImage {
            width,
            height,
            faces,
        }
    }

    /// Largest absolute difference of the color channels against `other`.
    ///
    /// Returns `None` when the two images have different dimensions.
    pub fn max_abs_difference(&self, other: &CubeImage) -> Option<f32> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        let diff = self
            .faces
            .iter()
            .flatten()
            .zip(other.faces.iter().flatten())
            .flat_map(|(a, b)| (0..3).map(move |c| (a[c] - b[c]).abs()))
            .fold(0.0f32, f32::max);
        Some(diff)
    }
}
