//! Cube cross image loading.
//!
//! Two layouts are recognized from the image aspect ratio:
//!
//! ```text
//!  horizontal (4x3)        vertical (3x4)
//!     . +Y .  .              . +Y .
//!    -X +Z +X -Z            -X +Z +X
//!     . -Y .  .              . -Y .
//!                            . -Z .   (rotated 180 degrees)
//! ```

use std::path::Path;

use image::Rgba32FImage;

use crate::cube::CubeFace;
use crate::math::Rgba;

use super::{CubeImage, TextureError};

/// Arrangement of the six faces inside a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossLayout {
    /// Four faces wide, three faces tall.
    Horizontal,
    /// Three faces wide, four faces tall.
    Vertical,
}

impl CrossLayout {
    /// Detect the layout and face size from image dimensions.
    pub fn detect(width: u32, height: u32) -> Option<(Self, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        if width % 4 == 0 && height % 3 == 0 && width / 4 == height / 3 {
            Some((CrossLayout::Horizontal, width / 4))
        } else if width % 3 == 0 && height % 4 == 0 && width / 3 == height / 4 {
            Some((CrossLayout::Vertical, width / 3))
        } else {
            None
        }
    }

    /// Cell `(column, row)` holding `face`, and whether the face is stored rotated.
    fn cell(self, face: CubeFace) -> (u32, u32, bool) {
        match (self, face) {
            (_, CubeFace::PositiveY) => (1, 0, false),
            (_, CubeFace::NegativeX) => (0, 1, false),
            (_, CubeFace::PositiveZ) => (1, 1, false),
            (_, CubeFace::PositiveX) => (2, 1, false),
            (_, CubeFace::NegativeY) => (1, 2, false),
            (CrossLayout::Horizontal, CubeFace::NegativeZ) => (3, 1, false),
            (CrossLayout::Vertical, CubeFace::NegativeZ) => (1, 3, true),
        }
    }
}

/// Split a cross-layout RGBA32F image into a cube image.
pub fn cube_from_cross(image: &Rgba32FImage) -> Result<CubeImage, TextureError> {
    let (layout, size) =
        CrossLayout::detect(image.width(), image.height()).ok_or(TextureError::InvalidCrossLayout {
            width: image.width(),
            height: image.height(),
        })?;

    let faces: [Vec<Rgba>; 6] = std::array::from_fn(|i| {
        let (column, row, rotated) = layout.cell(CubeFace::ALL[i]);
        let mut texels = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let (sx, sy) = if rotated {
                    (size - 1 - x, size - 1 - y)
                } else {
                    (x, y)
                };
                texels.push(image.get_pixel(column * size + sx, row * size + sy).0);
            }
        }
        texels
    });

    CubeImage::from_faces(size, size, faces)
}

/// Load a cube cross from any format the `image` crate decodes (HDR, EXR, PNG).
pub fn load_cross_cube(path: impl AsRef<Path>) -> Result<CubeImage, TextureError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|e| TextureError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let rgba = decoded.into_rgba32f();
    let cube = cube_from_cross(&rgba)?;
    log::debug!(
        "Loaded cube cross '{}' ({}x{} faces)",
        path.display(),
        cube.width(),
        cube.height()
    );
    Ok(cube)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn face_marker(face: CubeFace) -> Rgba {
        [face.index() as f32 + 1.0, 0.0, 0.0, 1.0]
    }

    fn build_cross(layout: CrossLayout, size: u32) -> Rgba32FImage {
        let (cols, rows) = match layout {
            CrossLayout::Horizontal => (4, 3),
            CrossLayout::Vertical => (3, 4),
        };
        let mut image = Rgba32FImage::new(cols * size, rows * size);
        for face in CubeFace::ALL {
            let (column, row, _) = layout.cell(face);
            for y in 0..size {
                for x in 0..size {
                    let mut value = face_marker(face);
                    value[1] = (y * size + x) as f32;
                    image.put_pixel(column * size + x, row * size + y, image::Rgba(value));
                }
            }
        }
        image
    }

    #[rstest]
    #[case(8, 6, Some((CrossLayout::Horizontal, 2)))]
    #[case(6, 8, Some((CrossLayout::Vertical, 2)))]
    #[case(8, 8, None)]
    #[case(0, 0, None)]
    fn test_detect(#[case] w: u32, #[case] h: u32, #[case] expected: Option<(CrossLayout, u32)>) {
        assert_eq!(CrossLayout::detect(w, h), expected);
    }

    #[rstest]
    #[case(CrossLayout::Horizontal)]
    #[case(CrossLayout::Vertical)]
    fn test_faces_extracted(#[case] layout: CrossLayout) {
        let cube = cube_from_cross(&build_cross(layout, 3)).unwrap();
        assert_eq!(cube.width(), 3);
        for face in CubeFace::ALL {
            assert_eq!(cube.texel(face, 1, 1)[0], face_marker(face)[0]);
        }
    }

    #[test]
    fn test_vertical_negative_z_is_rotated() {
        let cube = cube_from_cross(&build_cross(CrossLayout::Vertical, 3)).unwrap();
        // Stored texel (0, 0) of the cell is the face's bottom-right texel.
        assert_eq!(cube.texel(CubeFace::NegativeZ, 2, 2)[1], 0.0);
        assert_eq!(cube.texel(CubeFace::PositiveZ, 0, 0)[1], 0.0);
    }

    #[test]
    fn test_invalid_layout() {
        let image = Rgba32FImage::new(5, 5);
        assert!(matches!(
            cube_from_cross(&image),
            Err(TextureError::InvalidCrossLayout { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_cross_cube("does/not/exist_cross.hdr");
        assert!(matches!(result, Err(TextureError::Decode { .. })));
    }
}
