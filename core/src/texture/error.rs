//! Error type for cube image loading.

use std::path::PathBuf;

/// Errors that can occur while building or loading a cube image.
#[derive(Debug)]
pub enum TextureError {
    /// The file could not be opened or decoded.
    Decode {
        /// Path of the file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
    /// The image dimensions do not describe a cube cross.
    InvalidCrossLayout {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Face dimensions must be non-zero.
    EmptyFace,
    /// Texel data length does not match the face dimensions.
    SizeMismatch {
        /// Expected texel count.
        expected: usize,
        /// Provided texel count.
        actual: usize,
    },
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode { path, message } => {
                write!(f, "failed to load '{}': {message}", path.display())
            }
            Self::InvalidCrossLayout { width, height } => write!(
                f,
                "{width}x{height} is not a 4x3 or 3x4 cube cross layout"
            ),
            Self::EmptyFace => write!(f, "cube face dimensions cannot be zero"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} texels, got {actual}")
            }
        }
    }
}

impl std::error::Error for TextureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TextureError::InvalidCrossLayout {
            width: 10,
            height: 10,
        };
        assert_eq!(
            err.to_string(),
            "10x10 is not a 4x3 or 3x4 cube cross layout"
        );

        let err = TextureError::Decode {
            path: PathBuf::from("env/grace_cross.hdr"),
            message: "unexpected end of file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load 'env/grace_cross.hdr': unexpected end of file"
        );
    }
}
