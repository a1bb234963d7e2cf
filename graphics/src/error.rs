//! Graphics error types.

use std::fmt;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// A pipeline could not be built for the device.
    ShaderCompilationFailed(String),
    /// A requested feature is not supported.
    FeatureNotSupported(String),
    /// A source texture could not be loaded or decoded.
    TextureLoadFailed(String),
    /// A command violated resource state discipline.
    ResourceState(String),
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// An internal error occurred.
    Internal(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::ShaderCompilationFailed(msg) => write!(f, "pipeline creation failed: {msg}"),
            Self::FeatureNotSupported(msg) => write!(f, "feature not supported: {msg}"),
            Self::TextureLoadFailed(msg) => write!(f, "texture load failed: {msg}"),
            Self::ResourceState(msg) => write!(f, "resource state violation: {msg}"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

impl From<lightprobe_core::texture::TextureError> for GraphicsError {
    fn from(err: lightprobe_core::texture::TextureError) -> Self {
        Self::TextureLoadFailed(err.to_string())
    }
}
