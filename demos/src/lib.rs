//! # Light Probe Demos
//!
//! Headless drivers for the light-probe filters.
//!
//! ## Available Demos
//!
//! - `irradiance_demo` - Filters environment maps for a number of frames and
//!   writes the resulting cube faces

pub mod sky;

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
