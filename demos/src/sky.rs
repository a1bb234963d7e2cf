//! Procedural environment used when no files are given.

use lightprobe_core::math::{Rgba, Vec3};
use lightprobe_core::texture::{CubeImage, TextureError};

/// Parameters of the procedural sky.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyDescriptor {
    /// Direction towards the sun, normalized on use.
    pub sun_direction: Vec3,
    /// Sun radiance at the lobe center.
    pub sun_color: [f32; 3],
    /// Phong-style exponent of the sun lobe.
    pub sun_sharpness: f32,
    /// Radiance straight up.
    pub zenith: [f32; 3],
    /// Radiance at the horizon.
    pub horizon: [f32; 3],
    /// Radiance below the horizon.
    pub ground: [f32; 3],
}

impl Default for SkyDescriptor {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(0.4, 0.6, 0.3),
            sun_color: [40.0, 36.0, 30.0],
            sun_sharpness: 256.0,
            zenith: [0.25, 0.45, 0.9],
            horizon: [0.9, 0.85, 0.8],
            ground: [0.15, 0.12, 0.1],
        }
    }
}

impl SkyDescriptor {
    /// Rotate the sun around the vertical axis.
    pub fn with_sun_azimuth(mut self, radians: f32) -> Self {
        let d = self.sun_direction;
        let (s, c) = radians.sin_cos();
        self.sun_direction = Vec3::new(c * d.x + s * d.z, d.y, -s * d.x + c * d.z);
        self
    }

    /// Radiance seen along `dir`.
    pub fn radiance(&self, dir: &Vec3) -> Rgba {
        let dir = dir.normalize();
        let sun = self.sun_direction.normalize();
        let up = dir.y;

        let sky: [f32; 3] = if up >= 0.0 {
            let t = up.sqrt();
            std::array::from_fn(|c| self.horizon[c] + t * (self.zenith[c] - self.horizon[c]))
        } else {
            self.ground
        };
        let lobe = dir.dot(&sun).max(0.0).powf(self.sun_sharpness);
        [
            sky[0] + lobe * self.sun_color[0],
            sky[1] + lobe * self.sun_color[1],
            sky[2] + lobe * self.sun_color[2],
            1.0,
        ]
    }
}

/// Render the sky into a cube with `size x size` faces.
pub fn synthetic_sky(size: u32, descriptor: &SkyDescriptor) -> Result<CubeImage, TextureError> {
    CubeImage::from_fn(size, size, |dir| descriptor.radiance(dir))
}

/// `count` skies with the sun evenly spread around the horizon.
pub fn sky_sequence(size: u32, count: usize) -> Result<Vec<CubeImage>, TextureError> {
    (0..count)
        .map(|i| {
            let azimuth = std::f32::consts::TAU * i as f32 / count as f32;
            synthetic_sky(size, &SkyDescriptor::default().with_sun_azimuth(azimuth))
        })
        .collect()
}
