//! Result files and reports.

use std::error::Error;
use std::path::{Path, PathBuf};

use image::Rgb32FImage;
use lightprobe_core::cube::CubeFace;
use lightprobe_core::irradiance::{reference_irradiance, rms_difference};
use lightprobe_core::sh::ShCoefficients;
use lightprobe_core::texture::{CubeImage, TextureError};

/// Largest face size handed to the brute-force convolution.
const REFERENCE_SOURCE_SIZE: u32 = 32;

/// Write the six faces of `cube` as `{prefix}_{face}.hdr` into `dir`.
pub fn write_cube(
    dir: &Path,
    prefix: &str,
    cube: &CubeImage,
) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(6);
    for face in CubeFace::ALL {
        let rgb: Vec<f32> = cube
            .face(face)
            .iter()
            .flat_map(|t| [t[0], t[1], t[2]])
            .collect();
        let image = Rgb32FImage::from_raw(cube.width(), cube.height(), rgb)
            .ok_or_else(|| format!("face {} has the wrong texel count", face.name()))?;
        let path = dir.join(format!("{prefix}_{}.hdr", face.name()));
        image.save(&path)?;
        log::debug!("Wrote '{}'", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Evaluate SH irradiance into a cube, as outgoing radiance of a white
/// Lambertian surface.
pub fn sh_irradiance_cube(sh: &ShCoefficients, size: u32) -> Result<CubeImage, TextureError> {
    CubeImage::from_fn(size, size, |dir| {
        let e = sh.irradiance(dir);
        let inv_pi = std::f32::consts::FRAC_1_PI;
        [e[0] * inv_pi, e[1] * inv_pi, e[2] * inv_pi, 1.0]
    })
}

/// RMS difference of `filtered` against the brute-force convolution of
/// `radiance`.
pub fn compare_with_reference(
    radiance: &CubeImage,
    filtered: &CubeImage,
) -> Result<f32, Box<dyn Error>> {
    let mut source = radiance.clone();
    while source.width().max(source.height()) > REFERENCE_SOURCE_SIZE {
        source = source.downsample();
    }
    let reference = reference_irradiance(&source, filtered.width())?;
    rms_difference(filtered, &reference).ok_or_else(|| "cube sizes differ".into())
}

/// Human-readable coefficient listing, one band per line.
pub fn format_sh(sh: &ShCoefficients) -> String {
    let mut out = String::new();
    for l in 0..sh.order() as i32 {
        out.push_str(&format!("  l={l}:"));
        for m in -l..=l {
            let c = sh.get(l, m);
            out.push_str(&format!(" ({:.4}, {:.4}, {:.4})", c[0], c[1], c[2]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_sh_cube() {
        let mut values = vec![[0.0; 3]; 9];
        // Radiance of 1 everywhere.
        values[0] = [3.544_907; 3];
        let sh = ShCoefficients::from_rgb(3, &values);
        let cube = sh_irradiance_cube(&sh, 4).unwrap();
        for face in CubeFace::ALL {
            for t in cube.face(face) {
                assert!((t[0] - 1.0).abs() < 1e-3, "{t:?}");
            }
        }
    }

    #[test]
    fn test_constant_matches_reference() {
        let radiance = CubeImage::uniform(64, 64, [2.0, 2.0, 2.0, 1.0]).unwrap();
        let filtered = CubeImage::uniform(4, 4, [2.0, 2.0, 2.0, 1.0]).unwrap();
        let rms = compare_with_reference(&radiance, &filtered).unwrap();
        assert!(rms < 1e-4);
    }

    #[test]
    fn test_format_lists_every_band() {
        let sh = ShCoefficients::new(3);
        let text = format_sh(&sh);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("l=2:"));
    }

    #[test]
    fn test_write_cube() {
        let dir = std::env::temp_dir().join(format!("irradiance_demo_{}", std::process::id()));
        let cube = CubeImage::uniform(2, 2, [0.5, 1.0, 2.0, 1.0]).unwrap();
        let written = write_cube(&dir, "test", &cube).unwrap();
        assert_eq!(written.len(), 6);
        assert!(written.iter().all(|p| p.exists()));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
