//! CPU versions of the probe shaders.
//!
//! Each function computes what one shader invocation (texel or thread group)
//! of the matching pass produces. The backend decides which invocations run
//! from the dispatch size or draw instance count.

use std::f32::consts::PI;

use lightprobe_core::cube::{
    CubeFace, direction_to_face_uv, texel_center, texel_direction, texel_solid_angle,
};
use lightprobe_core::math::{Rgba, accumulate_rgba, lerp_rgba};
use lightprobe_core::sh::{MAX_SH_ORDER, eval_basis, term_count};
use lightprobe_core::texture::CubeImage;

use crate::pipeline::SH_GROUP_SIZE;

const GROUP: usize = SH_GROUP_SIZE as usize;

/// Normalized face coordinates of the center of texel `(x, y)`.
#[inline]
pub(super) fn texel_st(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    (
        (x as f32 + 0.5) / width as f32,
        (y as f32 + 0.5) / height as f32,
    )
}

/// Cross-fade of two source cubes at face coordinates `s, t`.
///
/// Sources of a different size than the target are sampled bilinearly.
pub(super) fn radiance_texel(
    a: &CubeImage,
    b: &CubeImage,
    blend: f32,
    face: CubeFace,
    s: f32,
    t: f32,
) -> Rgba {
    lerp_rgba(a.sample_face(face, s, t), b.sample_face(face, s, t), blend)
}

/// 2x2 box filter of `src` at destination texel `(x, y)`.
pub(super) fn resample_texel(src: &CubeImage, face: CubeFace, x: u32, y: u32) -> Rgba {
    let (w, h) = (src.width(), src.height());
    let xs = [(2 * x).min(w - 1), (2 * x + 1).min(w - 1)];
    let ys = [(2 * y).min(h - 1), (2 * y + 1).min(h - 1)];
    let mut acc = [0.0; 4];
    for sy in ys {
        for sx in xs {
            accumulate_rgba(&mut acc, src.texel(face, sx, sy), 0.25);
        }
    }
    acc
}

/// Weight of the coarse upsample at `level`.
///
/// `1 - clamp(Ω / π, 0, 1)` with `Ω` the mean solid angle of a texel of a
/// cube whose faces are `max(map_size >> level, 1)` wide.
pub(super) fn upsample_alpha(map_size: u32, level: u32) -> f32 {
    let size = map_size.checked_shr(level).unwrap_or(0).max(1) as f32;
    let texel_solid_angle = 4.0 * PI / (6.0 * size * size);
    1.0 - (texel_solid_angle / PI).clamp(0.0, 1.0)
}

/// Cosine-weighted bilinear upsample of `coarse` at fine texel `(x, y)`.
///
/// Taps the 3x3 coarse neighbourhood under the fine texel, laid out in the
/// face plane one coarse texel apart and fetched by direction, so taps past
/// the face edge read the adjacent face. Each tap is weighted by a tent of
/// radius 1.5 coarse texels, the clamped cosine towards the fine texel
/// direction and the solid angle of the coarse texel it lands on; weights are
/// normalized.
pub(super) fn cosine_upsample_texel(
    coarse: &CubeImage,
    face: CubeFace,
    x: u32,
    y: u32,
    fine_width: u32,
    fine_height: u32,
) -> Rgba {
    let (cw, ch) = (coarse.width(), coarse.height());
    let (u, v) = (texel_center(x, fine_width), texel_center(y, fine_height));
    let normal = face.direction(u, v).normalize();

    let (step_u, step_v) = (2.0 / cw as f32, 2.0 / ch as f32);
    let cx = coarse_texel(u, cw);
    let cy = coarse_texel(v, ch);
    let (center_u, center_v) = (texel_center(cx, cw), texel_center(cy, ch));

    let mut acc = [0.0f32; 4];
    let mut total = 0.0f32;
    for dy in -1..=1 {
        let tap_v = center_v + dy as f32 * step_v;
        let tent_v = (1.5 - (tap_v - v).abs() / step_v).max(0.0);
        for dx in -1..=1 {
            let tap_u = center_u + dx as f32 * step_u;
            let tent_u = (1.5 - (tap_u - u).abs() / step_u).max(0.0);

            let dir = face.direction(tap_u, tap_v).normalize();
            let (tap_face, fu, fv) = direction_to_face_uv(&dir);
            let (tx, ty) = (coarse_texel(fu, cw), coarse_texel(fv, ch));
            let weight =
                tent_u * tent_v * normal.dot(&dir).max(0.0) * texel_solid_angle(tx, ty, cw, ch);
            if weight > 0.0 {
                let texel = coarse.sample_face(tap_face, 0.5 * (fu + 1.0), 0.5 * (fv + 1.0));
                accumulate_rgba(&mut acc, texel, weight);
                total += weight;
            }
        }
    }

    if total > 0.0 {
        acc.map(|c| c / total)
    } else {
        coarse.texel(face, cx, cy)
    }
}

/// Texel of a `size`-wide face containing face coordinate `u` in `[-1, 1]`.
#[inline]
fn coarse_texel(u: f32, size: u32) -> u32 {
    let texel = (0.5 * (u + 1.0) * size as f32).floor().max(0.0) as u32;
    texel.min(size - 1)
}

/// Sum `GROUP` entries with the in-group pairwise tree.
///
/// Missing entries are zero. The summation order is fixed, so the result is
/// bit-identical across runs.
fn tree_reduce<T: Copy>(values: &mut [T; GROUP], add: impl Fn(&mut T, T)) -> T {
    let mut stride = GROUP / 2;
    while stride > 0 {
        for i in 0..stride {
            let rhs = values[i + stride];
            add(&mut values[i], rhs);
        }
        stride /= 2;
    }
    values[0]
}

fn add_rgb(a: &mut [f32; 3], b: [f32; 3]) {
    a[0] += b[0];
    a[1] += b[1];
    a[2] += b[2];
}

/// Partial SH sums of one group of proxy texels.
///
/// Threads cover linear texel indices `face * P² + y * P + x`; indices at or
/// past `count` contribute nothing. Returns one RGB vector per term and the
/// summed solid angle.
pub(super) fn sh_transform_group(
    radiance: &CubeImage,
    order: u32,
    proxy_size: u32,
    count: u32,
    group: u32,
) -> (Vec<[f32; 3]>, f32) {
    let terms = term_count(order);
    let texels_per_face = proxy_size * proxy_size;
    let mut basis = [0.0f32; term_count(MAX_SH_ORDER)];

    let mut coefficients = Vec::with_capacity(terms);
    let mut contributions = vec![[[0.0f32; 3]; GROUP]; terms];
    let mut weights = [0.0f32; GROUP];

    for thread in 0..GROUP {
        let index = group * SH_GROUP_SIZE + thread as u32;
        if index >= count {
            continue;
        }
        let face = CubeFace::ALL[(index / texels_per_face) as usize % 6];
        let rem = index % texels_per_face;
        let (x, y) = (rem % proxy_size, rem / proxy_size);

        let dir = texel_direction(face, x, y, proxy_size, proxy_size);
        let d_omega = texel_solid_angle(x, y, proxy_size, proxy_size);
        let radiance = radiance.sample(&dir);
        eval_basis(order, &dir, &mut basis);

        for (k, lane) in contributions.iter_mut().enumerate() {
            let w = basis[k] * d_omega;
            lane[thread] = [radiance[0] * w, radiance[1] * w, radiance[2] * w];
        }
        weights[thread] = d_omega;
    }

    for lane in contributions.iter_mut() {
        coefficients.push(tree_reduce(lane, add_rgb));
    }
    let weight = tree_reduce(&mut weights, |a, b| *a += b);
    (coefficients, weight)
}

/// Sum up to `GROUP` partial entries starting at `group * GROUP`.
///
/// `coefficients` is group-major (`entry * terms + term`).
pub(super) fn sh_sum_group(
    coefficients: &[[f32; 3]],
    weights: &[f32],
    terms: usize,
    count: u32,
    group: u32,
) -> (Vec<[f32; 3]>, f32) {
    let first = (group * SH_GROUP_SIZE) as usize;
    let last = (first + GROUP).min(count as usize);

    let mut out = Vec::with_capacity(terms);
    for k in 0..terms {
        let mut lane = [[0.0f32; 3]; GROUP];
        for entry in first..last {
            lane[entry - first] = coefficients[entry * terms + k];
        }
        out.push(tree_reduce(&mut lane, add_rgb));
    }

    let mut lane = [0.0f32; GROUP];
    for entry in first..last {
        lane[entry - first] = weights[entry];
    }
    (out, tree_reduce(&mut lane, |a, b| *a += b))
}

/// Scale the fully reduced sum so the weights integrate to `4π`.
pub(super) fn sh_normalize(sum: &[[f32; 3]], weight: f32) -> Vec<[f32; 3]> {
    let scale = if weight > 0.0 { 4.0 * PI / weight } else { 0.0 };
    sum.iter()
        .map(|c| [c[0] * scale, c[1] * scale, c[2] * scale])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(256, 0)]
    #[case(256, 4)]
    #[case(256, 7)]
    #[case(16, 3)]
    fn test_upsample_alpha_range(#[case] map_size: u32, #[case] level: u32) {
        let a = upsample_alpha(map_size, level);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn test_upsample_alpha_decreases_with_level() {
        assert!(upsample_alpha(256, 0) > upsample_alpha(256, 6));
        // A 1x1 face covers more than π steradians: alpha is 1 - 2/3.
        assert!((upsample_alpha(1, 0) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_constant() {
        let src = CubeImage::uniform(5, 3, [2.0, 1.0, 0.5, 1.0]).unwrap();
        for face in CubeFace::ALL {
            assert_eq!(resample_texel(&src, face, 2, 1), [2.0, 1.0, 0.5, 1.0]);
        }
    }

    #[test]
    fn test_cosine_upsample_preserves_constant() {
        let coarse = CubeImage::uniform(4, 4, [0.25, 0.5, 1.0, 1.0]).unwrap();
        for face in CubeFace::ALL {
            for (x, y) in [(0, 0), (3, 5), (7, 7)] {
                let value = cosine_upsample_texel(&coarse, face, x, y, 8, 8);
                for c in 0..3 {
                    assert!((value[c] - coarse.texel(face, 0, 0)[c]).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_cosine_upsample_from_single_texel() {
        let coarse = CubeImage::uniform(1, 1, [3.0, 3.0, 3.0, 1.0]).unwrap();
        let value = cosine_upsample_texel(&coarse, CubeFace::NegativeY, 1, 0, 2, 2);
        assert!((value[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_upsample_reads_across_face_edges() {
        let mut coarse = CubeImage::uniform(2, 2, [0.0, 0.0, 0.0, 1.0]).unwrap();
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            coarse.set_texel(CubeFace::PositiveY, x, y, [1.0; 4]);
        }
        // Top row of +Z borders +Y; the center of +Z does not reach it.
        let edge = cosine_upsample_texel(&coarse, CubeFace::PositiveZ, 1, 0, 4, 4);
        let center = cosine_upsample_texel(&coarse, CubeFace::PositiveZ, 1, 2, 4, 4);
        assert!(edge[0] > 0.1, "{edge:?}");
        assert!(edge[0] > center[0]);
        // -Y faces away from every lit tap.
        let below = cosine_upsample_texel(&coarse, CubeFace::NegativeY, 1, 1, 4, 4);
        assert_eq!(below[0], 0.0);
    }

    #[test]
    fn test_tree_reduce_matches_sum() {
        let mut values = [0.0f32; GROUP];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as f32;
        }
        let sum = tree_reduce(&mut values, |a, b| *a += b);
        assert_eq!(sum, (0..GROUP).sum::<usize>() as f32);
    }

    #[test]
    fn test_sum_group_ignores_entries_past_count() {
        let terms = 1;
        let coefficients = vec![[1.0, 2.0, 3.0]; 70];
        let weights = vec![0.5; 70];
        let (sum, weight) = sh_sum_group(&coefficients, &weights, terms, 66, 1);
        assert_eq!(sum, vec![[2.0, 4.0, 6.0]]);
        assert_eq!(weight, 1.0);
    }

    #[test]
    fn test_normalize_scales_by_total_weight() {
        let out = sh_normalize(&[[PI, 0.0, 2.0 * PI]], PI);
        assert!((out[0][0] - 4.0 * PI).abs() < 1e-5);
        assert!((out[0][2] - 8.0 * PI).abs() < 1e-5);
        assert_eq!(sh_normalize(&[[1.0; 3]], 0.0), vec![[0.0; 3]]);
    }
}
