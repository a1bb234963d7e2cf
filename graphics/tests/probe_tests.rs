//! Integration tests for the mip-pyramid light probe.
//!
//! Tests are parameterized using `rstest` over the backends and pipeline
//! types. Both backends validate the resource state of every submitted
//! command, so every test here also checks barrier discipline; numerical
//! checks only run on the software backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lightprobe-graphics --test probe_tests
//! ```

mod common;

use rstest::rstest;

use common::{
    Backend, TestContext, assert_uniform, gradient_cube, record_frame, test_descriptor,
    uniform_cube,
};
use lightprobe_core::cube::{CubeFace, direction_to_face_uv, mip_extent};
use lightprobe_core::irradiance::{reference_irradiance, rms_difference};
use lightprobe_core::texture::CubeImage;
use lightprobe_graphics::backend::dummy::DummyBackend;
use lightprobe_graphics::{
    Command, DeviceCapabilities, GraphicsDevice, GraphicsError, PassId, PipelineType,
    ResourceState, Subresource,
};

// ============================================================================
// Mip Chain
// ============================================================================

#[rstest]
#[case(1, 1)]
#[case(2, 2)]
#[case(5, 3)]
#[case(16, 5)]
#[case(100, 7)]
fn test_mip_count_and_extents(#[case] size: u32, #[case] levels: u32) {
    let mut ctx = TestContext::new(Backend::Dummy);
    let probe = ctx.probe(&[uniform_cube(size, [1.0; 4])], test_descriptor());

    assert_eq!(probe.num_levels(), levels);
    assert_eq!(probe.num_passes(), levels - 1);
    let irradiance = probe.irradiance();
    for level in 0..levels {
        let extent = irradiance.mip_size(level);
        assert_eq!(extent.width, mip_extent(size, level));
        assert_eq!(extent.height, mip_extent(size, level));
    }
    assert_eq!(irradiance.mip_size(levels - 1).width, 1);
}

#[test]
fn test_non_square_sources_use_largest_extent() {
    let mut ctx = TestContext::new(Backend::Dummy);
    let sources = [
        CubeImage::uniform(16, 4, [1.0; 4]).unwrap(),
        CubeImage::uniform(8, 8, [1.0; 4]).unwrap(),
    ];
    let probe = ctx.probe(&sources, test_descriptor());
    assert_eq!(probe.radiance().width(), 16);
    assert_eq!(probe.radiance().height(), 8);
    assert_eq!(probe.num_levels(), 5);
}

// ============================================================================
// Constant Round Trip
// ============================================================================

/// A uniform environment stays uniform through the whole V-cycle.
#[rstest]
#[case::hybrid(PipelineType::Hybrid)]
#[case::graphics(PipelineType::Graphics)]
#[case::compute(PipelineType::Compute)]
fn test_constant_round_trip(#[case] pipeline_type: PipelineType) {
    let mut ctx = TestContext::new(Backend::Software);
    let value = [0.75, 1.5, 3.0, 1.0];
    let mut probe = ctx.probe(&[uniform_cube(16, value)], test_descriptor());

    let recorded = ctx.run_frame(&mut probe, 0.0, 0, pipeline_type);
    assert_eq!(recorded, pipeline_type);

    assert_uniform(&probe.read_radiance().unwrap(), value, 1e-6);
    for level in 0..probe.num_levels() {
        assert_uniform(&probe.read_irradiance(level).unwrap(), value, 1e-4);
    }
}

// ============================================================================
// Degenerate Inputs
// ============================================================================

#[rstest]
#[case::single_texel_hybrid(1, PipelineType::Hybrid)]
#[case::single_texel_graphics(1, PipelineType::Graphics)]
#[case::single_texel_compute(1, PipelineType::Compute)]
#[case::single_texel_sh(1, PipelineType::Sh)]
#[case::two_texels_hybrid(2, PipelineType::Hybrid)]
#[case::two_texels_graphics(2, PipelineType::Graphics)]
#[case::two_texels_compute(2, PipelineType::Compute)]
#[case::two_texels_sh(2, PipelineType::Sh)]
fn test_degenerate_inputs(#[case] size: u32, #[case] pipeline_type: PipelineType) {
    let mut ctx = TestContext::new(Backend::Software);
    let value = [2.0, 1.0, 0.5, 1.0];
    let mut probe = ctx.probe(&[uniform_cube(size, value)], test_descriptor());

    for frame in 0..2 {
        ctx.run_frame(&mut probe, 0.0, frame, pipeline_type);
    }

    if pipeline_type == PipelineType::Sh {
        let sh = probe.read_sh().unwrap();
        let c0 = sh.get(0, 0)[0] * 0.282_095;
        assert!((c0 - value[0]).abs() < 0.02 * value[0], "c0 * Y0 = {c0}");
    } else {
        assert_uniform(&probe.read_irradiance(0).unwrap(), value, 1e-4);
    }
}

#[test]
fn test_single_texel_records_copy() {
    let mut ctx = TestContext::new(Backend::Dummy);
    let mut probe = ctx.probe(&[uniform_cube(1, [1.0; 4])], test_descriptor());
    let (cmd, _) = record_frame(&mut probe, 0.0, 0, PipelineType::Hybrid);
    assert_eq!(cmd.count("copy_texture"), 1);
    assert_eq!(cmd.count("dispatch"), 0);
    assert_eq!(cmd.count("draw"), 1);
    ctx.device.submit(&cmd).unwrap();
}

// ============================================================================
// Cross-Variant Agreement
// ============================================================================

#[test]
fn test_variants_agree() {
    let mut ctx = TestContext::new(Backend::Software);
    let sky = gradient_cube(16);
    let mut probe = ctx.probe(&[sky], test_descriptor());

    let mut results = Vec::new();
    for (frame, pipeline_type) in [
        PipelineType::Hybrid,
        PipelineType::Graphics,
        PipelineType::Compute,
    ]
    .into_iter()
    .enumerate()
    {
        ctx.run_frame(&mut probe, 0.0, frame, pipeline_type);
        results.push(probe.read_irradiance(0).unwrap());
    }

    for other in &results[1..] {
        let diff = results[0].max_abs_difference(other).unwrap();
        assert!(diff < 1e-5, "variants differ by {diff}");
    }
}

#[test]
fn test_irradiance_is_smoother_than_radiance() {
    let mut ctx = TestContext::new(Backend::Software);
    let mut probe = ctx.probe(&[gradient_cube(16)], test_descriptor());
    ctx.run_frame(&mut probe, 0.0, 0, PipelineType::Hybrid);

    let radiance = probe.read_radiance().unwrap();
    let irradiance = probe.read_irradiance(0).unwrap();
    let range = |image: &CubeImage| {
        let values: Vec<f32> = CubeFace::ALL
            .iter()
            .flat_map(|&face| image.face(face).iter().map(|t| t[0]))
            .collect();
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        let min = values.iter().copied().fold(f32::MAX, f32::min);
        max - min
    };
    assert!(range(&irradiance) < range(&radiance));
    assert!(range(&irradiance) > 0.0);
}

/// A cube lit only through `face`.
fn lit_face_cube(size: u32, face: CubeFace) -> CubeImage {
    CubeImage::from_fn(size, size, |dir| {
        let value = if direction_to_face_uv(dir).0 == face { 1.0 } else { 0.0 };
        [value, value, value, 1.0]
    })
    .unwrap()
}

/// Light entering through one face reaches its neighbours, close to a
/// brute-force cosine convolution, without a step at the face seams.
#[rstest]
#[case::hybrid(PipelineType::Hybrid)]
#[case::graphics(PipelineType::Graphics)]
#[case::compute(PipelineType::Compute)]
fn test_lit_face_matches_reference(#[case] pipeline_type: PipelineType) {
    const SIZE: u32 = 16;
    let mut ctx = TestContext::new(Backend::Software);
    let mut probe = ctx.probe(&[lit_face_cube(SIZE, CubeFace::PositiveY)], test_descriptor());
    assert_eq!(ctx.run_frame(&mut probe, 0.0, 0, pipeline_type), pipeline_type);

    let irradiance = probe.read_irradiance(0).unwrap();
    let reference = reference_irradiance(&probe.read_radiance().unwrap(), SIZE).unwrap();
    let rms = rms_difference(&irradiance, &reference).unwrap();
    assert!(rms < 0.06, "RMS against reference is {rms}");

    let center = SIZE / 2;
    let lit = irradiance.texel(CubeFace::PositiveY, center, center)[0];
    let side = irradiance.texel(CubeFace::PositiveX, center, center)[0];
    let opposite = irradiance.texel(CubeFace::NegativeY, center, center)[0];
    assert!(lit < 0.8, "+Y center {lit}");
    assert!(side > 0.05, "+X center {side}");
    assert!(opposite < 0.05, "-Y center {opposite}");

    // The last row of +Y borders the first row of +Z.
    for x in 0..SIZE {
        let top = irradiance.texel(CubeFace::PositiveY, x, SIZE - 1)[0];
        let front = irradiance.texel(CubeFace::PositiveZ, x, 0)[0];
        assert!((top - front).abs() < 0.1, "seam step at x={x}: {top} vs {front}");
    }
}

// ============================================================================
// Capability Fallback
// ============================================================================

/// Without typed UAV loads, `Compute` records exactly what `Hybrid` records.
#[test]
fn test_compute_without_typed_uav_matches_hybrid() {
    let record = |requested: PipelineType| {
        let mut ctx = TestContext::new(Backend::Dummy);
        let mut probe = ctx.probe(
            &[uniform_cube(8, [1.0; 4]), uniform_cube(8, [2.0; 4])],
            test_descriptor().with_typed_uav(false),
        );
        assert!(!probe.typed_uav());
        let (cmd, recorded) = record_frame(&mut probe, 1.0, 0, requested);
        ctx.device.submit(&cmd).unwrap();
        (cmd, recorded)
    };

    let (hybrid, hybrid_type) = record(PipelineType::Hybrid);
    let (compute, compute_type) = record(PipelineType::Compute);
    assert_eq!(hybrid_type, PipelineType::Hybrid);
    assert_eq!(compute_type, PipelineType::Hybrid);
    assert_eq!(hybrid, compute);
}

#[test]
fn test_compute_with_typed_uav_differs_from_hybrid() {
    let mut ctx = TestContext::new(Backend::Dummy);
    let mut probe = ctx.probe(&[uniform_cube(8, [1.0; 4])], test_descriptor());
    assert!(probe.typed_uav());
    let (cmd, recorded) = record_frame(&mut probe, 0.0, 0, PipelineType::Compute);
    assert_eq!(recorded, PipelineType::Compute);
    assert_eq!(cmd.count("draw"), 1);
    // Three downsample passes and three in-place upsample passes.
    assert_eq!(cmd.count("dispatch"), 6);
    ctx.device.submit(&cmd).unwrap();
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::software(Backend::Software)]
fn test_device_without_typed_uav_formats_falls_back(#[case] backend: Backend) {
    let mut ctx = TestContext::with_capabilities(
        backend,
        DeviceCapabilities {
            typed_uav_load_additional_formats: false,
            ..DeviceCapabilities::default()
        },
    );
    let mut probe = ctx.probe(&[uniform_cube(4, [1.0; 4])], test_descriptor());
    assert!(!probe.typed_uav());
    assert_eq!(
        ctx.run_frame(&mut probe, 0.0, 0, PipelineType::Compute),
        PipelineType::Hybrid
    );
}

#[test]
fn test_failing_in_place_build_is_fatal() {
    // Only an unsupported in-place upsample is skipped; a broken one is not.
    let device = GraphicsDevice::from_backend(Box::new(
        DummyBackend::new().with_failing_pass(PassId::UpsampleInPlace),
    ));
    let mut ctx = TestContext::new(Backend::Dummy);
    ctx.device = device;
    let result = ctx.try_probe(&[uniform_cube(4, [1.0; 4])], test_descriptor());
    assert!(matches!(
        result,
        Err(GraphicsError::ShaderCompilationFailed(_))
    ));
}

#[rstest]
#[case(PassId::GenerateRadiance)]
#[case(PassId::Resample)]
#[case(PassId::UpsampleGraphicsFinal)]
#[case(PassId::ShNormalize)]
fn test_failing_pipeline_is_fatal(#[case] pass: PassId) {
    let mut ctx = TestContext::new(Backend::Dummy);
    ctx.device = GraphicsDevice::from_backend(Box::new(DummyBackend::new().with_failing_pass(pass)));
    let result = ctx.try_probe(&[uniform_cube(4, [1.0; 4])], test_descriptor());
    assert!(result.is_err());
}

// ============================================================================
// Cross-Fade
// ============================================================================

#[rstest]
#[case(0.0, 1.0)]
#[case(1.0, 2.0)]
#[case(2.0, 3.0)]
#[case(3.0, 2.0)]
#[case(4.0, 1.0)]
fn test_cross_fade(#[case] time: f64, #[case] expected: f32) {
    let mut ctx = TestContext::new(Backend::Software);
    let mut probe = ctx.probe(
        &[uniform_cube(4, [1.0; 4]), uniform_cube(4, [3.0; 4])],
        test_descriptor().with_cycle_period(2.0),
    );
    ctx.run_frame(&mut probe, time, 0, PipelineType::Hybrid);
    let radiance = probe.read_radiance().unwrap();
    assert_uniform(&radiance, [expected; 4], 1e-5);
}

#[test]
fn test_sources_of_different_sizes_blend() {
    let mut ctx = TestContext::new(Backend::Software);
    let mut probe = ctx.probe(
        &[uniform_cube(2, [1.0; 4]), uniform_cube(8, [2.0; 4])],
        test_descriptor().with_cycle_period(1.0),
    );
    ctx.run_frame(&mut probe, 0.25, 0, PipelineType::Graphics);
    let radiance = probe.read_radiance().unwrap();
    assert_eq!(radiance.width(), 8);
    assert_uniform(&radiance, [1.25, 1.25, 1.25, 1.0], 1e-5);
}

// ============================================================================
// Barrier Discipline
// ============================================================================

/// Cycle through every variant for several frames; every submit validates.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::software(Backend::Software)]
fn test_pipeline_cycling(#[case] backend: Backend) {
    let mut ctx = TestContext::new(backend);
    let mut probe = ctx.probe(
        &[gradient_cube(8), uniform_cube(4, [0.5; 4])],
        test_descriptor(),
    );

    let mut pipeline_type = PipelineType::default();
    for frame in 0..10 {
        let recorded = ctx.run_frame(&mut probe, frame as f64 * 0.7, frame, pipeline_type);
        assert_eq!(recorded, pipeline_type);
        pipeline_type = pipeline_type.next(probe.typed_uav());
    }

    for level in 0..probe.num_levels() {
        for layer in 0..6 {
            let sub = Subresource::texture(probe.irradiance().id(), level, layer);
            assert_eq!(probe.state(sub), Some(ResourceState::ShaderRead));
        }
    }
}

#[test]
fn test_downsample_barrier_batches() {
    let mut ctx = TestContext::new(Backend::Dummy);
    let mut probe = ctx.probe(&[uniform_cube(8, [1.0; 4])], test_descriptor());
    let (cmd, _) = record_frame(&mut probe, 0.0, 0, PipelineType::Graphics);

    for command in cmd.commands() {
        if let Command::Barrier(barriers) = command {
            assert!(!barriers.is_empty());
            assert!(barriers.len() <= 13);
            assert!(barriers.iter().all(|b| b.before != b.after));
        }
    }
    ctx.device.submit(&cmd).unwrap();
}
