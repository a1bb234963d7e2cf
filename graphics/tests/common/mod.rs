//! Common utilities for light-probe integration tests.
//!
//! This module provides shared test infrastructure that can be reused
//! across the backend implementations.

use std::sync::Arc;

use lightprobe_core::math::Rgba;
use lightprobe_core::texture::CubeImage;
use lightprobe_graphics::backend::dummy::DummyBackend;
use lightprobe_graphics::backend::software::SoftwareBackend;
use lightprobe_graphics::{
    BackendType, Buffer, CommandList, DescriptorTableCache, DeviceCapabilities, GraphicsDevice,
    GraphicsError, LightProbe, LightProbeDescriptor, PipelineType, TextureFormat,
};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Available backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Validation only; readbacks return zeros.
    Dummy,
    /// CPU execution of every pass.
    Software,
}

impl Backend {
    /// Returns true if readbacks carry computed results.
    #[allow(dead_code)]
    pub fn computes(&self) -> bool {
        matches!(self, Backend::Software)
    }

    fn backend_type(self) -> BackendType {
        match self {
            Backend::Dummy => BackendType::Dummy,
            Backend::Software => BackendType::Software,
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Test context providing a device and the descriptor table cache.
pub struct TestContext {
    /// The backend being tested.
    #[allow(dead_code)]
    pub backend: Backend,
    /// Graphics device for creating resources.
    pub device: Arc<GraphicsDevice>,
    /// Descriptor tables shared by every probe of the context.
    pub tables: DescriptorTableCache,
}

impl TestContext {
    /// Create a new test context for the given backend.
    pub fn new(backend: Backend) -> Self {
        init_logging();
        Self {
            backend,
            device: GraphicsDevice::new(backend.backend_type()),
            tables: DescriptorTableCache::default(),
        }
    }

    /// Create a context whose device reports `capabilities`.
    #[allow(dead_code)]
    pub fn with_capabilities(backend: Backend, capabilities: DeviceCapabilities) -> Self {
        init_logging();
        let device = match backend {
            Backend::Dummy => GraphicsDevice::from_backend(Box::new(
                DummyBackend::new().with_capabilities(capabilities),
            )),
            Backend::Software => GraphicsDevice::from_backend(Box::new(
                SoftwareBackend::new().with_capabilities(capabilities),
            )),
        };
        Self {
            backend,
            device,
            tables: DescriptorTableCache::default(),
        }
    }

    /// Create a probe and submit its uploads.
    pub fn try_probe(
        &mut self,
        sources: &[CubeImage],
        descriptor: LightProbeDescriptor,
    ) -> Result<LightProbe, GraphicsError> {
        let mut cmd = CommandList::new("init");
        let mut uploaders: Vec<Arc<Buffer>> = Vec::new();
        let probe = LightProbe::init(
            &self.device,
            &mut cmd,
            &mut self.tables,
            &mut uploaders,
            sources,
            descriptor,
        )?;
        self.device.submit(&cmd)?;
        Ok(probe)
    }

    /// Create a probe and submit its uploads, panicking on failure.
    pub fn probe(&mut self, sources: &[CubeImage], descriptor: LightProbeDescriptor) -> LightProbe {
        self.try_probe(sources, descriptor)
            .expect("Failed to create light probe")
    }

    /// Record and submit one frame; returns the recorded pipeline type.
    pub fn run_frame(
        &self,
        probe: &mut LightProbe,
        time: f64,
        frame: usize,
        pipeline_type: PipelineType,
    ) -> PipelineType {
        let (cmd, recorded) = record_frame(probe, time, frame, pipeline_type);
        self.device.submit(&cmd).expect("Frame submission failed");
        recorded
    }
}

/// Record one frame without submitting it.
pub fn record_frame(
    probe: &mut LightProbe,
    time: f64,
    frame: usize,
    pipeline_type: PipelineType,
) -> (CommandList, PipelineType) {
    probe.update_frame(time, frame);
    let mut cmd = CommandList::new(format!("frame_{frame}"));
    let recorded = probe
        .process(&mut cmd, frame, pipeline_type)
        .expect("Failed to record frame");
    (cmd, recorded)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Source Helpers
// ============================================================================

/// Small descriptor that keeps the SH proxy cheap.
pub fn test_descriptor() -> LightProbeDescriptor {
    LightProbeDescriptor::new()
        .with_proxy_size(8)
        .with_format(TextureFormat::Rgba16Float)
}

/// A cube where every texel is `value`.
pub fn uniform_cube(size: u32, value: Rgba) -> CubeImage {
    CubeImage::uniform(size, size, value).expect("Failed to create cube")
}

/// A smooth sky: brighter towards +Y with a warm tint towards +X.
#[allow(dead_code)]
pub fn gradient_cube(size: u32) -> CubeImage {
    CubeImage::from_fn(size, size, |dir| {
        let up = 0.5 * (dir.y + 1.0);
        let side = 0.5 * (dir.x + 1.0);
        [0.2 + up, 0.2 + 0.5 * up + 0.3 * side, 0.3 + 0.8 * up, 1.0]
    })
    .expect("Failed to create cube")
}

/// Assert every color channel of `image` is within `tolerance` of `value`.
#[allow(dead_code)]
pub fn assert_uniform(image: &CubeImage, value: Rgba, tolerance: f32) {
    let expected = CubeImage::uniform(image.width(), image.height(), value)
        .expect("Failed to create cube");
    let diff = image
        .max_abs_difference(&expected)
        .expect("Cube sizes differ");
    assert!(
        diff <= tolerance,
        "max difference {diff} exceeds {tolerance} (expected {value:?})"
    );
}
