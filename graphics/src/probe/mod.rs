//! Light-probe filtering.
//!
//! A [`LightProbe`] owns the radiance and irradiance cubes of one probe and
//! records, once per frame, the passes that turn its source environments
//! into diffuse irradiance:
//!
//! 1. the radiance pass cross-fades two sources into the radiance cube,
//! 2. then either the mip pyramid ([`ConvolutionPyramid`] followed by
//!    [`CosineUpsamplePyramid`]) filters it into irradiance level 0,
//! 3. or the [`SphericalHarmonicsProjector`] reduces it to SH coefficients.
//!
//! Which passes run is chosen per frame with a [`PipelineType`].
//!
//! # Example
//!
//! ```ignore
//! let device = GraphicsDevice::new(BackendType::Software);
//! let mut cmd = CommandList::new("init");
//! let mut tables = DescriptorTableCache::default();
//! let mut uploaders = Vec::new();
//! let mut probe = LightProbe::init(
//!     &device, &mut cmd, &mut tables, &mut uploaders, &sources,
//!     LightProbeDescriptor::new().with_sh_order(3),
//! )?;
//! device.submit(&cmd)?;
//!
//! probe.update_frame(time, frame);
//! let mut frame_cmd = CommandList::new("frame");
//! probe.process(&mut frame_cmd, frame, PipelineType::Hybrid)?;
//! device.submit(&frame_cmd)?;
//! ```

mod pipeline_type;
mod pyramid;
mod radiance;
mod sh;

pub use pipeline_type::PipelineType;
pub use pyramid::{
    ConvolutionPyramid, CosineUpsamplePyramid, DownsampleStage, UpsampleStage, texture_groups,
};
pub use radiance::{RadianceGenerator, cross_fade_schedule};
pub use sh::{ShBuffers, ShSlot, SphericalHarmonicsProjector, max_groups, reduction_passes};

use std::path::Path;
use std::sync::Arc;

use lightprobe_core::sh::ShCoefficients;
use lightprobe_core::texture::{CubeImage, load_cross_cube};

use crate::barrier::{BarrierBatch, ResourceState, StateTracker, Subresource};
use crate::command::CommandList;
use crate::descriptor::DescriptorTableCache;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::pipeline::{PassId, PipelineDescriptor, PipelineSet};
use crate::resources::{Buffer, Texture};
use crate::types::{BufferDescriptor, BufferUsage, TextureDescriptor, TextureFormat, TextureUsage};

/// Number of frames in flight; per-frame constants rotate over this many slots.
pub const FRAME_COUNT: usize = 3;

/// Default SH order.
pub const DEFAULT_SH_ORDER: u32 = 3;

/// Default face size of the SH projection proxy.
pub const DEFAULT_PROXY_SIZE: u32 = 256;

/// Default seconds each source is shown before fading to the next.
pub const DEFAULT_CYCLE_PERIOD: f64 = 3.0;

/// Creation parameters of a [`LightProbe`].
#[derive(Debug, Clone, PartialEq)]
pub struct LightProbeDescriptor {
    /// Debug label prefix for the probe's resources.
    pub label: Option<String>,
    /// SH order (`1..=6`).
    pub sh_order: u32,
    /// Face size of the SH projection proxy.
    pub proxy_size: u32,
    /// Seconds per source in the cross-fade.
    pub cycle_period: f64,
    /// Allow the in-place compute upsample if the device supports it.
    pub typed_uav: bool,
    /// Format of the radiance and irradiance cubes.
    pub format: TextureFormat,
}

impl Default for LightProbeDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            sh_order: DEFAULT_SH_ORDER,
            proxy_size: DEFAULT_PROXY_SIZE,
            cycle_period: DEFAULT_CYCLE_PERIOD,
            typed_uav: true,
            format: TextureFormat::Rg11b10Float,
        }
    }
}

impl LightProbeDescriptor {
    /// Create a descriptor with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the SH order.
    pub fn with_sh_order(mut self, order: u32) -> Self {
        self.sh_order = order;
        self
    }

    /// Set the SH proxy face size.
    pub fn with_proxy_size(mut self, size: u32) -> Self {
        self.proxy_size = size;
        self
    }

    /// Set the cross-fade period in seconds.
    pub fn with_cycle_period(mut self, seconds: f64) -> Self {
        self.cycle_period = seconds;
        self
    }

    /// Allow or forbid the in-place compute upsample.
    pub fn with_typed_uav(mut self, enabled: bool) -> Self {
        self.typed_uav = enabled;
        self
    }

    /// Set the cube format.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    fn resource_label(&self, name: &str) -> String {
        match &self.label {
            Some(label) => format!("{label}_{name}"),
            None => name.to_string(),
        }
    }
}

/// One filtered light probe.
pub struct LightProbe {
    device: Arc<GraphicsDevice>,
    descriptor: LightProbeDescriptor,
    sources: Vec<Arc<Texture>>,
    radiance: Arc<Texture>,
    irradiance: Arc<Texture>,
    tracker: StateTracker,
    pipelines: PipelineSet,
    radiance_pass: RadianceGenerator,
    downsample: ConvolutionPyramid,
    upsample: CosineUpsamplePyramid,
    sh: SphericalHarmonicsProjector,
}

impl LightProbe {
    /// Create a probe from CPU cube images.
    ///
    /// Uploads are recorded into `cmd` through staging buffers pushed onto
    /// `uploaders`; keep them alive until `cmd` has been submitted. Cubes are
    /// sized from the largest source.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] without sources or with an
    /// invalid descriptor, and any error of pipeline or resource creation
    /// except an unsupported in-place upsample, which is skipped.
    pub fn init(
        device: &Arc<GraphicsDevice>,
        cmd: &mut CommandList,
        tables: &mut DescriptorTableCache,
        uploaders: &mut Vec<Arc<Buffer>>,
        sources: &[CubeImage],
        descriptor: LightProbeDescriptor,
    ) -> Result<Self, GraphicsError> {
        lightprobe_core::profile_function!();
        if sources.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "a light probe needs at least one source".to_string(),
            ));
        }

        let mut tracker = StateTracker::new();
        let source_textures = sources
            .iter()
            .enumerate()
            .map(|(i, image)| {
                upload_source(device, cmd, &mut tracker, uploaders, &descriptor, i, image)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let width = sources.iter().map(CubeImage::width).max().unwrap_or(1);
        let height = sources.iter().map(CubeImage::height).max().unwrap_or(1);
        let num_levels = lightprobe_core::cube::mip_level_count(width, height);
        let usage = TextureUsage::TEXTURE_BINDING
            | TextureUsage::STORAGE_BINDING
            | TextureUsage::RENDER_ATTACHMENT
            | TextureUsage::COPY_SRC
            | TextureUsage::COPY_DST;

        let radiance = device.create_texture(
            &TextureDescriptor::new_cube(width, height, descriptor.format, usage)
                .with_label(descriptor.resource_label("radiance")),
        )?;
        let irradiance = device.create_texture(
            &TextureDescriptor::new_cube(width, height, descriptor.format, usage)
                .with_mip_levels(num_levels)
                .with_label(descriptor.resource_label("irradiance")),
        )?;
        tracker.register_texture(&radiance, ResourceState::Common);
        tracker.register_texture(&irradiance, ResourceState::Common);

        let typed_uav = descriptor.typed_uav
            && descriptor
                .format
                .supports_typed_uav_load(device.capabilities().typed_uav_load_additional_formats);
        let pipelines = create_pipelines(device, descriptor.format, typed_uav)?;
        let in_place = pipelines.contains(PassId::UpsampleInPlace)
            && pipelines.contains(PassId::UpsampleInPlaceFinal);

        let radiance_pass =
            RadianceGenerator::new(tables, &source_textures, &radiance, descriptor.cycle_period)?;
        let downsample = ConvolutionPyramid::new(tables, &radiance, &irradiance)?;
        let upsample = CosineUpsamplePyramid::new(tables, &radiance, &irradiance, in_place)?;
        let sh = SphericalHarmonicsProjector::new(
            device,
            tables,
            &mut tracker,
            &radiance,
            descriptor.sh_order,
            descriptor.proxy_size,
        )?;

        log::info!(
            "LightProbe: {} source(s), {width}x{height} {:?}, {num_levels} levels, SH order {}, in-place upsample {}",
            source_textures.len(),
            descriptor.format,
            descriptor.sh_order,
            if in_place { "enabled" } else { "disabled" }
        );

        Ok(Self {
            device: Arc::clone(device),
            descriptor,
            sources: source_textures,
            radiance,
            irradiance,
            tracker,
            pipelines,
            radiance_pass,
            downsample,
            upsample,
            sh,
        })
    }

    /// Load cube cross images from `paths` and create a probe from them.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::TextureLoadFailed`] if a file cannot be read
    /// or is not a cube cross, and any error of [`LightProbe::init`].
    pub fn load(
        device: &Arc<GraphicsDevice>,
        cmd: &mut CommandList,
        tables: &mut DescriptorTableCache,
        uploaders: &mut Vec<Arc<Buffer>>,
        paths: &[impl AsRef<Path>],
        descriptor: LightProbeDescriptor,
    ) -> Result<Self, GraphicsError> {
        let sources = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                log::info!("LightProbe: loading '{}'", path.display());
                load_cross_cube(path)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::init(device, cmd, tables, uploaders, &sources, descriptor)
    }

    /// Compute this frame's cross-fade constants. CPU only.
    pub fn update_frame(&mut self, time: f64, frame_index: usize) {
        self.radiance_pass.update(time, frame_index);
    }

    /// Record one frame of filtering into `cmd`.
    ///
    /// Returns the pipeline type that was recorded: `Compute` falls back to
    /// `Hybrid` when the in-place upsample is unavailable.
    pub fn process(
        &mut self,
        cmd: &mut CommandList,
        frame_index: usize,
        requested: PipelineType,
    ) -> Result<PipelineType, GraphicsError> {
        lightprobe_core::profile_function!();
        let pipeline_type = requested.resolve(self.upsample.has_in_place());
        if pipeline_type != requested {
            log::debug!("LightProbe: {requested} unavailable, recording {pipeline_type}");
        }

        self.radiance_pass.record(
            cmd,
            &mut self.tracker,
            &self.pipelines,
            &self.radiance,
            frame_index,
        )?;

        let (down, up) = match pipeline_type {
            PipelineType::Hybrid => (DownsampleStage::Compute, UpsampleStage::Graphics),
            PipelineType::Graphics => (DownsampleStage::Graphics, UpsampleStage::Graphics),
            PipelineType::Compute => (DownsampleStage::Compute, UpsampleStage::InPlace),
            PipelineType::Sh => {
                self.sh
                    .record(cmd, &mut self.tracker, &self.pipelines, &self.radiance)?;
                return Ok(pipeline_type);
            }
        };

        self.downsample.record(
            cmd,
            &mut self.tracker,
            &self.pipelines,
            down,
            &self.radiance,
            &self.irradiance,
        )?;
        self.upsample.record(
            cmd,
            &mut self.tracker,
            &self.pipelines,
            up,
            &self.radiance,
            &self.irradiance,
        )?;
        Ok(pipeline_type)
    }

    /// The device the probe was created on.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Creation parameters.
    pub fn descriptor(&self) -> &LightProbeDescriptor {
        &self.descriptor
    }

    /// Uploaded source cubes.
    pub fn sources(&self) -> &[Arc<Texture>] {
        &self.sources
    }

    /// Irradiance cube; level 0 holds the result of the last pyramid frame.
    pub fn irradiance(&self) -> &Arc<Texture> {
        &self.irradiance
    }

    /// Radiance cube.
    pub fn radiance(&self) -> &Arc<Texture> {
        &self.radiance
    }

    /// Buffer holding the normalized SH coefficients of the last SH frame.
    pub fn sh(&self) -> &Arc<Buffer> {
        self.sh.coefficients()
    }

    /// SH projector.
    pub fn sh_projector(&self) -> &SphericalHarmonicsProjector {
        &self.sh
    }

    /// SH order.
    pub fn sh_order(&self) -> u32 {
        self.sh.order()
    }

    /// Mip levels of the irradiance cube.
    pub fn num_levels(&self) -> u32 {
        self.irradiance.mip_level_count()
    }

    /// Downsample (and upsample) passes per frame.
    pub fn num_passes(&self) -> u32 {
        self.downsample.num_passes()
    }

    /// Returns true if the in-place compute upsample is available.
    pub fn typed_uav(&self) -> bool {
        self.upsample.has_in_place()
    }

    /// Pipelines created for the probe.
    pub fn pipelines(&self) -> &PipelineSet {
        &self.pipelines
    }

    /// Tracked state of a subresource owned by the probe.
    pub fn state(&self, subresource: Subresource) -> Option<ResourceState> {
        self.tracker.state(subresource)
    }

    /// Read back the normalized SH coefficients.
    pub fn read_sh(&self) -> Result<ShCoefficients, GraphicsError> {
        self.sh.read(&self.device)
    }

    /// Read back one level of the irradiance cube.
    pub fn read_irradiance(&self, level: u32) -> Result<CubeImage, GraphicsError> {
        read_cube(&self.device, &self.irradiance, level)
    }

    /// Read back the radiance cube.
    pub fn read_radiance(&self) -> Result<CubeImage, GraphicsError> {
        read_cube(&self.device, &self.radiance, 0)
    }
}

impl std::fmt::Debug for LightProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightProbe")
            .field("sources", &self.sources.len())
            .field("radiance", &self.radiance)
            .field("irradiance", &self.irradiance)
            .field("pipelines", &self.pipelines.len())
            .field("sh_order", &self.sh.order())
            .finish()
    }
}

/// Create a source cube and record its upload.
fn upload_source(
    device: &Arc<GraphicsDevice>,
    cmd: &mut CommandList,
    tracker: &mut StateTracker,
    uploaders: &mut Vec<Arc<Buffer>>,
    descriptor: &LightProbeDescriptor,
    index: usize,
    image: &CubeImage,
) -> Result<Arc<Texture>, GraphicsError> {
    let texture = device.create_texture(
        &TextureDescriptor::new_cube(
            image.width(),
            image.height(),
            TextureFormat::Rgba32Float,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )
        .with_label(descriptor.resource_label(&format!("source_{index}"))),
    )?;

    let bytes = image.to_bytes();
    let staging = device.create_buffer(
        &BufferDescriptor::new(
            bytes.len() as u64,
            BufferUsage::COPY_SRC | BufferUsage::MAP_WRITE,
        )
        .with_label(descriptor.resource_label(&format!("source_{index}_upload"))),
    )?;
    device.write_buffer(&staging, 0, &bytes)?;

    tracker.register_buffer(&staging, ResourceState::Common);
    tracker.register_texture(&texture, ResourceState::Common);

    let mut batch = BarrierBatch::new();
    batch.transition(
        tracker,
        Subresource::Buffer(staging.id()),
        ResourceState::CopySource,
    );
    batch.transition_mip(tracker, &texture, 0, ResourceState::CopyDest);
    batch.flush(cmd);
    cmd.copy_buffer_to_texture(&staging, &texture, 0);
    batch.transition_mip(tracker, &texture, 0, ResourceState::ShaderRead);
    batch.flush(cmd);

    tracker.forget_buffer(staging.id());
    uploaders.push(staging);
    Ok(texture)
}

/// Create every pipeline the probe records.
///
/// The in-place upsample passes are skipped without typed UAV loads, and
/// when the device rejects them as unsupported.
fn create_pipelines(
    device: &GraphicsDevice,
    format: TextureFormat,
    typed_uav: bool,
) -> Result<PipelineSet, GraphicsError> {
    let mut pipelines = PipelineSet::new();
    for pass in PassId::ALL {
        if pass.needs_typed_uav_load() && !typed_uav {
            log::debug!("LightProbe: skipping '{}' without typed UAV loads", pass.label());
            continue;
        }
        let descriptor = PipelineDescriptor::new(pass).with_format(format);
        match device.create_pipeline(&descriptor) {
            Ok(pipeline) => pipelines.insert(pipeline),
            Err(GraphicsError::FeatureNotSupported(message)) if pass.needs_typed_uav_load() => {
                log::warn!("LightProbe: '{}' unavailable: {message}", pass.label());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(pipelines)
}

fn read_cube(
    device: &GraphicsDevice,
    texture: &Texture,
    level: u32,
) -> Result<CubeImage, GraphicsError> {
    let texels = device.read_texture(texture, level)?;
    let extent = texture.mip_size(level);
    CubeImage::from_layers(extent.width, extent.height, &texels).map_err(GraphicsError::from)
}
