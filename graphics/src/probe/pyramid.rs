//! Mip-pyramid convolution.
//!
//! The irradiance cube is produced by a V-cycle over its mip chain. The
//! [`ConvolutionPyramid`] walks down, box-filtering the radiance cube into
//! levels `1..L`. The [`CosineUpsamplePyramid`] walks back up, blending a
//! cosine-weighted upsample of each coarser level over the finer one until
//! level 0 holds the result.

use std::sync::Arc;

use crate::barrier::{BarrierBatch, ResourceState, StateTracker};
use crate::command::CommandList;
use crate::descriptor::{Descriptor, DescriptorTable, DescriptorTableCache};
use crate::error::GraphicsError;
use crate::pipeline::{
    CosineConstants, PassId, PipelineSet, ResampleConstants, TEXTURE_GROUP_SIZE,
};
use crate::resources::{Texture, TextureView};

/// How the downsample stage writes its destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownsampleStage {
    /// Compute dispatches through UAVs.
    Compute,
    /// Full-screen draws into RTVs.
    Graphics,
}

impl DownsampleStage {
    fn write_state(self) -> ResourceState {
        match self {
            Self::Compute => ResourceState::UnorderedAccess,
            Self::Graphics => ResourceState::RenderTarget,
        }
    }
}

/// How the upsample stage writes its destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsampleStage {
    /// Full-screen draws with straight-alpha blending.
    Graphics,
    /// Compute dispatches that load and store the destination in place.
    InPlace,
}

impl UpsampleStage {
    fn write_state(self) -> ResourceState {
        match self {
            Self::Graphics => ResourceState::RenderTarget,
            Self::InPlace => ResourceState::UnorderedAccess,
        }
    }
}

/// Thread groups covering a `width x height` cube level.
pub fn texture_groups(width: u32, height: u32) -> [u32; 3] {
    [
        width.div_ceil(TEXTURE_GROUP_SIZE),
        height.div_ceil(TEXTURE_GROUP_SIZE),
        lightprobe_core::cube::CUBE_FACE_COUNT,
    ]
}

/// Downsample stage of the pyramid.
#[derive(Debug)]
pub struct ConvolutionPyramid {
    compute_tables: Vec<Arc<DescriptorTable>>,
    graphics_tables: Vec<Arc<DescriptorTable>>,
}

impl ConvolutionPyramid {
    /// Build the per-pass tables.
    ///
    /// Table `i` reads source level `i` (the radiance cube for `i == 0`,
    /// irradiance level `i` otherwise) and writes irradiance level `i + 1`.
    /// The last table writes the seed level.
    pub fn new(
        tables: &mut DescriptorTableCache,
        radiance: &Texture,
        irradiance: &Texture,
    ) -> Result<Self, GraphicsError> {
        let passes = irradiance.mip_level_count().saturating_sub(1);
        let mut compute_tables = Vec::with_capacity(passes as usize);
        let mut graphics_tables = Vec::with_capacity(passes as usize);

        for i in 0..passes {
            let source = if i == 0 {
                radiance.mip_view(0)
            } else {
                irradiance.mip_view(i)
            };
            let destination = irradiance.mip_view(i + 1);
            let label = if i + 1 == passes {
                "downsample_final".to_string()
            } else {
                format!("downsample_{i}")
            };
            compute_tables.push(tables.allocate(
                format!("{label}_cs"),
                vec![Descriptor::Srv(source), Descriptor::Uav(destination)],
            )?);
            graphics_tables.push(tables.allocate(
                format!("{label}_ps"),
                vec![Descriptor::Srv(source), Descriptor::Rtv(destination)],
            )?);
        }

        Ok(Self {
            compute_tables,
            graphics_tables,
        })
    }

    /// Number of downsample passes (`L - 1`).
    pub fn num_passes(&self) -> u32 {
        self.compute_tables.len() as u32
    }

    /// Record the downsample walk.
    ///
    /// With a single level the radiance cube is copied into irradiance level
    /// 0 instead.
    pub fn record(
        &self,
        cmd: &mut CommandList,
        tracker: &mut StateTracker,
        pipelines: &PipelineSet,
        stage: DownsampleStage,
        radiance: &Texture,
        irradiance: &Texture,
    ) -> Result<(), GraphicsError> {
        lightprobe_core::profile_scope!("ConvolutionPyramid::record");
        let passes = self.num_passes();
        let mut batch = BarrierBatch::new();

        if passes == 0 {
            batch.transition_mip(tracker, radiance, 0, ResourceState::CopySource);
            batch.transition_mip(tracker, irradiance, 0, ResourceState::CopyDest);
            batch.flush(cmd);
            cmd.copy_texture(radiance, 0, irradiance, 0);
            return Ok(());
        }

        let write = stage.write_state();
        batch.transition_mip(tracker, radiance, 0, ResourceState::ShaderRead);
        for level in 1..irradiance.mip_level_count() {
            batch.transition_mip(tracker, irradiance, level, write);
        }
        batch.flush(cmd);

        let (pass, tables) = match stage {
            DownsampleStage::Compute => (PassId::Resample, &self.compute_tables),
            DownsampleStage::Graphics => (PassId::ResampleGraphics, &self.graphics_tables),
        };
        let pipeline = pipelines.require(pass)?;

        for (i, table) in (0..passes).zip(tables.iter()) {
            if i > 0 {
                batch.transition_mip(tracker, irradiance, i, ResourceState::ShaderRead);
                batch.flush(cmd);
            }

            let level = i + 1;
            let extent = irradiance.mip_size(level);
            let constants = ResampleConstants::new(level, extent.width, extent.height);
            match stage {
                DownsampleStage::Compute => cmd.dispatch(
                    pipeline,
                    table,
                    &constants,
                    texture_groups(extent.width, extent.height),
                ),
                DownsampleStage::Graphics => {
                    cmd.draw_layers(pipeline, table, &constants, irradiance.array_layers())
                }
            }
        }
        Ok(())
    }
}

/// Upsample stage of the pyramid.
#[derive(Debug)]
pub struct CosineUpsamplePyramid {
    map_size: u32,
    graphics_tables: Vec<Arc<DescriptorTable>>,
    in_place_tables: Option<Vec<Arc<DescriptorTable>>>,
}

impl CosineUpsamplePyramid {
    /// Build the per-pass tables.
    ///
    /// Table `j` reads irradiance level `j + 1` and writes level `j`. Table 0
    /// also reads the radiance cube. In-place tables are only built when
    /// `in_place` is set.
    pub fn new(
        tables: &mut DescriptorTableCache,
        radiance: &Texture,
        irradiance: &Texture,
        in_place: bool,
    ) -> Result<Self, GraphicsError> {
        let passes = irradiance.mip_level_count().saturating_sub(1);
        let build = |tables: &mut DescriptorTableCache,
                     suffix: &str,
                     write: fn(TextureView) -> Descriptor|
         -> Result<Vec<Arc<DescriptorTable>>, GraphicsError> {
            (0..passes)
                .map(|j| {
                    let coarse = Descriptor::Srv(irradiance.mip_view(j + 1));
                    let target = write(irradiance.mip_view(j));
                    if j == 0 {
                        tables.allocate(
                            format!("upsample_final_{suffix}"),
                            vec![coarse, Descriptor::Srv(radiance.mip_view(0)), target],
                        )
                    } else {
                        tables.allocate(format!("upsample_{j}_{suffix}"), vec![coarse, target])
                    }
                })
                .collect()
        };

        let graphics_tables = build(tables, "ps", Descriptor::Rtv)?;
        let in_place_tables = if in_place {
            Some(build(tables, "cs", Descriptor::Uav)?)
        } else {
            None
        };

        let size = radiance.size();
        Ok(Self {
            map_size: (size.width + size.height) / 2,
            graphics_tables,
            in_place_tables,
        })
    }

    /// Average face size of the radiance cube.
    pub fn map_size(&self) -> u32 {
        self.map_size
    }

    /// Returns true if the in-place tables exist.
    pub fn has_in_place(&self) -> bool {
        self.in_place_tables.is_some()
    }

    /// Constants of the pass writing `level`.
    pub fn constants(&self, num_levels: u32, level: u32) -> CosineConstants {
        CosineConstants::new(self.map_size, num_levels, level)
    }

    /// Record the upsample walk and leave every level shader-readable.
    pub fn record(
        &self,
        cmd: &mut CommandList,
        tracker: &mut StateTracker,
        pipelines: &PipelineSet,
        stage: UpsampleStage,
        radiance: &Texture,
        irradiance: &Texture,
    ) -> Result<(), GraphicsError> {
        lightprobe_core::profile_scope!("CosineUpsamplePyramid::record");
        let num_levels = irradiance.mip_level_count();
        let passes = num_levels.saturating_sub(1);
        let mut batch = BarrierBatch::new();

        if passes > 0 {
            let (tables, pass, final_pass) = match stage {
                UpsampleStage::Graphics => (
                    &self.graphics_tables,
                    PassId::UpsampleGraphics,
                    PassId::UpsampleGraphicsFinal,
                ),
                UpsampleStage::InPlace => (
                    self.in_place_tables.as_ref().ok_or_else(|| {
                        GraphicsError::Internal("in-place upsample tables were not built".into())
                    })?,
                    PassId::UpsampleInPlace,
                    PassId::UpsampleInPlaceFinal,
                ),
            };

            let write = stage.write_state();
            for j in (0..passes).rev() {
                batch.transition_mip(tracker, irradiance, j + 1, ResourceState::ShaderRead);
                batch.transition_mip(tracker, irradiance, j, write);
                if j == 0 {
                    batch.transition_mip(tracker, radiance, 0, ResourceState::ShaderRead);
                }
                batch.flush(cmd);

                let pipeline = pipelines.require(if j == 0 { final_pass } else { pass })?;
                let table = &tables[j as usize];
                let constants = self.constants(num_levels, j);
                match stage {
                    UpsampleStage::Graphics => {
                        cmd.draw_layers(pipeline, table, &constants, irradiance.array_layers())
                    }
                    UpsampleStage::InPlace => {
                        let extent = irradiance.mip_size(j);
                        cmd.dispatch(
                            pipeline,
                            table,
                            &constants,
                            texture_groups(extent.width, extent.height),
                        )
                    }
                }
            }
        }

        for level in 0..num_levels {
            batch.transition_mip(tracker, irradiance, level, ResourceState::ShaderRead);
        }
        batch.transition_mip(tracker, radiance, 0, ResourceState::ShaderRead);
        batch.flush(cmd);
        Ok(())
    }
}
