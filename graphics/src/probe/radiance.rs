//! Radiance cross-fade.
//!
//! Every frame the radiance cube is redrawn as a blend of two consecutive
//! source cubes. Each source is shown for `cycle_period` seconds and fades
//! into the next one over that period; the last source wraps to the first.

use std::sync::Arc;

use crate::barrier::{BarrierBatch, ResourceState, StateTracker};
use crate::command::CommandList;
use crate::descriptor::{Descriptor, DescriptorTable, DescriptorTableCache};
use crate::error::GraphicsError;
use crate::pipeline::{PassId, PipelineSet, RadianceConstants};
use crate::resources::Texture;

use super::FRAME_COUNT;

/// Source index and blend weight at `time`.
///
/// `index = floor(time / period) mod count`, `blend = fract(time / period)`.
/// A non-positive period or a single source never blends.
pub fn cross_fade_schedule(time: f64, period: f64, count: usize) -> (usize, f32) {
    if count == 0 || period <= 0.0 || !time.is_finite() {
        return (0, 0.0);
    }
    let cycles = time / period;
    let whole = cycles.floor();
    let index = (whole as i64).rem_euclid(count as i64) as usize;
    let blend = if count == 1 { 0.0 } else { (cycles - whole) as f32 };
    (index, blend)
}

/// Records the radiance pass.
#[derive(Debug)]
pub struct RadianceGenerator {
    tables: Vec<Arc<DescriptorTable>>,
    cycle_period: f64,
    frames: [RadianceConstants; FRAME_COUNT],
}

impl RadianceGenerator {
    /// Build one table per source: `[SRV source k, SRV source k+1, RTV radiance]`.
    pub fn new(
        tables: &mut DescriptorTableCache,
        sources: &[Arc<Texture>],
        radiance: &Texture,
        cycle_period: f64,
    ) -> Result<Self, GraphicsError> {
        let count = sources.len();
        let tables = (0..count)
            .map(|k| {
                let next = (k + 1) % count;
                tables.allocate(
                    format!("radiance_{k}"),
                    vec![
                        Descriptor::Srv(sources[k].mip_view(0)),
                        Descriptor::Srv(sources[next].mip_view(0)),
                        Descriptor::Rtv(radiance.mip_view(0)),
                    ],
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tables,
            cycle_period,
            frames: [RadianceConstants::new(0.0, 0); FRAME_COUNT],
        })
    }

    /// Number of sources.
    pub fn source_count(&self) -> usize {
        self.tables.len()
    }

    /// Compute the constants of `frame_index` for `time`.
    pub fn update(&mut self, time: f64, frame_index: usize) {
        let (index, blend) = cross_fade_schedule(time, self.cycle_period, self.tables.len());
        self.frames[frame_index % FRAME_COUNT] = RadianceConstants::new(blend, index as u32);
    }

    /// Constants last computed for `frame_index`.
    pub fn constants(&self, frame_index: usize) -> RadianceConstants {
        self.frames[frame_index % FRAME_COUNT]
    }

    /// Draw the blended sources into radiance level 0.
    pub fn record(
        &self,
        cmd: &mut CommandList,
        tracker: &mut StateTracker,
        pipelines: &PipelineSet,
        radiance: &Texture,
        frame_index: usize,
    ) -> Result<(), GraphicsError> {
        lightprobe_core::profile_scope!("RadianceGenerator::record");
        let constants = self.constants(frame_index);
        let table = self
            .tables
            .get(constants.source_index as usize)
            .ok_or_else(|| {
                GraphicsError::Internal(format!(
                    "source {} out of {}",
                    constants.source_index,
                    self.tables.len()
                ))
            })?;

        let mut batch = BarrierBatch::new();
        batch.transition_mip(tracker, radiance, 0, ResourceState::RenderTarget);
        batch.flush(cmd);

        cmd.draw_layers(
            pipelines.require(PassId::GenerateRadiance)?,
            table,
            &constants,
            radiance.array_layers(),
        );
        Ok(())
    }
}
