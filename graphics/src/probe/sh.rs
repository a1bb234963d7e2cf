//! Spherical-harmonics projection.
//!
//! The radiance cube is projected onto `order²` SH terms in three stages:
//! a transform writes one partial sum per thread group, a tree of sum passes
//! folds the partials 64 at a time, and a single normalize group rescales
//! the total so the solid-angle weights integrate to `4π`. Partials ping-pong
//! between two buffer slots; the slot holding the latest result is tracked
//! by [`ShBuffers`].

use std::sync::Arc;

use lightprobe_core::cube::CUBE_FACE_COUNT;
use lightprobe_core::sh::{MAX_SH_ORDER, ShCoefficients, term_count};

use crate::barrier::{BarrierBatch, ResourceState, StateTracker, Subresource};
use crate::command::CommandList;
use crate::descriptor::{Descriptor, DescriptorTable, DescriptorTableCache};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::pipeline::{PassId, Pipeline, PipelineSet, SH_GROUP_SIZE, ShConstants};
use crate::resources::{Buffer, Texture};
use crate::types::{BufferDescriptor, BufferUsage};

/// Bytes of one RGB coefficient.
const COEFFICIENT_BYTES: u64 = 3 * std::mem::size_of::<f32>() as u64;

/// One of the two ping-pong buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShSlot {
    /// Slot written by the transform pass.
    #[default]
    Front,
    /// The other slot.
    Back,
}

impl ShSlot {
    /// The opposite slot.
    pub fn other(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Array index of the slot.
    pub fn index(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Back => 1,
        }
    }
}

/// Number of thread groups the transform pass runs over a proxy cube.
pub fn max_groups(proxy_size: u32) -> u32 {
    (CUBE_FACE_COUNT * proxy_size * proxy_size).div_ceil(SH_GROUP_SIZE)
}

/// Number of sum passes needed to fold `groups` partials into one.
pub fn reduction_passes(groups: u32) -> u32 {
    let mut n = groups;
    let mut passes = 0;
    while n > 1 {
        n = n.div_ceil(SH_GROUP_SIZE);
        passes += 1;
    }
    passes
}

/// Coefficient and weight buffers of both slots.
#[derive(Debug)]
pub struct ShBuffers {
    coefficients: [Arc<Buffer>; 2],
    weights: [Arc<Buffer>; 2],
    current: ShSlot,
}

impl ShBuffers {
    /// Allocate both slots for `groups` partial sums of `terms` coefficients.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        terms: usize,
        groups: u32,
    ) -> Result<Self, GraphicsError> {
        let usage = BufferUsage::STORAGE | BufferUsage::COPY_SRC;
        let coefficient_size = groups as u64 * terms as u64 * COEFFICIENT_BYTES;
        let weight_size = groups as u64 * std::mem::size_of::<f32>() as u64;

        let create = |label: &str, size: u64| {
            device.create_buffer(&BufferDescriptor::new(size, usage).with_label(label))
        };
        Ok(Self {
            coefficients: [
                create("sh_coefficients_front", coefficient_size)?,
                create("sh_coefficients_back", coefficient_size)?,
            ],
            weights: [
                create("sh_weights_front", weight_size)?,
                create("sh_weights_back", weight_size)?,
            ],
            current: ShSlot::Front,
        })
    }

    /// Slot holding the latest result.
    pub fn current(&self) -> ShSlot {
        self.current
    }

    /// Coefficient buffer of `slot`.
    pub fn coefficients(&self, slot: ShSlot) -> &Arc<Buffer> {
        &self.coefficients[slot.index()]
    }

    /// Weight buffer of `slot`.
    pub fn weights(&self, slot: ShSlot) -> &Arc<Buffer> {
        &self.weights[slot.index()]
    }

    /// Make `Front` current again.
    pub fn reset(&mut self) {
        self.current = ShSlot::Front;
    }

    /// Swap source and destination.
    pub fn flip(&mut self) {
        self.current = self.current.other();
    }

    fn register(&self, tracker: &mut StateTracker) {
        for buffer in self.coefficients.iter().chain(self.weights.iter()) {
            tracker.register_buffer(buffer, ResourceState::Common);
        }
    }

    fn transition(
        &self,
        batch: &mut BarrierBatch,
        tracker: &mut StateTracker,
        slot: ShSlot,
        after: ResourceState,
    ) {
        batch.transition(tracker, Subresource::Buffer(self.coefficients(slot).id()), after);
        batch.transition(tracker, Subresource::Buffer(self.weights(slot).id()), after);
    }
}

/// Records the SH transform, sum tree and normalize passes.
#[derive(Debug)]
pub struct SphericalHarmonicsProjector {
    order: u32,
    proxy_size: u32,
    max_groups: u32,
    buffers: ShBuffers,
    transform_table: Arc<DescriptorTable>,
    /// Indexed by the source slot of a pass.
    reduce_tables: [Arc<DescriptorTable>; 2],
}

impl SphericalHarmonicsProjector {
    /// Allocate the slot buffers and tables and register them in `tracker`.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        tables: &mut DescriptorTableCache,
        tracker: &mut StateTracker,
        radiance: &Texture,
        order: u32,
        proxy_size: u32,
    ) -> Result<Self, GraphicsError> {
        if !(1..=MAX_SH_ORDER).contains(&order) {
            return Err(GraphicsError::InvalidParameter(format!(
                "SH order {order} outside 1..={MAX_SH_ORDER}"
            )));
        }
        if proxy_size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "SH proxy size cannot be zero".to_string(),
            ));
        }

        let max_groups = max_groups(proxy_size);
        let buffers = ShBuffers::new(device, term_count(order), max_groups)?;
        buffers.register(tracker);

        let front = ShSlot::Front;
        let transform_table = tables.allocate(
            "sh_transform",
            vec![
                Descriptor::Srv(radiance.mip_view(0)),
                Descriptor::BufferUav(buffers.coefficients(front).id()),
                Descriptor::BufferUav(buffers.weights(front).id()),
            ],
        )?;
        let reduce_table = |tables: &mut DescriptorTableCache, src: ShSlot| {
            let dst = src.other();
            tables.allocate(
                format!("sh_reduce_{}", src.index()),
                vec![
                    Descriptor::BufferSrv(buffers.coefficients(src).id()),
                    Descriptor::BufferSrv(buffers.weights(src).id()),
                    Descriptor::BufferUav(buffers.coefficients(dst).id()),
                    Descriptor::BufferUav(buffers.weights(dst).id()),
                ],
            )
        };
        let reduce_tables = [
            reduce_table(tables, ShSlot::Front)?,
            reduce_table(tables, ShSlot::Back)?,
        ];

        log::debug!(
            "SphericalHarmonicsProjector: order {order}, proxy {proxy_size}, {max_groups} groups, {} sum passes",
            reduction_passes(max_groups)
        );

        Ok(Self {
            order,
            proxy_size,
            max_groups,
            buffers,
            transform_table,
            reduce_tables,
        })
    }

    /// SH order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Face size of the projection proxy.
    pub fn proxy_size(&self) -> u32 {
        self.proxy_size
    }

    /// Groups of the transform pass.
    pub fn max_groups(&self) -> u32 {
        self.max_groups
    }

    /// Slot buffers.
    pub fn buffers(&self) -> &ShBuffers {
        &self.buffers
    }

    /// Buffer holding the normalized coefficients after the last frame.
    pub fn coefficients(&self) -> &Arc<Buffer> {
        self.buffers.coefficients(self.buffers.current())
    }

    /// Record transform, sum tree and normalize.
    ///
    /// The radiance cube must hold this frame's radiance. The result is left
    /// shader-readable in the current slot.
    pub fn record(
        &mut self,
        cmd: &mut CommandList,
        tracker: &mut StateTracker,
        pipelines: &PipelineSet,
        radiance: &Texture,
    ) -> Result<(), GraphicsError> {
        lightprobe_core::profile_scope!("SphericalHarmonicsProjector::record");
        let texels = CUBE_FACE_COUNT * self.proxy_size * self.proxy_size;
        let mut batch = BarrierBatch::new();

        self.buffers.reset();
        batch.transition_mip(tracker, radiance, 0, ResourceState::ShaderRead);
        self.buffers
            .transition(&mut batch, tracker, ShSlot::Front, ResourceState::UnorderedAccess);
        batch.flush(cmd);
        cmd.dispatch(
            pipelines.require(PassId::ShTransform)?,
            &self.transform_table,
            &ShConstants::new(self.order, self.proxy_size, texels),
            [self.max_groups, 1, 1],
        );

        let sum = pipelines.require(PassId::ShSum)?;
        lightprobe_core::profile_plot!("sh_reduction_passes", reduction_passes(self.max_groups));
        let mut n = self.max_groups;
        while n > 1 {
            let groups = n.div_ceil(SH_GROUP_SIZE);
            self.fold(cmd, tracker, &mut batch, sum, n, groups);
            n = groups;
        }

        let normalize = pipelines.require(PassId::ShNormalize)?;
        self.fold(cmd, tracker, &mut batch, normalize, 1, 1);

        self.buffers
            .transition(&mut batch, tracker, self.buffers.current(), ResourceState::ShaderRead);
        batch.flush(cmd);
        Ok(())
    }

    /// One reduction pass from the current slot into the other, then flip.
    fn fold(
        &mut self,
        cmd: &mut CommandList,
        tracker: &mut StateTracker,
        batch: &mut BarrierBatch,
        pipeline: &Pipeline,
        count: u32,
        groups: u32,
    ) {
        let src = self.buffers.current();
        self.buffers
            .transition(batch, tracker, src, ResourceState::ShaderRead);
        self.buffers
            .transition(batch, tracker, src.other(), ResourceState::UnorderedAccess);
        batch.flush(cmd);

        cmd.dispatch(
            pipeline,
            &self.reduce_tables[src.index()],
            &ShConstants::new(self.order, self.proxy_size, count),
            [groups, 1, 1],
        );
        self.buffers.flip();
    }

    /// Read the normalized coefficients back from the device.
    pub fn read(&self, device: &GraphicsDevice) -> Result<ShCoefficients, GraphicsError> {
        let bytes = device.read_buffer(self.coefficients())?;
        let needed = term_count(self.order) * COEFFICIENT_BYTES as usize;
        if bytes.len() < needed {
            return Err(GraphicsError::Internal(format!(
                "SH buffer holds {} bytes, {needed} needed",
                bytes.len()
            )));
        }
        let values: Vec<[f32; 3]> = bytes[..needed]
            .chunks_exact(COEFFICIENT_BYTES as usize)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        Ok(ShCoefficients::from_rgb(self.order, &values))
    }
}
