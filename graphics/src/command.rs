//! Command recording.
//!
//! A [`CommandList`] is the single command stream a frame records into. It is
//! plain data: backends consume it in [`GraphicsDevice::submit`], and two
//! lists can be compared to check that two code paths record the same work.
//!
//! [`GraphicsDevice::submit`]: crate::GraphicsDevice::submit

use std::sync::Arc;

use crate::barrier::ResourceBarrier;
use crate::descriptor::DescriptorTable;
use crate::pipeline::Pipeline;
use crate::resources::{Buffer, Texture};
use crate::types::{BufferId, PipelineId, TextureId};

/// Vertices of the full-screen triangle used by every graphics pass.
pub const FULLSCREEN_TRIANGLE_VERTICES: u32 = 3;

/// A recorded GPU command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A batch of state transitions.
    Barrier(Vec<ResourceBarrier>),
    /// Copy a tightly packed RGBA32F buffer into every layer of a mip level.
    CopyBufferToTexture {
        /// Source buffer.
        buffer: BufferId,
        /// Destination texture.
        texture: TextureId,
        /// Destination mip level.
        mip: u32,
    },
    /// Copy every layer of one mip level into another texture of equal extent.
    CopyTexture {
        /// Source texture.
        src: TextureId,
        /// Source mip level.
        src_mip: u32,
        /// Destination texture.
        dst: TextureId,
        /// Destination mip level.
        dst_mip: u32,
    },
    /// Compute dispatch.
    Dispatch {
        /// Compute pipeline.
        pipeline: PipelineId,
        /// Bound views.
        table: Arc<DescriptorTable>,
        /// Push-constant bytes.
        constants: Vec<u8>,
        /// Thread group counts.
        groups: [u32; 3],
    },
    /// Instanced full-screen draw; instance `i` renders array layer `i`.
    Draw {
        /// Graphics pipeline.
        pipeline: PipelineId,
        /// Bound views; the render target is the table's RTV entry.
        table: Arc<DescriptorTable>,
        /// Push-constant bytes.
        constants: Vec<u8>,
        /// Vertices per instance.
        vertex_count: u32,
        /// Instances (layers).
        instance_count: u32,
    },
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Barrier(_) => "barrier",
            Self::CopyBufferToTexture { .. } => "copy_buffer_to_texture",
            Self::CopyTexture { .. } => "copy_texture",
            Self::Dispatch { .. } => "dispatch",
            Self::Draw { .. } => "draw",
        }
    }
}

/// An ordered list of recorded commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandList {
    label: String,
    commands: Vec<Command>,
}

impl CommandList {
    /// Create an empty command list.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Record a barrier batch. Empty batches are dropped.
    pub fn barrier(&mut self, barriers: Vec<ResourceBarrier>) {
        if !barriers.is_empty() {
            self.commands.push(Command::Barrier(barriers));
        }
    }

    /// Record an upload of `buffer` into mip `mip` of `texture`.
    pub fn copy_buffer_to_texture(&mut self, buffer: &Buffer, texture: &Texture, mip: u32) {
        self.commands.push(Command::CopyBufferToTexture {
            buffer: buffer.id(),
            texture: texture.id(),
            mip,
        });
    }

    /// Record a copy of one mip level between textures.
    pub fn copy_texture(&mut self, src: &Texture, src_mip: u32, dst: &Texture, dst_mip: u32) {
        self.commands.push(Command::CopyTexture {
            src: src.id(),
            src_mip,
            dst: dst.id(),
            dst_mip,
        });
    }

    /// Record a compute dispatch.
    pub fn dispatch<T: bytemuck::Pod>(
        &mut self,
        pipeline: &Pipeline,
        table: &Arc<DescriptorTable>,
        constants: &T,
        groups: [u32; 3],
    ) {
        log::trace!(
            "CommandList '{}': dispatch {:?} {:?}",
            self.label,
            pipeline.pass(),
            groups
        );
        self.commands.push(Command::Dispatch {
            pipeline: pipeline.id(),
            table: Arc::clone(table),
            constants: bytemuck::bytes_of(constants).to_vec(),
            groups,
        });
    }

    /// Record a full-screen draw over `layers` array layers.
    pub fn draw_layers<T: bytemuck::Pod>(
        &mut self,
        pipeline: &Pipeline,
        table: &Arc<DescriptorTable>,
        constants: &T,
        layers: u32,
    ) {
        log::trace!(
            "CommandList '{}': draw {:?} x{}",
            self.label,
            pipeline.pass(),
            layers
        );
        self.commands.push(Command::Draw {
            pipeline: pipeline.id(),
            table: Arc::clone(table),
            constants: bytemuck::bytes_of(constants).to_vec(),
            vertex_count: FULLSCREEN_TRIANGLE_VERTICES,
            instance_count: layers,
        });
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Recorded commands in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of recorded commands with the given [`Command::name`].
    pub fn count(&self, name: &str) -> usize {
        self.commands.iter().filter(|c| c.name() == name).count()
    }

    /// Remove every recorded command, keeping the label.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrier::{ResourceState, Subresource};

    #[test]
    fn test_empty_barrier_dropped() {
        let mut cmd = CommandList::new("frame");
        cmd.barrier(Vec::new());
        assert!(cmd.is_empty());
    }

    #[test]
    fn test_count_by_name() {
        let mut cmd = CommandList::new("frame");
        cmd.barrier(vec![ResourceBarrier {
            subresource: Subresource::Buffer(BufferId(1)),
            before: ResourceState::Common,
            after: ResourceState::ShaderRead,
        }]);
        cmd.commands.push(Command::CopyTexture {
            src: TextureId(1),
            src_mip: 0,
            dst: TextureId(2),
            dst_mip: 0,
        });
        assert_eq!(cmd.len(), 2);
        assert_eq!(cmd.count("barrier"), 1);
        assert_eq!(cmd.count("copy_texture"), 1);
        assert_eq!(cmd.count("dispatch"), 0);

        cmd.clear();
        assert!(cmd.is_empty());
        assert_eq!(cmd.label(), "frame");
    }
}
