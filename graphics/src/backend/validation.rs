//! Resource-state validation shared by the backends.
//!
//! The validator mirrors what a debug layer does on a real device: it keeps
//! its own copy of every subresource's state, checks the `before` half of each
//! barrier against it and checks that every bound view is in the state its
//! binding kind requires.

use std::collections::HashMap;

use crate::barrier::{ResourceBarrier, ResourceState, StateTracker, Subresource};
use crate::command::Command;
use crate::descriptor::{Descriptor, DescriptorTable};
use crate::error::GraphicsError;
use crate::pipeline::{PipelineDescriptor, PipelineKind};
use crate::types::{BufferId, PipelineId, TextureDescriptor, TextureId};

/// Tracks resource states on the device side and rejects invalid commands.
#[derive(Debug, Default)]
pub struct StateValidator {
    states: StateTracker,
    textures: HashMap<TextureId, TextureDescriptor>,
    buffers: HashMap<BufferId, u64>,
    pipelines: HashMap<PipelineId, PipelineDescriptor>,
}

impl StateValidator {
    /// Create a validator with no known resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a texture; every subresource begins in `Common`.
    pub fn add_texture(&mut self, id: TextureId, descriptor: &TextureDescriptor) {
        self.states.register_texture_id(
            id,
            descriptor.mip_level_count,
            descriptor.array_layers(),
            ResourceState::Common,
        );
        self.textures.insert(id, descriptor.clone());
    }

    /// Start tracking a buffer in `Common`.
    pub fn add_buffer(&mut self, id: BufferId, size: u64) {
        self.states.register_buffer_id(id, ResourceState::Common);
        self.buffers.insert(id, size);
    }

    /// Remember a pipeline's descriptor.
    pub fn add_pipeline(&mut self, id: PipelineId, descriptor: &PipelineDescriptor) {
        self.pipelines.insert(id, descriptor.clone());
    }

    /// Stop tracking a texture.
    pub fn remove_texture(&mut self, id: TextureId) {
        self.states.forget_texture(id);
        self.textures.remove(&id);
    }

    /// Stop tracking a buffer.
    pub fn remove_buffer(&mut self, id: BufferId) {
        self.states.forget_buffer(id);
        self.buffers.remove(&id);
    }

    /// Descriptor of a known texture.
    pub fn texture(&self, id: TextureId) -> Option<&TextureDescriptor> {
        self.textures.get(&id)
    }

    /// Size of a known buffer.
    pub fn buffer_size(&self, id: BufferId) -> Option<u64> {
        self.buffers.get(&id).copied()
    }

    /// Descriptor of a known pipeline.
    pub fn pipeline(&self, id: PipelineId) -> Option<&PipelineDescriptor> {
        self.pipelines.get(&id)
    }

    /// Current state of a subresource.
    pub fn state(&self, subresource: Subresource) -> Option<ResourceState> {
        self.states.state(subresource)
    }

    /// Validate one command and apply its state changes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ResourceState`] for state violations and
    /// [`GraphicsError::InvalidParameter`] for unknown resources or
    /// malformed commands.
    pub fn validate(&mut self, command: &Command) -> Result<(), GraphicsError> {
        match command {
            Command::Barrier(barriers) => self.apply_barriers(barriers),
            Command::CopyBufferToTexture {
                buffer,
                texture,
                mip,
            } => {
                self.expect(Subresource::Buffer(*buffer), ResourceState::CopySource, "copy")?;
                self.expect_mip(*texture, *mip, ResourceState::CopyDest, "copy")
            }
            Command::CopyTexture {
                src,
                src_mip,
                dst,
                dst_mip,
            } => {
                let src_desc = self.known_texture(*src)?;
                let dst_desc = self.known_texture(*dst)?;
                if src_desc.size.mip_level(*src_mip) != dst_desc.size.mip_level(*dst_mip) {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "copy between texture {} mip {src_mip} and texture {} mip {dst_mip} of different extent",
                        src.raw(),
                        dst.raw()
                    )));
                }
                self.expect_mip(*src, *src_mip, ResourceState::CopySource, "copy")?;
                self.expect_mip(*dst, *dst_mip, ResourceState::CopyDest, "copy")
            }
            Command::Dispatch {
                pipeline,
                table,
                groups,
                ..
            } => {
                let desc = self.known_pipeline(*pipeline)?;
                if !desc.kind.is_compute() {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "dispatch with graphics pipeline '{}'",
                        desc.pass.label()
                    )));
                }
                if groups.contains(&0) {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "dispatch of '{}' with empty group count {groups:?}",
                        desc.pass.label()
                    )));
                }
                if table.entries().iter().any(|d| matches!(d, Descriptor::Rtv(_))) {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "render target bound to compute pass '{}'",
                        desc.pass.label()
                    )));
                }
                self.expect_table(table)
            }
            Command::Draw {
                pipeline, table, ..
            } => {
                let desc = self.known_pipeline(*pipeline)?;
                if !matches!(desc.kind, PipelineKind::Graphics { .. }) {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "draw with compute pipeline '{}'",
                        desc.pass.label()
                    )));
                }
                if !table.entries().iter().any(|d| matches!(d, Descriptor::Rtv(_))) {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "draw of '{}' without a render target",
                        desc.pass.label()
                    )));
                }
                self.expect_table(table)
            }
        }
    }

    fn apply_barriers(&mut self, barriers: &[ResourceBarrier]) -> Result<(), GraphicsError> {
        for barrier in barriers {
            let current = self.states.state(barrier.subresource).ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "barrier on unknown {}",
                    barrier.subresource
                ))
            })?;
            if current != barrier.before {
                return Err(GraphicsError::ResourceState(format!(
                    "barrier expects {} in {:?} but it is in {current:?}",
                    barrier.subresource, barrier.before
                )));
            }
            self.states.set(barrier.subresource, barrier.after);
        }
        Ok(())
    }

    fn expect(
        &self,
        subresource: Subresource,
        required: ResourceState,
        usage: &str,
    ) -> Result<(), GraphicsError> {
        match self.states.state(subresource) {
            Some(state) if state == required => Ok(()),
            Some(state) => Err(GraphicsError::ResourceState(format!(
                "{usage} needs {subresource} in {required:?} but it is in {state:?}"
            ))),
            None => Err(GraphicsError::InvalidParameter(format!(
                "{usage} uses unknown {subresource}"
            ))),
        }
    }

    fn expect_mip(
        &self,
        texture: TextureId,
        mip: u32,
        required: ResourceState,
        usage: &str,
    ) -> Result<(), GraphicsError> {
        let layers = self.known_texture(texture)?.array_layers();
        for layer in 0..layers {
            self.expect(Subresource::texture(texture, mip, layer), required, usage)?;
        }
        Ok(())
    }

    fn expect_table(&self, table: &DescriptorTable) -> Result<(), GraphicsError> {
        for descriptor in table.entries() {
            let required = descriptor.required_state();
            for subresource in descriptor.subresources() {
                self.expect(subresource, required, table.label())?;
            }
        }
        Ok(())
    }

    fn known_texture(&self, id: TextureId) -> Result<&TextureDescriptor, GraphicsError> {
        self.textures.get(&id).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown texture {}", id.raw()))
        })
    }

    fn known_pipeline(&self, id: PipelineId) -> Result<&PipelineDescriptor, GraphicsError> {
        self.pipelines.get(&id).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown pipeline {}", id.raw()))
        })
    }
}
