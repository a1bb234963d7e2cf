//! Barrier batching.
//!
//! Transitions of independent subresources (the six faces of a level, or a
//! source level and a destination level) are collected and emitted as one
//! barrier command. Dependent passes flush between them.

use crate::command::CommandList;
use crate::resources::Texture;

use super::{ResourceBarrier, ResourceState, StateTracker, Subresource};

/// Largest number of transitions emitted in one barrier command.
///
/// Two full cube levels plus one extra resource.
pub const MAX_BATCH_BARRIERS: usize = 13;

/// A batch of resource transitions to flush together.
#[derive(Debug, Default)]
pub struct BarrierBatch {
    barriers: Vec<ResourceBarrier>,
}

impl BarrierBatch {
    /// Create a new empty barrier batch.
    pub fn new() -> Self {
        Self {
            barriers: Vec::with_capacity(MAX_BATCH_BARRIERS),
        }
    }

    /// Add an explicit transition.
    ///
    /// Transitions where `before == after` are skipped. If the subresource is
    /// already in the batch, its entry keeps the original `before` and takes
    /// the new `after`; an entry that collapses to a no-op is removed.
    pub fn add(&mut self, subresource: Subresource, before: ResourceState, after: ResourceState) {
        if let Some(index) = self
            .barriers
            .iter()
            .position(|b| b.subresource == subresource)
        {
            if self.barriers[index].before == after {
                self.barriers.remove(index);
            } else {
                self.barriers[index].after = after;
            }
            return;
        }

        if before == after {
            return;
        }

        self.barriers.push(ResourceBarrier {
            subresource,
            before,
            after,
        });
    }

    /// Transition a tracked subresource to `after`, updating the tracker.
    ///
    /// Unknown subresources are treated as [`ResourceState::Common`] and
    /// registered.
    pub fn transition(
        &mut self,
        tracker: &mut StateTracker,
        subresource: Subresource,
        after: ResourceState,
    ) {
        let before = tracker.set(subresource, after).unwrap_or_else(|| {
            log::warn!("BarrierBatch: transitioning untracked {subresource}");
            tracker.register(subresource, after);
            ResourceState::Common
        });
        self.add(subresource, before, after);
    }

    /// Transition every layer of one mip level of a texture.
    pub fn transition_mip(
        &mut self,
        tracker: &mut StateTracker,
        texture: &Texture,
        mip: u32,
        after: ResourceState,
    ) {
        for layer in 0..texture.array_layers() {
            self.transition(tracker, Subresource::texture(texture.id(), mip, layer), after);
        }
    }

    /// Check if the batch has any barriers.
    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }

    /// Get the number of barriers in the batch.
    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    /// Pending transitions in insertion order.
    pub fn barriers(&self) -> &[ResourceBarrier] {
        &self.barriers
    }

    /// Record the pending transitions into `cmd` and clear the batch.
    ///
    /// Does nothing if the batch is empty. Batches larger than
    /// [`MAX_BATCH_BARRIERS`] are split over several barrier commands.
    pub fn flush(&mut self, cmd: &mut CommandList) {
        if self.is_empty() {
            return;
        }
        for chunk in self.barriers.chunks(MAX_BATCH_BARRIERS) {
            cmd.barrier(chunk.to_vec());
        }
        self.barriers.clear();
    }

    /// Clear all barriers from the batch without recording them.
    pub fn clear(&mut self) {
        self.barriers.clear();
    }
}
