//! Per-subresource state tracking.

use std::collections::HashMap;

use crate::resources::{Buffer, Texture};
use crate::types::{BufferId, TextureId};

use super::{ResourceState, Subresource};

/// Tracks the current state of every registered subresource.
///
/// A probe keeps one tracker for the resources it owns and derives the
/// `before` half of each barrier from it. Backends keep their own copy to
/// validate submitted command lists.
#[derive(Debug, Default, Clone)]
pub struct StateTracker {
    states: HashMap<Subresource, ResourceState>,
}

impl StateTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every `(mip, layer)` of a texture in `state`.
    pub fn register_texture(&mut self, texture: &Texture, state: ResourceState) {
        self.register_texture_id(
            texture.id(),
            texture.mip_level_count(),
            texture.array_layers(),
            state,
        );
    }

    /// Register a texture by id and shape.
    pub fn register_texture_id(
        &mut self,
        texture: TextureId,
        mips: u32,
        layers: u32,
        state: ResourceState,
    ) {
        for mip in 0..mips {
            for layer in 0..layers {
                self.states
                    .insert(Subresource::texture(texture, mip, layer), state);
            }
        }
    }

    /// Register a buffer in `state`.
    pub fn register_buffer(&mut self, buffer: &Buffer, state: ResourceState) {
        self.register_buffer_id(buffer.id(), state);
    }

    /// Register a buffer by id.
    pub fn register_buffer_id(&mut self, buffer: BufferId, state: ResourceState) {
        self.states.insert(Subresource::Buffer(buffer), state);
    }

    /// Register a single subresource.
    pub fn register(&mut self, subresource: Subresource, state: ResourceState) {
        self.states.insert(subresource, state);
    }

    /// Forget every subresource of a texture.
    pub fn forget_texture(&mut self, texture: TextureId) {
        self.states.retain(|sub, _| {
            !matches!(sub, Subresource::Texture { texture: t, .. } if *t == texture)
        });
    }

    /// Forget a buffer.
    pub fn forget_buffer(&mut self, buffer: BufferId) {
        self.states.remove(&Subresource::Buffer(buffer));
    }

    /// Current state of a subresource, if registered.
    pub fn state(&self, subresource: Subresource) -> Option<ResourceState> {
        self.states.get(&subresource).copied()
    }

    /// Overwrite the state of a registered subresource.
    ///
    /// Returns the previous state, or `None` if the subresource is unknown.
    pub fn set(&mut self, subresource: Subresource, state: ResourceState) -> Option<ResourceState> {
        self.states
            .get_mut(&subresource)
            .map(|current| std::mem::replace(current, state))
    }

    /// Number of tracked subresources.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
