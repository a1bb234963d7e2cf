//! Descriptor tables.
//!
//! A descriptor table is an ordered list of resource views bound to one pass.
//! Tables are built once when a probe is initialized and shared via `Arc`;
//! recording a pass only clones the handle.

use std::sync::Arc;

use crate::barrier::{ResourceState, Subresource};
use crate::error::GraphicsError;
use crate::resources::TextureView;
use crate::types::BufferId;

/// Default number of tables a [`DescriptorTableCache`] can hold.
pub const DEFAULT_TABLE_CAPACITY: usize = 256;

/// A single view in a descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// Shader resource view of a texture range.
    Srv(TextureView),
    /// Unordered access view of a texture range.
    Uav(TextureView),
    /// Render target view of a texture range.
    Rtv(TextureView),
    /// Read-only structured buffer.
    BufferSrv(BufferId),
    /// Read-write structured buffer.
    BufferUav(BufferId),
}

impl Descriptor {
    /// State every subresource behind the view must be in while bound.
    pub fn required_state(&self) -> ResourceState {
        match self {
            Self::Srv(_) | Self::BufferSrv(_) => ResourceState::ShaderRead,
            Self::Uav(_) | Self::BufferUav(_) => ResourceState::UnorderedAccess,
            Self::Rtv(_) => ResourceState::RenderTarget,
        }
    }

    /// Subresources covered by the view.
    pub fn subresources(&self) -> Vec<Subresource> {
        match self {
            Self::Srv(view) | Self::Uav(view) | Self::Rtv(view) => view
                .subresources()
                .map(|(mip, layer)| Subresource::texture(view.texture, mip, layer))
                .collect(),
            Self::BufferSrv(buffer) | Self::BufferUav(buffer) => vec![Subresource::Buffer(*buffer)],
        }
    }
}

/// An immutable, ordered set of views bound to one pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorTable {
    label: String,
    entries: Vec<Descriptor>,
}

impl DescriptorTable {
    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Views in binding order.
    pub fn entries(&self) -> &[Descriptor] {
        &self.entries
    }

    /// View at binding `index`.
    pub fn get(&self, index: usize) -> Option<&Descriptor> {
        self.entries.get(index)
    }

    /// Number of views.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table binds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Allocator for descriptor tables with a fixed capacity.
///
/// Requests for a table with identical entries return the existing table.
#[derive(Debug)]
pub struct DescriptorTableCache {
    tables: Vec<Arc<DescriptorTable>>,
    capacity: usize,
}

impl DescriptorTableCache {
    /// Create a cache that can hold `capacity` distinct tables.
    pub fn new(capacity: usize) -> Self {
        Self {
            tables: Vec::new(),
            capacity,
        }
    }

    /// Allocate (or reuse) a table binding `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ResourceCreationFailed`] when the cache is full,
    /// or [`GraphicsError::InvalidParameter`] for an empty table.
    pub fn allocate(
        &mut self,
        label: impl Into<String>,
        entries: Vec<Descriptor>,
    ) -> Result<Arc<DescriptorTable>, GraphicsError> {
        if entries.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "descriptor table cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = self.tables.iter().find(|t| t.entries == entries) {
            return Ok(Arc::clone(existing));
        }

        if self.tables.len() >= self.capacity {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "descriptor table cache exhausted ({} tables)",
                self.capacity
            )));
        }

        let table = Arc::new(DescriptorTable {
            label: label.into(),
            entries,
        });
        log::trace!(
            "DescriptorTableCache: allocated '{}' with {} views",
            table.label,
            table.entries.len()
        );
        self.tables.push(Arc::clone(&table));
        Ok(table)
    }

    /// Number of distinct tables allocated.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table was allocated.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Maximum number of tables.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for DescriptorTableCache {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureId;

    fn view(mip: u32) -> TextureView {
        TextureView {
            texture: TextureId(1),
            base_mip: mip,
            mip_count: 1,
            base_layer: 0,
            layer_count: 6,
        }
    }

    #[test]
    fn test_required_state() {
        assert_eq!(
            Descriptor::Srv(view(0)).required_state(),
            ResourceState::ShaderRead
        );
        assert_eq!(
            Descriptor::Uav(view(0)).required_state(),
            ResourceState::UnorderedAccess
        );
        assert_eq!(
            Descriptor::Rtv(view(0)).required_state(),
            ResourceState::RenderTarget
        );
        assert_eq!(Descriptor::Srv(view(2)).subresources().len(), 6);
    }

    #[test]
    fn test_identical_tables_are_shared() {
        let mut cache = DescriptorTableCache::new(4);
        let a = cache
            .allocate("a", vec![Descriptor::Srv(view(0)), Descriptor::Uav(view(1))])
            .unwrap();
        let b = cache
            .allocate("b", vec![Descriptor::Srv(view(0)), Descriptor::Uav(view(1))])
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_exhausted() {
        let mut cache = DescriptorTableCache::new(1);
        cache.allocate("a", vec![Descriptor::Srv(view(0))]).unwrap();
        let result = cache.allocate("b", vec![Descriptor::Srv(view(1))]);
        assert!(matches!(
            result,
            Err(GraphicsError::ResourceCreationFailed(_))
        ));
    }

    #[test]
    fn test_empty_table_rejected() {
        let mut cache = DescriptorTableCache::default();
        assert!(cache.allocate("empty", Vec::new()).is_err());
    }
}
