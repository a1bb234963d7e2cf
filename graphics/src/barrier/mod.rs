//! Resource state transitions.
//!
//! Every texture subresource `(mip, layer)` and every buffer is in exactly one
//! [`ResourceState`] at any point of a command stream. Passes declare the
//! state they need, [`BarrierBatch`] turns the difference into transitions,
//! and [`StateTracker`] remembers the result for the next pass.
//!
//! ```ignore
//! let mut batch = BarrierBatch::new();
//! batch.transition_mip(&mut tracker, &radiance, 0, ResourceState::ShaderRead);
//! batch.transition_mip(&mut tracker, &irradiance, 1, ResourceState::UnorderedAccess);
//! batch.flush(&mut cmd);
//! ```

mod batch;
mod state;
mod tracker;

pub use batch::{BarrierBatch, MAX_BATCH_BARRIERS};
pub use state::{ResourceBarrier, ResourceState, Subresource};
pub use tracker::StateTracker;
