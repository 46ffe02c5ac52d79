/*!
 * Memory Module
 * Buffer blocks and the allocators that back them
 */

pub mod allocator;
pub mod block;
pub mod tracking;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use allocator::{SystemAllocator, TrackingAllocator};
pub use block::{BufferBlock, Segment};
pub use tracking::AllocationStats;
pub use traits::*;
pub use types::*;
