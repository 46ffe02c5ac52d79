/*!
 * Allocation Tracking
 * Live and peak counters for blocks, segments and bytes
 */

use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of a [`super::TrackingAllocator`]'s counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStats {
    pub live_blocks: usize,
    pub peak_live_blocks: usize,
    pub live_segments: usize,
    pub live_bytes: Size,
    pub peak_live_bytes: Size,
    pub blocks_allocated: usize,
    pub segments_allocated: usize,
    pub failures: usize,
}

impl AllocationStats {
    /// Live headers plus live segments
    pub fn live_allocations(&self) -> usize {
        self.live_blocks + self.live_segments
    }
}

/// Atomic counters behind the tracking allocator
#[derive(Debug, Default)]
pub(super) struct AllocationCounters {
    live_blocks: AtomicUsize,
    peak_live_blocks: AtomicUsize,
    live_segments: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_live_bytes: AtomicUsize,
    blocks_allocated: AtomicUsize,
    segments_allocated: AtomicUsize,
    failures: AtomicUsize,
}

impl AllocationCounters {
    pub fn add_block(&self) {
        let live = self.live_blocks.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_live_blocks.fetch_max(live, Ordering::Relaxed);
        self.blocks_allocated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove_block(&self) {
        self.live_blocks.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn add_segment(&self, size: Size) {
        self.live_segments.fetch_add(1, Ordering::Relaxed);
        self.segments_allocated.fetch_add(1, Ordering::Relaxed);
        let live = self.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_live_bytes.fetch_max(live, Ordering::Relaxed);
    }

    pub fn remove_segment(&self, size: Size) {
        self.live_segments.fetch_sub(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(size, Ordering::Relaxed);
    }

    pub fn add_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AllocationStats {
        AllocationStats {
            live_blocks: self.live_blocks.load(Ordering::Relaxed),
            peak_live_blocks: self.peak_live_blocks.load(Ordering::Relaxed),
            live_segments: self.live_segments.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            peak_live_bytes: self.peak_live_bytes.load(Ordering::Relaxed),
            blocks_allocated: self.blocks_allocated.load(Ordering::Relaxed),
            segments_allocated: self.segments_allocated.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
