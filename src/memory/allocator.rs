/*!
 * Allocator Implementations
 * The process allocator, and a counting wrapper around any allocator
 */

use super::block::Segment;
use super::tracking::{AllocationCounters, AllocationStats};
use super::traits::Allocator;
use super::types::{AllocationContext, MemoryError, MemoryResult};
use crate::core::types::Size;
use tracing::warn;

/// Whatever global allocator the process runs with
///
/// Requests go through fallible reservation so that exhaustion surfaces as
/// [`MemoryError::AllocationFailure`] instead of aborting the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate_header(&self, segment_count: usize) -> MemoryResult<Vec<Segment>> {
        let mut header = Vec::new();
        header.try_reserve_exact(segment_count).map_err(|_| {
            MemoryError::AllocationFailure {
                requested_bytes: segment_count.saturating_mul(std::mem::size_of::<Segment>()),
                context: AllocationContext::Header { segment_count },
            }
        })?;
        Ok(header)
    }

    fn allocate_segment(
        &self,
        index: usize,
        segment_count: usize,
        size: Size,
        fill: u8,
    ) -> MemoryResult<Segment> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| MemoryError::AllocationFailure {
                requested_bytes: size,
                context: AllocationContext::Segment {
                    index,
                    segment_count,
                },
            })?;
        // Writing every byte makes the pages resident
        bytes.resize(size, fill);
        Ok(Segment::from_boxed(bytes.into_boxed_slice()))
    }
}

/// Counting wrapper around another allocator
///
/// Each header counts as one live block. Counters are atomics so a sampler
/// closure can read them while a session holds the allocator.
#[derive(Debug, Default)]
pub struct TrackingAllocator<A: Allocator = SystemAllocator> {
    inner: A,
    counters: AllocationCounters,
}

impl<A: Allocator> TrackingAllocator<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            counters: AllocationCounters::default(),
        }
    }

    /// Current counter values
    pub fn stats(&self) -> AllocationStats {
        self.counters.snapshot()
    }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn allocate_header(&self, segment_count: usize) -> MemoryResult<Vec<Segment>> {
        match self.inner.allocate_header(segment_count) {
            Ok(header) => {
                self.counters.add_block();
                Ok(header)
            }
            Err(e) => {
                self.counters.add_failure();
                warn!(error = %e, "header allocation failed");
                Err(e)
            }
        }
    }

    fn allocate_segment(
        &self,
        index: usize,
        segment_count: usize,
        size: Size,
        fill: u8,
    ) -> MemoryResult<Segment> {
        match self.inner.allocate_segment(index, segment_count, size, fill) {
            Ok(segment) => {
                self.counters.add_segment(segment.len());
                Ok(segment)
            }
            Err(e) => {
                self.counters.add_failure();
                warn!(error = %e, "segment allocation failed");
                Err(e)
            }
        }
    }

    fn release_segment(&self, segment: Segment) {
        self.counters.remove_segment(segment.len());
        self.inner.release_segment(segment);
    }

    fn release_header(&self, header: Vec<Segment>) {
        self.counters.remove_block();
        self.inner.release_header(header);
    }
}
