/*!
 * Memory Traits
 * Allocation seam used by buffer blocks
 */

use super::block::Segment;
use super::types::MemoryResult;
use crate::core::types::Size;

/// Source of block headers and segments
///
/// Implementations hand out storage and take it back; the harness never
/// manages memory itself, it only decides when to ask and when to return.
pub trait Allocator {
    /// Allocate the handle table for `segment_count` segments
    ///
    /// The returned vector is empty with room for exactly `segment_count`
    /// handles.
    fn allocate_header(&self, segment_count: usize) -> MemoryResult<Vec<Segment>>;

    /// Allocate one segment of `size` bytes, every byte set to `fill`
    ///
    /// `index` is the position of the segment within its block, used for
    /// error context only.
    fn allocate_segment(
        &self,
        index: usize,
        segment_count: usize,
        size: Size,
        fill: u8,
    ) -> MemoryResult<Segment>;

    /// Return one segment
    fn release_segment(&self, segment: Segment) {
        drop(segment);
    }

    /// Return a handle table; all of its segments have been released already
    fn release_header(&self, header: Vec<Segment>) {
        debug_assert!(header.is_empty(), "header released with live segments");
        drop(header);
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate_header(&self, segment_count: usize) -> MemoryResult<Vec<Segment>> {
        (**self).allocate_header(segment_count)
    }

    fn allocate_segment(
        &self,
        index: usize,
        segment_count: usize,
        size: Size,
        fill: u8,
    ) -> MemoryResult<Segment> {
        (**self).allocate_segment(index, segment_count, size, fill)
    }

    fn release_segment(&self, segment: Segment) {
        (**self).release_segment(segment)
    }

    fn release_header(&self, header: Vec<Segment>) {
        (**self).release_header(header)
    }
}
