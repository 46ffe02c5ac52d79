/*!
 * Buffer Blocks
 *
 * One unit of churn: a header holding `segment_count` handles, each pointing
 * at its own `segment_size` byte allocation. Segments are allocated one by
 * one rather than as a single region so the allocator has to manage many
 * same-size objects.
 */

use super::traits::Allocator;
use super::types::{BlockLayout, MemoryError, MemoryResult};
use crate::core::limits::{POISON_BYTE, SENTINEL_BYTE};
use crate::core::types::Size;
use tracing::{error, trace};

/// One independently allocated, fill-initialized byte buffer
#[derive(Debug)]
pub struct Segment {
    bytes: Box<[u8]>,
}

impl Segment {
    pub(crate) fn from_boxed(bytes: Box<[u8]>) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn len(&self) -> Size {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Start address, for telling segments apart
    #[inline]
    pub fn addr(&self) -> usize {
        self.bytes.as_ptr() as usize
    }

    /// Offset and value of the first byte that is not `expected`
    pub fn first_mismatch(&self, expected: u8) -> Option<(usize, u8)> {
        self.bytes
            .iter()
            .position(|&b| b != expected)
            .map(|offset| (offset, self.bytes[offset]))
    }

    /// Overwrite the whole segment with the poison byte
    pub fn poison(&mut self) {
        self.bytes.fill(POISON_BYTE);
    }
}

/// Header plus `segment_count` equal-size segments
///
/// A block is either fully allocated or fully released. It borrows the
/// allocator that produced it and hands everything back to that allocator
/// on [`BufferBlock::release`] or, failing that, on drop.
pub struct BufferBlock<'a, A: Allocator + ?Sized> {
    allocator: &'a A,
    layout: BlockLayout,
    header: Option<Vec<Segment>>,
}

impl<'a, A: Allocator + ?Sized> BufferBlock<'a, A> {
    /// Allocate the header and every segment, each filled with the sentinel
    ///
    /// If any request fails, the segments already obtained and the header
    /// are released before the error is returned.
    pub fn allocate(allocator: &'a A, layout: BlockLayout) -> MemoryResult<Self> {
        let header = allocator.allocate_header(layout.segment_count)?;
        let mut block = Self {
            allocator,
            layout,
            header: Some(header),
        };

        for index in 0..layout.segment_count {
            // On error `block` drops here and gives back what it holds
            let segment = allocator.allocate_segment(
                index,
                layout.segment_count,
                layout.segment_size,
                SENTINEL_BYTE,
            )?;
            block.segments_mut().push(segment);
        }

        trace!(
            segment_count = layout.segment_count,
            segment_size = layout.segment_size,
            "block allocated"
        );
        Ok(block)
    }

    /// Release every segment, then the header
    pub fn release(mut self) {
        self.release_in_place();
    }

    #[inline]
    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments().len()
    }

    #[inline]
    pub fn segment_size(&self) -> Size {
        self.layout.segment_size
    }

    pub fn segments(&self) -> &[Segment] {
        self.header.as_deref().unwrap_or(&[])
    }

    /// Check that every segment still carries the sentinel pattern
    pub fn verify(&self) -> MemoryResult<()> {
        for (segment, seg) in self.segments().iter().enumerate() {
            if let Some((offset, found)) = seg.first_mismatch(SENTINEL_BYTE) {
                return Err(MemoryError::CorruptionDetected {
                    segment,
                    offset,
                    found,
                    expected: SENTINEL_BYTE,
                });
            }
        }
        Ok(())
    }

    fn segments_mut(&mut self) -> &mut Vec<Segment> {
        // Only reachable while the block is live
        self.header.get_or_insert_with(Vec::new)
    }

    fn release_in_place(&mut self) {
        let Some(mut header) = self.header.take() else {
            return;
        };

        if cfg!(debug_assertions) {
            for (segment, seg) in header.iter().enumerate() {
                if let Some((offset, found)) = seg.first_mismatch(SENTINEL_BYTE) {
                    error!(
                        segment,
                        offset,
                        found,
                        "segment lost its fill pattern before release"
                    );
                }
            }
        }

        for mut segment in header.drain(..) {
            if cfg!(debug_assertions) {
                segment.poison();
            }
            self.allocator.release_segment(segment);
        }
        self.allocator.release_header(header);

        trace!(
            segment_count = self.layout.segment_count,
            segment_size = self.layout.segment_size,
            "block released"
        );
    }
}

impl<A: Allocator + ?Sized> Drop for BufferBlock<'_, A> {
    fn drop(&mut self) {
        self.release_in_place();
    }
}

impl<A: Allocator + ?Sized> std::fmt::Debug for BufferBlock<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferBlock")
            .field("layout", &self.layout)
            .field("live_segments", &self.segments().len())
            .finish()
    }
}
