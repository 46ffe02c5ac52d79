/*!
 * Memory Types
 * Common types for block allocation
 */

use crate::core::types::Size;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MemoryError {
    #[error("Allocation failed: requested {requested_bytes} bytes for {context}")]
    #[diagnostic(
        code(memory::allocation_failure),
        help("The allocator could not satisfy the request. Free memory or shrink the workload.")
    )]
    AllocationFailure {
        requested_bytes: Size,
        context: AllocationContext,
    },

    #[error("Segment {segment} corrupted at offset {offset}: found 0x{found:02x}, expected 0x{expected:02x}")]
    #[diagnostic(
        code(memory::corruption_detected),
        help("Something wrote into a live segment. The fill pattern must stay intact until release.")
    )]
    CorruptionDetected {
        segment: usize,
        offset: usize,
        found: u8,
        expected: u8,
    },
}

/// Which part of a block an allocation request was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationContext {
    /// Segment handle table of a block
    Header { segment_count: usize },
    /// One segment of a block
    Segment { index: usize, segment_count: usize },
}

impl fmt::Display for AllocationContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AllocationContext::Header { segment_count } => {
                write!(f, "block header ({} segment handles)", segment_count)
            }
            AllocationContext::Segment {
                index,
                segment_count,
            } => write!(f, "segment {} of {}", index + 1, segment_count),
        }
    }
}

/// Shape of one buffer block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub segment_count: usize,
    pub segment_size: Size,
}

impl BlockLayout {
    pub fn new(segment_count: usize, segment_size: Size) -> Self {
        Self {
            segment_count,
            segment_size,
        }
    }

    /// Bytes held by the segments of one block, `None` on overflow
    pub fn payload_bytes(&self) -> Option<Size> {
        self.segment_count.checked_mul(self.segment_size)
    }
}
