/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use crate::churn::{ChurnReport, Phase};
use crate::core::types::{CycleIndex, Size};
use miette::Diagnostic;
use thiserror::Error;

// Re-export MemoryError from memory module
pub use crate::memory::MemoryError;

// Re-export SampleError from monitoring module
pub use crate::monitoring::SampleError;

/// Rejected workload configuration
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("segment_count must be at least 1")]
    #[diagnostic(
        code(config::zero_segment_count),
        help("A block needs at least one segment to churn.")
    )]
    ZeroSegmentCount,

    #[error("segment_size must be at least 1 byte")]
    #[diagnostic(
        code(config::zero_segment_size),
        help("Zero-sized segments never reach the allocator.")
    )]
    ZeroSegmentSize,

    #[error("block of {segment_count} x {segment_size} bytes exceeds the addressable size")]
    #[diagnostic(
        code(config::block_too_large),
        help("Reduce segment_count or segment_size so one block fits in isize::MAX bytes.")
    )]
    BlockTooLarge {
        segment_count: usize,
        segment_size: Size,
    },

    #[error("cycle_limit {requested} exceeds the maximum of {max}")]
    #[diagnostic(code(config::cycle_limit_too_large))]
    CycleLimitTooLarge { requested: usize, max: usize },
}

/// A churn run that stopped before reaching `Done`
///
/// Carries the samples recorded up to the failure; the session has already
/// released every block it held.
#[derive(Error, Debug, Diagnostic)]
#[error("churn run aborted during {phase} (cycle {cycle_index})")]
#[diagnostic(
    code(churn::aborted),
    help("Allocation failures are not retried. Lower segment_count or segment_size.")
)]
pub struct RunError {
    pub phase: Phase,
    pub cycle_index: CycleIndex,
    #[source]
    #[diagnostic_source]
    pub source: MemoryError,
    pub partial: Box<ChurnReport>,
}

impl RunError {
    /// Bytes of the request that could not be satisfied
    pub fn requested_bytes(&self) -> Size {
        match &self.source {
            MemoryError::AllocationFailure {
                requested_bytes, ..
            } => *requested_bytes,
            MemoryError::CorruptionDetected { .. } => 0,
        }
    }
}

/// Any failure of [`crate::churn::run`]
#[derive(Error, Debug, Diagnostic)]
pub enum ChurnError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Run(#[from] RunError),
}

impl ChurnError {
    /// Samples recorded before the failure, if the run got that far
    pub fn partial_report(&self) -> Option<&ChurnReport> {
        match self {
            ChurnError::Config(_) => None,
            ChurnError::Run(e) => Some(&e.partial),
        }
    }
}
