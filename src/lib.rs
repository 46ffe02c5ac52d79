/*!
 * churn-probe Library
 *
 * Memory churn harness: allocates and releases composite buffer blocks in a
 * sliding window and samples resident memory after every step, to show
 * whether the allocator in effect returns freed memory, keeps it for reuse,
 * or keeps growing.
 */

pub mod churn;
pub mod core;
pub mod memory;
pub mod monitoring;
pub mod output;

// Re-exports
pub use crate::churn::{
    run, ChurnConfig, ChurnReport, ChurnSession, LabeledSample, Phase, RetentionVerdict,
    SampleLabel, Scenario,
};
pub use crate::core::{ChurnError, ConfigError, RunError};
pub use crate::memory::{
    AllocationStats, Allocator, BlockLayout, BufferBlock, MemoryError, SystemAllocator,
    TrackingAllocator,
};
pub use crate::monitoring::{
    init_tracing, FnSampler, MemorySample, MemorySampler, PeakRssSampler, SampleError,
    StatmSampler,
};
pub use crate::output::OutputFormat;
