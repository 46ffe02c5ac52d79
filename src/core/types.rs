/*!
 * Core Types
 * Common types used across the harness
 */

/// Size type for allocation requests, in bytes
pub type Size = usize;

/// 1-based index of a churn cycle
pub type CycleIndex = usize;

/// Resident set size reported by the operating system, in bytes
pub type ResidentBytes = u64;
