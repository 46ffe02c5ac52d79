/*!
 * Harness Limits and Constants
 *
 * Fill patterns, workload presets and validation caps in one place.
 */

// =============================================================================
// FILL PATTERNS
// =============================================================================

/// Byte written into every segment right after it is allocated
pub const SENTINEL_BYTE: u8 = 0xCC;

/// Byte written over a segment just before it is released (debug builds)
pub const POISON_BYTE: u8 = 0xDD;

// =============================================================================
// WORKLOAD PRESETS
// =============================================================================

/// Default number of allocate/release cycles per run
pub const DEFAULT_CYCLE_LIMIT: usize = 5;

/// Preset A: 20 segments of 148032 bytes
pub const MEDIUM_SEGMENT_COUNT: usize = 20;
pub const MEDIUM_SEGMENT_SIZE: usize = 148_032;

/// Preset B: 10 segments of 296064 bytes
pub const LARGE_SEGMENT_COUNT: usize = 10;
pub const LARGE_SEGMENT_SIZE: usize = 296_064;

/// Preset C: 720 segments of 4112 bytes
pub const SMALL_SEGMENT_COUNT: usize = 720;
pub const SMALL_SEGMENT_SIZE: usize = 4_112;

// =============================================================================
// VALIDATION
// =============================================================================

/// Upper bound on cycles per run
pub const MAX_CYCLE_LIMIT: usize = 1_000_000;

/// Default slack (256KB) when comparing post-release readings
/// Covers allocator bookkeeping and logging noise between samples
pub const DEFAULT_RETENTION_TOLERANCE: u64 = 256 * 1024;
