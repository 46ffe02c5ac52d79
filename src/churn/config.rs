/*!
 * Churn Configuration
 * Workload shape and the built-in presets
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{
    DEFAULT_CYCLE_LIMIT, LARGE_SEGMENT_COUNT, LARGE_SEGMENT_SIZE, MAX_CYCLE_LIMIT,
    MEDIUM_SEGMENT_COUNT, MEDIUM_SEGMENT_SIZE, SMALL_SEGMENT_COUNT, SMALL_SEGMENT_SIZE,
};
use crate::core::types::Size;
use crate::memory::BlockLayout;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of one churn run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// Independent segments per block
    pub segment_count: usize,
    /// Bytes per segment
    pub segment_size: Size,
    /// Allocate/release cycles after priming
    pub cycle_limit: usize,
}

impl ChurnConfig {
    pub fn new(
        segment_count: usize,
        segment_size: Size,
        cycle_limit: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            segment_count,
            segment_size,
            cycle_limit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_count == 0 {
            return Err(ConfigError::ZeroSegmentCount);
        }
        if self.segment_size == 0 {
            return Err(ConfigError::ZeroSegmentSize);
        }
        match self.layout().payload_bytes() {
            Some(bytes) if bytes <= isize::MAX as usize => {}
            _ => {
                return Err(ConfigError::BlockTooLarge {
                    segment_count: self.segment_count,
                    segment_size: self.segment_size,
                })
            }
        }
        if self.cycle_limit > MAX_CYCLE_LIMIT {
            return Err(ConfigError::CycleLimitTooLarge {
                requested: self.cycle_limit,
                max: MAX_CYCLE_LIMIT,
            });
        }
        Ok(())
    }

    /// Same shape, different number of cycles
    pub fn with_cycle_limit(self, cycle_limit: usize) -> Result<Self, ConfigError> {
        Self::new(self.segment_count, self.segment_size, cycle_limit)
    }

    #[inline]
    pub fn layout(&self) -> BlockLayout {
        BlockLayout::new(self.segment_count, self.segment_size)
    }

    /// Payload bytes of one block
    pub fn block_bytes(&self) -> Size {
        self.segment_count.saturating_mul(self.segment_size)
    }

    /// Protocol samples a completed run records: priming, two per cycle, final
    pub fn expected_samples(&self) -> usize {
        2 + 2 * self.cycle_limit
    }
}

/// Built-in workload shapes
///
/// All three move 2,960,640 bytes per block; only the split differs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// 20 segments of 148032 bytes
    MediumSegments,
    /// 10 segments of 296064 bytes
    LargeSegments,
    /// 720 segments of 4112 bytes
    SmallSegments,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::MediumSegments,
        Scenario::LargeSegments,
        Scenario::SmallSegments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::MediumSegments => "medium-segments",
            Scenario::LargeSegments => "large-segments",
            Scenario::SmallSegments => "small-segments",
        }
    }

    pub fn layout(&self) -> BlockLayout {
        match self {
            Scenario::MediumSegments => BlockLayout::new(MEDIUM_SEGMENT_COUNT, MEDIUM_SEGMENT_SIZE),
            Scenario::LargeSegments => BlockLayout::new(LARGE_SEGMENT_COUNT, LARGE_SEGMENT_SIZE),
            Scenario::SmallSegments => BlockLayout::new(SMALL_SEGMENT_COUNT, SMALL_SEGMENT_SIZE),
        }
    }

    pub fn config(&self, cycle_limit: usize) -> Result<ChurnConfig, ConfigError> {
        self.default_config().with_cycle_limit(cycle_limit)
    }

    /// Preset with the default cycle count
    pub fn default_config(&self) -> ChurnConfig {
        let layout = self.layout();
        ChurnConfig {
            segment_count: layout.segment_count,
            segment_size: layout.segment_size,
            cycle_limit: DEFAULT_CYCLE_LIMIT,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
