/*!
 * Churn Reports
 * Labeled samples and the per-run result
 */

use super::config::ChurnConfig;
use crate::core::types::{CycleIndex, ResidentBytes};
use crate::memory::AllocationStats;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Protocol step that produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum SampleLabel {
    /// Before priming, nothing allocated
    Baseline,
    /// First block live
    Priming,
    /// Both blocks of cycle N live
    CyclePeak(CycleIndex),
    /// Old block of cycle N released
    CyclePostRelease(CycleIndex),
    /// Last block released
    DrainingFinal,
}

impl fmt::Display for SampleLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleLabel::Baseline => write!(f, "baseline"),
            SampleLabel::Priming => write!(f, "priming"),
            SampleLabel::CyclePeak(n) => write!(f, "cycle-{}-peak", n),
            SampleLabel::CyclePostRelease(n) => write!(f, "cycle-{}-post-release", n),
            SampleLabel::DrainingFinal => write!(f, "draining-final"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sample label: {0}")]
pub struct ParseLabelError(String);

impl FromStr for SampleLabel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => return Ok(SampleLabel::Baseline),
            "priming" => return Ok(SampleLabel::Priming),
            "draining-final" => return Ok(SampleLabel::DrainingFinal),
            _ => {}
        }

        let err = || ParseLabelError(s.to_string());
        let rest = s.strip_prefix("cycle-").ok_or_else(err)?;
        let (n, step) = rest.split_once('-').ok_or_else(err)?;
        let n: CycleIndex = n.parse().map_err(|_| err())?;
        match step {
            "peak" => Ok(SampleLabel::CyclePeak(n)),
            "post-release" => Ok(SampleLabel::CyclePostRelease(n)),
            _ => Err(err()),
        }
    }
}

/// One recorded protocol step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    /// Position in the protocol sequence (baseline is 0 and sits outside it)
    pub step: usize,
    pub label: SampleLabel,
    /// `None` when the sampler failed at this step
    pub resident_bytes: Option<ResidentBytes>,
    /// Blocks the session held when the sample was taken
    pub live_blocks: usize,
}

/// Coarse reading of the post-release series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionVerdict {
    /// Every post-release reading is back near priming
    Returned,
    /// Above priming but the last cycle did not grow
    Plateau,
    /// Still growing on the last cycle
    Growing,
    /// Too few readings to tell
    Inconclusive,
}

impl fmt::Display for RetentionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RetentionVerdict::Returned => write!(f, "RETURNED"),
            RetentionVerdict::Plateau => write!(f, "PLATEAU"),
            RetentionVerdict::Growing => write!(f, "GROWING"),
            RetentionVerdict::Inconclusive => write!(f, "INCONCLUSIVE"),
        }
    }
}

/// Result of one churn run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnReport {
    pub run_id: Uuid,
    pub config: ChurnConfig,
    pub sampler: String,
    pub baseline: Option<LabeledSample>,
    pub samples: Vec<LabeledSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationStats>,
}

impl ChurnReport {
    pub fn new(run_id: Uuid, config: ChurnConfig, sampler: &str) -> Self {
        Self {
            run_id,
            config,
            sampler: sampler.to_string(),
            baseline: None,
            samples: Vec::with_capacity(config.expected_samples()),
            allocation: None,
        }
    }

    /// True once every protocol sample has been recorded
    pub fn is_complete(&self) -> bool {
        self.samples.len() == self.config.expected_samples()
    }

    /// Steps recorded without a reading
    pub fn missing_samples(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| s.resident_bytes.is_none())
            .count()
    }

    pub fn find(&self, label: SampleLabel) -> Option<&LabeledSample> {
        self.samples.iter().find(|s| s.label == label)
    }

    pub fn priming(&self) -> Option<ResidentBytes> {
        self.find(SampleLabel::Priming)?.resident_bytes
    }

    /// Post-release readings in cycle order
    pub fn post_release(&self) -> Vec<(CycleIndex, Option<ResidentBytes>)> {
        self.samples
            .iter()
            .filter_map(|s| match s.label {
                SampleLabel::CyclePostRelease(n) => Some((n, s.resident_bytes)),
                _ => None,
            })
            .collect()
    }

    /// Peak readings in cycle order
    pub fn peaks(&self) -> Vec<(CycleIndex, Option<ResidentBytes>)> {
        self.samples
            .iter()
            .filter_map(|s| match s.label {
                SampleLabel::CyclePeak(n) => Some((n, s.resident_bytes)),
                _ => None,
            })
            .collect()
    }

    /// Classify the post-release series, allowing `tolerance` bytes of noise
    ///
    /// Growth is judged on the last two cycles only; if either of them has
    /// no reading the verdict is `Inconclusive`.
    pub fn verdict(&self, tolerance: ResidentBytes) -> RetentionVerdict {
        let Some(priming) = self.priming() else {
            return RetentionVerdict::Inconclusive;
        };
        let series = self.post_release();
        let readings: Vec<ResidentBytes> = series.iter().filter_map(|&(_, r)| r).collect();
        if readings.len() < 2 {
            return RetentionVerdict::Inconclusive;
        }

        let ceiling = priming.saturating_add(tolerance);
        if readings.iter().all(|&r| r <= ceiling) {
            return RetentionVerdict::Returned;
        }

        let (prev, last) = match series[series.len() - 2..] {
            [(_, Some(prev)), (_, Some(last))] => (prev, last),
            _ => return RetentionVerdict::Inconclusive,
        };
        if last.saturating_sub(prev) > tolerance {
            RetentionVerdict::Growing
        } else {
            RetentionVerdict::Plateau
        }
    }
}
