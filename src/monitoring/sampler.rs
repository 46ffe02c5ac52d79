/*!
 * Resident Memory Sampling
 *
 * Narrow interface for reading the process's resident set size. Samplers
 * run between allocation steps, so the ones here avoid heap allocation and
 * process spawning on the sampling path.
 */

use crate::core::types::ResidentBytes;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::os::unix::fs::FileExt;
use thiserror::Error;

const STATM_PATH: &str = "/proc/self/statm";

/// One resident memory reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemorySample {
    pub resident_bytes: ResidentBytes,
}

impl MemorySample {
    pub fn new(resident_bytes: ResidentBytes) -> Self {
        Self { resident_bytes }
    }
}

/// Sampler failures
///
/// Never fatal to a churn run; the step is recorded without a reading.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SampleError {
    #[error("{sampler} could not read resident memory: {reason}")]
    #[diagnostic(
        code(sampler::unavailable),
        help("Try --sampler peak-rss on systems without /proc.")
    )]
    Unavailable {
        sampler: &'static str,
        reason: String,
    },
}

impl SampleError {
    pub fn unavailable(sampler: &'static str, reason: impl ToString) -> Self {
        SampleError::Unavailable {
            sampler,
            reason: reason.to_string(),
        }
    }
}

/// Source of resident memory readings
pub trait MemorySampler {
    /// Read the current resident memory of this process
    fn sample(&mut self) -> Result<MemorySample, SampleError>;

    /// Short name used in reports
    fn name(&self) -> &'static str;
}

impl<S: MemorySampler + ?Sized> MemorySampler for Box<S> {
    fn sample(&mut self) -> Result<MemorySample, SampleError> {
        (**self).sample()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Current RSS from `/proc/self/statm`
///
/// The file stays open; each sample is one positional read into a stack
/// buffer.
#[derive(Debug)]
pub struct StatmSampler {
    file: File,
    page_size: u64,
}

impl StatmSampler {
    pub const NAME: &'static str = "statm";

    pub fn open() -> Result<Self, SampleError> {
        let file = File::open(STATM_PATH)
            .map_err(|e| SampleError::unavailable(Self::NAME, format!("{}: {}", STATM_PATH, e)))?;
        let page_size = page_size().ok_or_else(|| {
            SampleError::unavailable(Self::NAME, "page size not reported by sysconf")
        })?;
        Ok(Self { file, page_size })
    }
}

impl MemorySampler for StatmSampler {
    fn sample(&mut self) -> Result<MemorySample, SampleError> {
        let mut buf = [0u8; 256];
        let n = self
            .file
            .read_at(&mut buf, 0)
            .map_err(|e| SampleError::unavailable(Self::NAME, e))?;
        let pages = parse_statm_resident(&buf[..n])
            .ok_or_else(|| SampleError::unavailable(Self::NAME, "malformed statm line"))?;
        Ok(MemorySample::new(pages.saturating_mul(self.page_size)))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// Peak RSS from `getrusage(RUSAGE_SELF)`
///
/// A high-water mark: it never drops after a release, so it only shows
/// growth. Useful where `/proc` is missing.
#[derive(Debug, Default)]
pub struct PeakRssSampler;

impl PeakRssSampler {
    pub const NAME: &'static str = "peak-rss";
}

impl MemorySampler for PeakRssSampler {
    fn sample(&mut self) -> Result<MemorySample, SampleError> {
        use nix::sys::resource::{getrusage, UsageWho};

        let usage =
            getrusage(UsageWho::RUSAGE_SELF).map_err(|e| SampleError::unavailable(Self::NAME, e))?;
        let max_rss = u64::try_from(usage.max_rss())
            .map_err(|_| SampleError::unavailable(Self::NAME, "negative ru_maxrss"))?;

        // Linux reports kilobytes, macOS bytes
        let resident_bytes = if cfg!(target_os = "macos") {
            max_rss
        } else {
            max_rss.saturating_mul(1024)
        };
        Ok(MemorySample::new(resident_bytes))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// Sampler backed by a closure
pub struct FnSampler<F> {
    f: F,
}

impl<F> FnSampler<F>
where
    F: FnMut() -> Result<MemorySample, SampleError>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> MemorySampler for FnSampler<F>
where
    F: FnMut() -> Result<MemorySample, SampleError>,
{
    fn sample(&mut self) -> Result<MemorySample, SampleError> {
        (self.f)()
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

fn page_size() -> Option<u64> {
    use nix::unistd::{sysconf, SysconfVar};

    match sysconf(SysconfVar::PAGE_SIZE) {
        Ok(Some(size)) if size > 0 => Some(size as u64),
        _ => None,
    }
}

/// Resident page count: second field of a statm line
fn parse_statm_resident(line: &[u8]) -> Option<u64> {
    std::str::from_utf8(line)
        .ok()?
        .split_ascii_whitespace()
        .nth(1)?
        .parse()
        .ok()
}
