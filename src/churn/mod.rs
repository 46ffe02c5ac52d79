/*!
 * Churn Driver
 * Sliding-window allocate/release workload with resident memory sampling
 */

mod config;
mod report;
mod session;

pub use config::{ChurnConfig, Scenario};
pub use report::{ChurnReport, LabeledSample, ParseLabelError, RetentionVerdict, SampleLabel};
pub use session::{ChurnSession, Phase};

use crate::core::errors::ChurnError;
use crate::memory::Allocator;
use crate::monitoring::MemorySampler;

/// Run one complete session and return its report
///
/// Produces `2 + 2 * cycle_limit` protocol samples plus a separate baseline.
pub fn run<A, S>(
    config: ChurnConfig,
    allocator: &A,
    sampler: &mut S,
) -> Result<ChurnReport, ChurnError>
where
    A: Allocator + ?Sized,
    S: MemorySampler + ?Sized,
{
    let session = ChurnSession::new(config, allocator, sampler)?;
    Ok(session.run()?)
}
