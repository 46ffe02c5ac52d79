/*!
 * Monitoring
 * Resident memory sampling and tracing setup
 */

mod sampler;
mod tracer;

pub use sampler::{FnSampler, MemorySample, MemorySampler, PeakRssSampler, SampleError, StatmSampler};
pub use tracer::{init_tracing, run_span};
