/*!
 * Command Line Interface
 * Workload selection, sampler choice and output format
 */

use churn_probe::core::limits::{DEFAULT_CYCLE_LIMIT, DEFAULT_RETENTION_TOLERANCE};
use churn_probe::{
    ChurnConfig, ConfigError, MemorySampler, OutputFormat, PeakRssSampler, SampleError, Scenario,
    StatmSampler,
};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "churn-probe",
    about = "Allocate and release buffer blocks in a sliding window and watch resident memory.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// How the reports are printed.
    #[arg(
        long,
        env = "CHURN_FORMAT",
        global = true,
        help_heading = "Global Options",
        default_value = "table"
    )]
    pub format: OutputFormat,
    /// Where resident memory readings come from.
    #[arg(
        long,
        env = "CHURN_SAMPLER",
        global = true,
        help_heading = "Global Options",
        default_value = "statm"
    )]
    pub sampler: SamplerKind,
    /// Bytes of noise tolerated when classifying post-release readings.
    #[arg(
        long,
        env = "CHURN_TOLERANCE",
        global = true,
        help_heading = "Global Options",
        default_value_t = DEFAULT_RETENTION_TOLERANCE
    )]
    pub tolerance: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a custom workload shape.
    Run {
        /// Independent segments per block.
        #[arg(long, env = "CHURN_SEGMENT_COUNT")]
        segment_count: usize,
        /// Bytes per segment.
        #[arg(long, env = "CHURN_SEGMENT_SIZE")]
        segment_size: usize,
        /// Allocate/release cycles after priming.
        #[arg(long, env = "CHURN_CYCLES", default_value_t = DEFAULT_CYCLE_LIMIT)]
        cycles: usize,
    },
    /// Run one built-in workload shape.
    Scenario {
        preset: Scenario,
        /// Allocate/release cycles after priming.
        #[arg(long, env = "CHURN_CYCLES", default_value_t = DEFAULT_CYCLE_LIMIT)]
        cycles: usize,
    },
    /// Run every built-in workload shape in turn.
    All {
        /// Allocate/release cycles after priming.
        #[arg(long, env = "CHURN_CYCLES", default_value_t = DEFAULT_CYCLE_LIMIT)]
        cycles: usize,
    },
}

impl Cli {
    /// Workloads selected by the subcommand, in run order
    pub fn configs(&self) -> Result<Vec<ChurnConfig>, ConfigError> {
        match self.command {
            Commands::Run {
                segment_count,
                segment_size,
                cycles,
            } => Ok(vec![ChurnConfig::new(segment_count, segment_size, cycles)?]),
            Commands::Scenario { preset, cycles } => Ok(vec![preset.config(cycles)?]),
            Commands::All { cycles } => Scenario::ALL
                .iter()
                .map(|preset| preset.config(cycles))
                .collect(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum SamplerKind {
    /// Current RSS from /proc/self/statm.
    Statm,
    /// Peak RSS from getrusage; never decreases.
    PeakRss,
}

impl SamplerKind {
    pub fn build(&self) -> Result<Box<dyn MemorySampler>, SampleError> {
        match self {
            SamplerKind::Statm => Ok(Box::new(StatmSampler::open()?)),
            SamplerKind::PeakRss => Ok(Box::new(PeakRssSampler)),
        }
    }
}
