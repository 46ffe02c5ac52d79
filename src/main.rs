/*!
 * churn-probe - Main Entry Point
 *
 * Runs the selected workloads one after another in this process and prints
 * one report per run to stdout. Logs go to stderr.
 */

mod cli;

use churn_probe::{churn, init_tracing, output, MemorySampler, SystemAllocator, TrackingAllocator};
use clap::Parser;
use cli::Cli;
use miette::IntoDiagnostic;
use tracing::info;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> miette::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let configs = cli.configs()?;
    let mut sampler = cli.sampler.build()?;

    info!(
        sampler = sampler.name(),
        runs = configs.len(),
        jemalloc = cfg!(feature = "jemalloc"),
        "churn probe starting"
    );

    let mut reports = Vec::with_capacity(configs.len());
    for config in configs {
        let allocator = TrackingAllocator::new(SystemAllocator);
        match churn::run(config, &allocator, &mut sampler) {
            Ok(mut report) => {
                report.allocation = Some(allocator.stats());
                reports.push(report);
            }
            Err(e) => {
                if let Some(partial) = e.partial_report() {
                    let mut partial = partial.clone();
                    partial.allocation = Some(allocator.stats());
                    reports.push(partial);
                }
                print!(
                    "{}",
                    output::render(&reports, cli.format, cli.tolerance).into_diagnostic()?
                );
                return Err(e.into());
            }
        }
    }

    print!(
        "{}",
        output::render(&reports, cli.format, cli.tolerance).into_diagnostic()?
    );
    Ok(())
}
