/*!
 * Report Output
 * Table and JSON rendering of churn reports
 */

use crate::churn::{ChurnReport, LabeledSample, RetentionVerdict};
use serde::Serialize;
use std::fmt::Write as _;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable table per run
    #[default]
    Table,
    /// All reports as one JSON array
    Json,
}

#[derive(Serialize)]
struct ReportView<'a> {
    #[serde(flatten)]
    report: &'a ChurnReport,
    verdict: RetentionVerdict,
    tolerance_bytes: u64,
}

/// Render reports in the requested format
pub fn render(
    reports: &[ChurnReport],
    format: OutputFormat,
    tolerance: u64,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(reports
            .iter()
            .map(|r| render_table(r, tolerance))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => render_json(reports, tolerance),
    }
}

pub fn render_json(reports: &[ChurnReport], tolerance: u64) -> Result<String, serde_json::Error> {
    let views: Vec<ReportView<'_>> = reports
        .iter()
        .map(|report| ReportView {
            report,
            verdict: report.verdict(tolerance),
            tolerance_bytes: tolerance,
        })
        .collect();
    let mut out = serde_json::to_string_pretty(&views)?;
    out.push('\n');
    Ok(out)
}

pub fn render_table(report: &ChurnReport, tolerance: u64) -> String {
    let config = &report.config;
    let priming = report.priming();

    let mut builder = Builder::default();
    builder.push_record(["step", "label", "resident", "vs priming", "live blocks"]);
    for sample in report.baseline.iter().chain(report.samples.iter()) {
        builder.push_record(row(sample, priming));
    }
    let mut table = builder.build();
    table.with(Style::rounded());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "run {}: {} x {} B segments ({} kB per block), {} cycles, sampler {}",
        report.run_id,
        config.segment_count,
        config.segment_size,
        config.block_bytes() / 1024,
        config.cycle_limit,
        report.sampler,
    );
    let _ = writeln!(out, "{}", table);
    let _ = write!(
        out,
        "verdict: {} (tolerance {} kB",
        report.verdict(tolerance),
        tolerance / 1024
    );
    let missing = report.missing_samples();
    if missing > 0 {
        let _ = write!(out, ", {} missing", missing);
    }
    if !report.is_complete() {
        let _ = write!(
            out,
            ", incomplete: {} of {} samples",
            report.samples.len(),
            config.expected_samples()
        );
    }
    let _ = writeln!(out, ")");
    if let Some(stats) = &report.allocation {
        let _ = writeln!(
            out,
            "allocations: {} blocks, {} segments, peak {} live blocks / {} kB, {} failures",
            stats.blocks_allocated,
            stats.segments_allocated,
            stats.peak_live_blocks,
            stats.peak_live_bytes / 1024,
            stats.failures,
        );
    }
    out
}

fn row(sample: &LabeledSample, priming: Option<u64>) -> [String; 5] {
    let resident = sample
        .resident_bytes
        .map(format_kb)
        .unwrap_or_else(|| "-".to_string());
    let delta = match (sample.resident_bytes, priming) {
        (Some(r), Some(p)) => format_delta_kb(r as i128 - p as i128),
        _ => "-".to_string(),
    };
    [
        sample.step.to_string(),
        sample.label.to_string(),
        resident,
        delta,
        sample.live_blocks.to_string(),
    ]
}

fn format_kb(bytes: u64) -> String {
    format!("{} kB", bytes / 1024)
}

fn format_delta_kb(delta: i128) -> String {
    let kb = delta / 1024;
    if kb > 0 {
        format!("+{} kB", kb)
    } else {
        format!("{} kB", kb)
    }
}
