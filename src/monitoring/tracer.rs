/*!
 * Structured Tracing
 * Log setup and run spans using the tracing crate
 *
 * Logs always go to stderr; stdout is reserved for the report.
 */

use crate::churn::ChurnConfig;
use tracing::{info, info_span, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CHURN_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("CHURN_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
    }
}

/// Span wrapping one churn run
pub fn run_span(run_id: Uuid, config: &ChurnConfig) -> Span {
    info_span!(
        "churn_run",
        run_id = %run_id,
        segment_count = config.segment_count,
        segment_size = config.segment_size,
        cycle_limit = config.cycle_limit,
    )
}
