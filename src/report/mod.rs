//! Parsers for the text reports printed by the external load generators.
//!
//! Each grammar is parsed on its own and versioned through
//! [`Grammar`](crate::error::Grammar), so drift in a tool's output shows up
//! as a failing fixture test rather than a silent misparse.
mod distribution;
mod percentile;
mod throughput;
mod types;
mod units;


pub use distribution::parse_distribution_table;
pub use percentile::parse_percentile_table;
pub use throughput::parse_requests_per_sec;
pub use types::{BenchmarkResult, LatencyPoint, PercentileReport, TERMINAL_PERCENTILE};

use crate::error::ReportError;

/// Builds the result of a direct `redis-benchmark` run.
///
/// # Errors
///
/// Returns an error when the output does not hold a usable percentile table.
pub fn build_direct_result(target_name: &str, output: &str) -> Result<BenchmarkResult, ReportError> {
    let report = parse_percentile_table(output)?;
    Ok(BenchmarkResult {
        target_name: target_name.to_owned(),
        latency_points: report.points,
        throughput_ops_per_sec: report.throughput_ops_per_sec,
        max_latency_ms: report.max_latency_ms,
        sustained_ops_per_sec: None,
    })
}

/// Builds the result of an HTTP run from the probe and latency outputs.
/// Throughput comes from the probe, latencies from the fixed-rate run.
///
/// # Errors
///
/// Returns an error when the probe lacks a throughput line or the latency
/// run lacks a usable distribution table.
pub fn build_http_result(
    target_name: &str,
    probe_output: &str,
    latency_output: &str,
) -> Result<BenchmarkResult, ReportError> {
    let throughput_ops_per_sec = parse_requests_per_sec(probe_output)?;
    let mut latency_points = parse_distribution_table(latency_output)?;
    let max_latency_ms = latency_points
        .iter()
        .map(|point| point.latency_ms)
        .fold(0.0_f64, f64::max);
    types::close_series(&mut latency_points);
    Ok(BenchmarkResult {
        target_name: target_name.to_owned(),
        latency_points,
        throughput_ops_per_sec,
        max_latency_ms,
        sustained_ops_per_sec: parse_requests_per_sec(latency_output).ok(),
    })
}
