use serde::Serialize;

/// Percentile appended after the last row so every series reaches the
/// right edge of the chart.
pub const TERMINAL_PERCENTILE: f64 = 101.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyPoint {
    pub percentile: f64,
    pub latency_ms: f64,
}

impl LatencyPoint {
    #[must_use]
    pub const fn new(percentile: f64, latency_ms: f64) -> Self {
        Self {
            percentile,
            latency_ms,
        }
    }
}

/// Structured output of one benchmarked target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub target_name: String,
    /// Strictly increasing percentiles, ending with the terminal point.
    pub latency_points: Vec<LatencyPoint>,
    pub throughput_ops_per_sec: f64,
    pub max_latency_ms: f64,
    /// Rate achieved during the fixed-rate latency run, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustained_ops_per_sec: Option<f64>,
}

impl BenchmarkResult {
    /// Legend text, e.g. `redis max: 9.80ms at 12345.67 ops/sec`.
    #[must_use]
    pub fn legend_label(&self) -> String {
        format!(
            "{} max: {:.2}ms at {:.2} ops/sec",
            self.target_name, self.max_latency_ms, self.throughput_ops_per_sec
        )
    }
}

/// Parsed percentile-table report, terminal point included.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileReport {
    pub points: Vec<LatencyPoint>,
    pub throughput_ops_per_sec: f64,
    pub max_latency_ms: f64,
}

/// Appends the terminal point, repeating the last latency.
pub(crate) fn close_series(points: &mut Vec<LatencyPoint>) {
    if let Some(last) = points.last().copied() {
        points.push(LatencyPoint::new(TERMINAL_PERCENTILE, last.latency_ms));
    }
}
