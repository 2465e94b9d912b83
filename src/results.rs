//! Ordered collection of per-target results, as fed to the chart.
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::RenderError;
use crate::report::BenchmarkResult;

/// Results in the order their targets were benchmarked. Position drives
/// colour and legend order; entries sharing a name stay distinct.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    entries: Vec<BenchmarkResult>,
}

/// One chart line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    generated_at: String,
    results: &'a [BenchmarkResult],
}

impl ResultSet {
    #[must_use]
    pub fn aggregate<I>(results: I) -> Self
    where
        I: IntoIterator<Item = BenchmarkResult>,
    {
        Self {
            entries: results.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkResult> {
        self.entries.iter()
    }

    #[must_use]
    pub fn entries(&self) -> &[BenchmarkResult] {
        &self.entries
    }

    #[must_use]
    pub fn series(&self) -> Vec<ChartSeries> {
        self.entries
            .iter()
            .map(|result| ChartSeries {
                label: result.legend_label(),
                points: result
                    .latency_points
                    .iter()
                    .map(|point| (point.percentile, point.latency_ms))
                    .collect(),
            })
            .collect()
    }

    /// Writes the results as pretty JSON with a generation timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn export_json(&self, path: &Path) -> Result<(), RenderError> {
        let document = ExportDocument {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            results: &self.entries,
        };
        let payload = serde_json::to_string_pretty(&document)
            .map_err(|err| RenderError::Serialize { source: err })?;
        ensure_parent_dir(path)?;
        std::fs::write(path, payload).map_err(|err| RenderError::Write {
            path: path.to_path_buf(),
            source: err,
        })
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a BenchmarkResult;
    type IntoIter = std::slice::Iter<'a, BenchmarkResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), RenderError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| RenderError::CreateDir {
                path: parent.to_path_buf(),
                source: err,
            })
        }
        Some(_) | None => Ok(()),
    }
}
