use std::collections::BTreeMap;

use crate::error::{Grammar, ReportError};

use super::types::LatencyPoint;
use super::units::{millis_per_unit, parse_finite};

const GRAMMAR: Grammar = Grammar::DistributionTable;
const MEDIAN_ROW_PREFIX: &str = " 50.";
const MIN_PERCENTILE: f64 = 1.0;
const MIN_NATIVE_LATENCY: f64 = 1.0;

/// Parses the latency histogram rows printed by wrk2 `--latency`.
///
/// Rows start at the median row and run until a blank line. Rows under
/// 1 percentile or under 1 in their own unit are dropped. Repeated
/// percentiles keep the last row. Points come back sorted by percentile,
/// latencies in milliseconds, without a terminal point.
///
/// # Errors
///
/// Returns an error when the median row is missing, no row survives
/// filtering, or a row is malformed.
pub fn parse_distribution_table(output: &str) -> Result<Vec<LatencyPoint>, ReportError> {
    let mut lines = output
        .lines()
        .skip_while(|line| !line.starts_with(MEDIAN_ROW_PREFIX))
        .peekable();
    if lines.peek().is_none() {
        return Err(ReportError::MissingBlock { grammar: GRAMMAR });
    }

    // f64 bit patterns order like the values for positive numbers.
    let mut rows: BTreeMap<u64, LatencyPoint> = BTreeMap::new();
    for line in lines.take_while(|line| !line.trim().is_empty()) {
        let (percentile, latency, scale) = parse_row(line)?;
        if percentile < MIN_PERCENTILE || latency < MIN_NATIVE_LATENCY {
            continue;
        }
        rows.insert(
            percentile.to_bits(),
            LatencyPoint::new(percentile, latency * scale),
        );
    }

    if rows.is_empty() {
        return Err(ReportError::NoDataRows { grammar: GRAMMAR });
    }
    Ok(rows.into_values().collect())
}

fn parse_row(line: &str) -> Result<(f64, f64, f64), ReportError> {
    let mut tokens = line.split_whitespace();
    let (Some(percentile_token), Some(latency_token)) = (tokens.next(), tokens.next()) else {
        return Err(ReportError::MalformedRow {
            grammar: GRAMMAR,
            line: line.to_owned(),
        });
    };

    let percentile = parse_number(percentile_token.trim_end_matches('%'))?;
    let unit_start = latency_token
        .find(|ch: char| ch.is_ascii_alphabetic())
        .unwrap_or(latency_token.len());
    let (number, unit) = latency_token.split_at(unit_start);
    let latency = parse_number(number)?;
    let scale = millis_per_unit(unit).ok_or_else(|| ReportError::UnknownUnit {
        grammar: GRAMMAR,
        unit: unit.to_owned(),
        line: line.to_owned(),
    })?;
    Ok((percentile, latency, scale))
}

fn parse_number(value: &str) -> Result<f64, ReportError> {
    parse_finite(GRAMMAR, value)
}
