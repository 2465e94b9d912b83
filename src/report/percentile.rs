use crate::error::{Grammar, ReportError};

use super::types::{LatencyPoint, PercentileReport, close_series};
use super::units::{millis_per_unit, parse_finite};

const GRAMMAR: Grammar = Grammar::PercentileTable;
const THROUGHPUT_MARKER: &str = "requests per second";

/// Parses `<percentile>% <= <latency> <unit>` output.
///
/// The data block is the run of lines after the first blank line, up to
/// the next blank line or end of input. Output that opens directly with a
/// row starts its block on the first line. Throughput comes from the last
/// `... requests per second` line; the max latency from the last row that
/// trails the block, falling back to the last block row.
///
/// # Errors
///
/// Returns an error when there is no block, no usable row, no throughput
/// line, or a row has an unparsable number or unknown unit.
pub fn parse_percentile_table(output: &str) -> Result<PercentileReport, ReportError> {
    let lines: Vec<&str> = output.lines().collect();
    let (start, end) = block_bounds(&lines)?;
    let block = lines.get(start..end).unwrap_or_default();

    let mut points: Vec<LatencyPoint> = Vec::new();
    for line in block.iter().copied().filter(|line| is_row(line)) {
        let point = parse_row(line)?;
        if point.percentile <= 0.0 || point.latency_ms <= 0.0 {
            continue;
        }
        if points
            .last()
            .is_some_and(|last| point.percentile <= last.percentile)
        {
            continue;
        }
        points.push(point);
    }
    let last_row_latency = points
        .last()
        .map(|point| point.latency_ms)
        .ok_or(ReportError::NoDataRows { grammar: GRAMMAR })?;

    let trailing = lines.get(end..).unwrap_or_default();
    let mut max_latency_ms = last_row_latency;
    if let Some(line) = trailing.iter().rev().find(|line| is_row(line)) {
        max_latency_ms = parse_row(line)?.latency_ms;
    }

    let throughput_ops_per_sec = parse_throughput(&lines)?;
    close_series(&mut points);

    Ok(PercentileReport {
        points,
        throughput_ops_per_sec,
        max_latency_ms,
    })
}

fn is_row(line: &str) -> bool {
    line.contains('%') && line.contains("<=")
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn block_bounds(lines: &[&str]) -> Result<(usize, usize), ReportError> {
    let start = if lines.first().is_some_and(|line| is_row(line)) {
        0
    } else {
        let blank = lines
            .iter()
            .position(|line| is_blank(line))
            .ok_or(ReportError::MissingBlock { grammar: GRAMMAR })?;
        let after_blank = blank.saturating_add(1);
        lines
            .iter()
            .skip(after_blank)
            .position(|line| !is_blank(line))
            .map_or(lines.len(), |offset| after_blank.saturating_add(offset))
    };
    let end = lines
        .iter()
        .skip(start)
        .position(|line| is_blank(line))
        .map_or(lines.len(), |offset| start.saturating_add(offset));
    if start >= end {
        return Err(ReportError::MissingBlock { grammar: GRAMMAR });
    }
    Ok((start, end))
}

fn parse_row(line: &str) -> Result<LatencyPoint, ReportError> {
    let malformed = || ReportError::MalformedRow {
        grammar: GRAMMAR,
        line: line.to_owned(),
    };
    let (percentile_part, rest) = line.split_once('%').ok_or_else(malformed)?;
    let (_, latency_part) = rest.split_once("<=").ok_or_else(malformed)?;
    let mut tokens = latency_part.split_whitespace();
    let latency_token = tokens.next().ok_or_else(malformed)?;
    let unit = tokens.next().unwrap_or_default();

    let percentile = parse_number(percentile_part.trim())?;
    let latency = parse_number(latency_token)?;
    let scale = millis_per_unit(unit).ok_or_else(|| ReportError::UnknownUnit {
        grammar: GRAMMAR,
        unit: unit.to_owned(),
        line: line.to_owned(),
    })?;
    Ok(LatencyPoint::new(percentile, latency * scale))
}

fn parse_number(value: &str) -> Result<f64, ReportError> {
    parse_finite(GRAMMAR, value)
}

fn parse_throughput(lines: &[&str]) -> Result<f64, ReportError> {
    let line = lines
        .iter()
        .rev()
        .find(|line| line.contains(THROUGHPUT_MARKER))
        .ok_or(ReportError::MissingThroughput { grammar: GRAMMAR })?;
    let value = line
        .split(THROUGHPUT_MARKER)
        .next()
        .and_then(|head| head.split_whitespace().last())
        .ok_or(ReportError::MissingThroughput { grammar: GRAMMAR })?;
    parse_number(value)
}
