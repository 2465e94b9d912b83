use crate::error::{Grammar, ReportError};

use super::units::parse_finite;

const GRAMMAR: Grammar = Grammar::RequestsPerSec;
const REQUESTS_PER_SEC_LABEL: &str = "Requests/sec:";

/// Reads the `Requests/sec: <value>` summary line of wrk and wrk2.
///
/// # Errors
///
/// Returns an error when the line is missing or its value is not a finite number.
pub fn parse_requests_per_sec(output: &str) -> Result<f64, ReportError> {
    let value = output
        .lines()
        .map(str::trim_start)
        .find(|line| line.starts_with(REQUESTS_PER_SEC_LABEL))
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or(ReportError::MissingThroughput { grammar: GRAMMAR })?;
    parse_finite(GRAMMAR, value)
}
