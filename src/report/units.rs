use crate::error::{Grammar, ReportError};

/// Factor converting a latency in `unit` to milliseconds. An empty unit is
/// already milliseconds.
pub(crate) fn millis_per_unit(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "" | "ms" | "msec" | "millisecond" | "milliseconds" => Some(1.0),
        "us" | "usec" | "microsecond" | "microseconds" => Some(0.001),
        "ns" | "nanosecond" | "nanoseconds" => Some(0.000_001),
        "s" | "sec" | "second" | "seconds" => Some(1_000.0),
        "m" | "min" | "minute" | "minutes" => Some(60_000.0),
        "h" | "hour" | "hours" => Some(3_600_000.0),
        _ => None,
    }
}

/// Parses a report number, rejecting `nan` and `inf` which `f64` accepts.
pub(crate) fn parse_finite(grammar: Grammar, value: &str) -> Result<f64, ReportError> {
    let number = value
        .parse::<f64>()
        .map_err(|err| ReportError::InvalidNumber {
            grammar,
            value: value.to_owned(),
            source: err,
        })?;
    if !number.is_finite() {
        return Err(ReportError::NonFiniteNumber {
            grammar,
            value: value.to_owned(),
        });
    }
    Ok(number)
}
