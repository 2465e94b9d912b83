use std::net::IpAddr;
use std::time::Duration;

use super::types::{PositiveU64, PositiveUsize};
use crate::bench::TargetSpec;
use crate::config::parse_duration_value;
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_target(s: &str) -> AppResult<TargetSpec> {
    TargetSpec::parse(s).map_err(AppError::from)
}

pub(crate) fn parse_bind_addr(s: &str) -> AppResult<IpAddr> {
    s.trim().parse::<IpAddr>().map_err(|err| {
        AppError::validation(ValidationError::InvalidBindAddress {
            value: s.to_owned(),
            source: err,
        })
    })
}

/// Positive duration such as `30s`, `500ms` or `2m`.
pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s, false).map_err(AppError::from)
}

/// Like [`parse_duration_arg`] but `0` is allowed.
pub(crate) fn parse_pause_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s, true).map_err(AppError::from)
}
