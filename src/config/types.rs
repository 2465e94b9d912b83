use std::time::Duration;

use serde::Deserialize;

use crate::args::LoadTool;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub targets: Option<Vec<TargetConfig>>,
    pub image: Option<String>,
    pub export_json: Option<String>,
    pub no_chart: Option<bool>,
    pub requests: Option<u64>,
    pub connections: Option<usize>,
    pub pipelined: Option<u64>,
    pub threads: Option<u64>,
    pub tool: Option<LoadTool>,
    pub probe_duration: Option<DurationValue>,
    pub latency_duration: Option<DurationValue>,
    #[serde(alias = "inter_target_sleep")]
    pub sleep: Option<DurationValue>,
    pub phase_timeout: Option<DurationValue>,
    pub base_port: Option<u16>,
    pub bind: Option<String>,
    pub script: Option<String>,
    pub tmp_path: Option<String>,
    pub binaries: Option<BinariesConfig>,
    pub pool: Option<PoolFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct TargetConfig {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
pub struct BinariesConfig {
    pub wrk: Option<String>,
    pub wrk2: Option<String>,
    pub redis_benchmark: Option<String>,
}

/// Bridge pool overrides. Zero `idle_timeout` keeps idle connections
/// forever; zero `acquire_timeout` fails fast on an exhausted pool.
#[derive(Debug, Default, Deserialize)]
pub struct PoolFileConfig {
    pub max_active: Option<usize>,
    pub max_idle: Option<usize>,
    pub idle_timeout: Option<DurationValue>,
    pub health_check_after: Option<DurationValue>,
    pub acquire_timeout: Option<DurationValue>,
    pub dial_timeout: Option<DurationValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// Strictly positive duration.
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text, false),
        }
    }

    /// Duration where zero is meaningful.
    pub(crate) fn to_pause(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text, true),
        }
    }
}
