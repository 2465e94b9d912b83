use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BenchArgs, PositiveU64, PositiveUsize};
use crate::bench::TargetSpec;
use crate::error::ConfigError;

use super::types::{BinariesConfig, ConfigFile, DurationValue, TargetConfig};

/// Fills every argument not given on the command line from the config.
///
/// # Errors
///
/// Returns an error when a config value is out of range or malformed.
pub fn apply_config(
    args: &mut BenchArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_cli(matches, "hosts")
        && let Some(targets) = config.targets.as_ref()
    {
        args.hosts = targets_from_config(targets)?;
    }

    if !is_cli(matches, "image")
        && let Some(image) = config.image.clone()
    {
        args.image = image;
    }

    if !is_cli(matches, "export_json")
        && let Some(path) = config.export_json.clone()
    {
        args.export_json = Some(path);
    }

    if !is_cli(matches, "no_chart")
        && let Some(no_chart) = config.no_chart
    {
        args.no_chart = no_chart;
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = ensure_positive_u64(requests, "requests")?;
    }

    if !is_cli(matches, "connections")
        && let Some(connections) = config.connections
    {
        args.connections = ensure_positive_usize(connections, "connections")?;
    }

    if !is_cli(matches, "pipelined")
        && let Some(pipelined) = config.pipelined
    {
        args.pipelined = ensure_positive_u64(pipelined, "pipelined")?;
    }

    if !is_cli(matches, "threads")
        && let Some(threads) = config.threads
    {
        args.threads = ensure_positive_u64(threads, "threads")?;
    }

    if !is_cli(matches, "tool")
        && let Some(tool) = config.tool
    {
        args.tool = tool;
    }

    if !is_cli(matches, "probe_duration")
        && let Some(duration) = config.probe_duration.as_ref()
    {
        args.probe_duration = positive_duration(duration, "probe_duration")?;
    }

    if !is_cli(matches, "latency_duration")
        && let Some(duration) = config.latency_duration.as_ref()
    {
        args.latency_duration = positive_duration(duration, "latency_duration")?;
    }

    if !is_cli(matches, "inter_target_sleep")
        && let Some(pause) = config.sleep.as_ref()
    {
        args.inter_target_sleep = pause_duration(pause, "sleep")?;
    }

    if !is_cli(matches, "phase_timeout")
        && let Some(timeout) = config.phase_timeout.as_ref()
    {
        args.phase_timeout = Some(positive_duration(timeout, "phase_timeout")?);
    }

    if !is_cli(matches, "base_port")
        && let Some(base_port) = config.base_port
    {
        args.base_port = base_port;
    }

    if !is_cli(matches, "bind")
        && let Some(bind) = config.bind.as_ref()
    {
        args.bind = bind
            .trim()
            .parse()
            .map_err(|err| ConfigError::InvalidBind {
                value: bind.clone(),
                source: err,
            })?;
    }

    if !is_cli(matches, "script")
        && let Some(script) = config.script.clone()
    {
        args.script = Some(script);
    }

    if !is_cli(matches, "tmp_path")
        && let Some(tmp_path) = config.tmp_path.clone()
    {
        args.tmp_path = tmp_path;
    }

    if let Some(binaries) = config.binaries.as_ref() {
        apply_binaries(args, matches, binaries);
    }

    Ok(())
}

fn apply_binaries(args: &mut BenchArgs, matches: &ArgMatches, binaries: &BinariesConfig) {
    if !is_cli(matches, "wrk_bin")
        && let Some(wrk) = binaries.wrk.clone()
    {
        args.wrk_bin = wrk;
    }
    if !is_cli(matches, "wrk2_bin")
        && let Some(wrk2) = binaries.wrk2.clone()
    {
        args.wrk2_bin = wrk2;
    }
    if !is_cli(matches, "redis_benchmark_bin")
        && let Some(redis_benchmark) = binaries.redis_benchmark.clone()
    {
        args.redis_benchmark_bin = redis_benchmark;
    }
}

fn targets_from_config(targets: &[TargetConfig]) -> Result<Vec<TargetSpec>, ConfigError> {
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            let host = target
                .host
                .as_deref()
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .ok_or(ConfigError::TargetMissingHost { index })?;
            let name = target
                .name
                .clone()
                .unwrap_or_else(|| format!("{} {}", host, target.port));
            Ok(TargetSpec {
                name,
                host: host.to_owned(),
                port: target.port,
            })
        })
        .collect()
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_u64(value: u64, field: &'static str) -> Result<PositiveU64, ConfigError> {
    PositiveU64::try_from(value).map_err(|_err| ConfigError::FieldMustBePositive { field })
}

fn ensure_positive_usize(value: usize, field: &'static str) -> Result<PositiveUsize, ConfigError> {
    PositiveUsize::try_from(value).map_err(|_err| ConfigError::FieldMustBePositive { field })
}

pub(crate) fn positive_duration(
    value: &DurationValue,
    field: &'static str,
) -> Result<std::time::Duration, ConfigError> {
    value
        .to_duration()
        .map_err(|err| ConfigError::InvalidDuration { field, source: err })
}

pub(crate) fn pause_duration(
    value: &DurationValue,
    field: &'static str,
) -> Result<std::time::Duration, ConfigError> {
    value
        .to_pause()
        .map_err(|err| ConfigError::InvalidDuration { field, source: err })
}
