use std::path::PathBuf;

use crate::args::BenchArgs;
use crate::bench::{BenchSettings, Target, ToolBinaries, assign_bridge_ports};
use crate::bridge::{BridgeSettings, PoolConfig};
use crate::error::{AppResult, ConfigError};

use super::apply::{pause_duration, positive_duration};
use super::types::PoolFileConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub image: PathBuf,
    pub export_json: Option<PathBuf>,
    pub no_chart: bool,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub targets: Vec<Target>,
    pub bench: BenchSettings,
    pub bridge: BridgeSettings,
    pub output: OutputSettings,
    pub bridge_only: bool,
}

impl RunSettings {
    /// Builds the run settings from arguments that already carry config
    /// values, plus the config-only pool overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when no targets are configured, bridge ports
    /// overflow, or a pool override is invalid.
    pub fn resolve(args: &BenchArgs, pool: Option<&PoolFileConfig>) -> AppResult<Self> {
        let targets = assign_bridge_ports(args.hosts.clone(), args.base_port)?;

        let bench = BenchSettings {
            tool: args.tool,
            requests: args.requests.get(),
            connections: u64::try_from(args.connections.get()).unwrap_or(u64::MAX),
            pipelined: args.pipelined.get(),
            threads: args.threads.get(),
            probe_duration: args.probe_duration,
            latency_duration: args.latency_duration,
            inter_target_sleep: args.inter_target_sleep,
            phase_timeout: args.phase_timeout,
            script: args.script.as_ref().map(PathBuf::from),
            tmp_path: PathBuf::from(&args.tmp_path),
            binaries: ToolBinaries {
                wrk: args.wrk_bin.clone(),
                wrk2: args.wrk2_bin.clone(),
                redis_benchmark: args.redis_benchmark_bin.clone(),
            },
        };

        let mut pool_config = PoolConfig::with_connections(args.connections.get());
        if let Some(overrides) = pool {
            apply_pool_overrides(&mut pool_config, overrides)?;
        }
        let bridge = BridgeSettings {
            bind: args.bind,
            base_port: args.base_port,
            flush_threshold: args.pipelined.as_non_zero(),
            pool: pool_config,
        };

        let output = OutputSettings {
            image: PathBuf::from(&args.image),
            export_json: args.export_json.as_ref().map(PathBuf::from),
            no_chart: args.no_chart,
        };

        Ok(Self {
            targets,
            bench,
            bridge,
            output,
            bridge_only: args.bridge_only,
        })
    }
}

fn apply_pool_overrides(config: &mut PoolConfig, overrides: &PoolFileConfig) -> Result<(), ConfigError> {
    if let Some(max_active) = overrides.max_active {
        if max_active == 0 {
            return Err(ConfigError::FieldMustBePositive {
                field: "pool.max_active",
            });
        }
        config.max_active = max_active;
    }
    if let Some(max_idle) = overrides.max_idle {
        config.max_idle = max_idle;
    }
    if let Some(idle_timeout) = overrides.idle_timeout.as_ref() {
        let idle_timeout = pause_duration(idle_timeout, "pool.idle_timeout")?;
        config.idle_timeout = (!idle_timeout.is_zero()).then_some(idle_timeout);
    }
    if let Some(health_check_after) = overrides.health_check_after.as_ref() {
        config.health_check_after = pause_duration(health_check_after, "pool.health_check_after")?;
    }
    if let Some(acquire_timeout) = overrides.acquire_timeout.as_ref() {
        let acquire_timeout = pause_duration(acquire_timeout, "pool.acquire_timeout")?;
        config.acquire_timeout = (!acquire_timeout.is_zero()).then_some(acquire_timeout);
    }
    if let Some(dial_timeout) = overrides.dial_timeout.as_ref() {
        config.dial_timeout = positive_duration(dial_timeout, "pool.dial_timeout")?;
    }
    Ok(())
}
