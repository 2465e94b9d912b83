use clap::Parser;
use std::net::IpAddr;
use std::time::Duration;

use crate::bench::TargetSpec;

use super::defaults::{DEFAULT_IMAGE, default_tmp_path};
use super::parsers::{
    parse_bind_addr, parse_duration_arg, parse_pause_arg, parse_positive_u64,
    parse_positive_usize, parse_target,
};
use super::types::{LoadTool, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Comparative latency benchmarks for key-value backends, driven through per-target HTTP bridges.",
    next_help_heading = "Advanced Options"
)]
pub struct BenchArgs {
    /// Targets as 'host:port' or 'name:host:port', comma separated
    #[arg(
        long,
        short = 'H',
        value_delimiter = ',',
        value_parser = parse_target,
        help_heading = "Common Options"
    )]
    pub hosts: Vec<TargetSpec>,

    /// Path to a TOML or JSON config file (defaults to kvbench.toml/kvbench.json)
    #[arg(long, help_heading = "Common Options")]
    pub config: Option<String>,

    /// Where to write the comparison chart (PNG)
    #[arg(long, short = 'i', default_value = DEFAULT_IMAGE, help_heading = "Common Options")]
    pub image: String,

    /// Also export the results as JSON
    #[arg(long = "export-json")]
    pub export_json: Option<String>,

    /// Skip rendering the comparison chart
    #[arg(long = "no-chart")]
    pub no_chart: bool,

    /// Total requests per redis-benchmark run
    #[arg(
        long,
        short = 'r',
        default_value = "10000000",
        value_parser = parse_positive_u64,
        help_heading = "Common Options"
    )]
    pub requests: PositiveU64,

    /// Client connections, also the bridge pool size
    #[arg(
        long,
        short = 'c',
        default_value = "128",
        value_parser = parse_positive_usize,
        help_heading = "Common Options"
    )]
    pub connections: PositiveUsize,

    /// Pipelined requests per connection, also the bridge flush threshold
    #[arg(
        long,
        short = 'p',
        default_value = "128",
        value_parser = parse_positive_u64,
        help_heading = "Common Options"
    )]
    pub pipelined: PositiveU64,

    /// Load generator threads (wrk/wrk2)
    #[arg(long, short = 't', default_value = "2", value_parser = parse_positive_u64)]
    pub threads: PositiveU64,

    /// Load generator to drive the benchmark with
    #[arg(long, default_value = "wrk", value_enum, help_heading = "Common Options")]
    pub tool: LoadTool,

    /// Duration of the throughput probe (supports ms/s/m/h)
    #[arg(long = "probe-duration", default_value = "30s", value_parser = parse_duration_arg)]
    pub probe_duration: Duration,

    /// Duration of the fixed-rate latency run (supports ms/s/m/h)
    #[arg(long = "latency-duration", default_value = "30s", value_parser = parse_duration_arg)]
    pub latency_duration: Duration,

    /// Pause between targets (supports ms/s/m/h, 0 disables)
    #[arg(long = "sleep", default_value = "0", value_parser = parse_pause_arg)]
    pub inter_target_sleep: Duration,

    /// Kill a load generator phase after this long (default: phase duration + 30s, 10m for redis-benchmark)
    #[arg(long = "phase-timeout", value_parser = parse_duration_arg)]
    pub phase_timeout: Option<Duration>,

    /// First bridge port; targets get consecutive ports
    #[arg(long = "base-port", default_value = "8080")]
    pub base_port: u16,

    /// Address the bridges listen on
    #[arg(long, default_value = "0.0.0.0", value_parser = parse_bind_addr)]
    pub bind: IpAddr,

    /// wrk Lua workload script (defaults to a built-in key/value writer)
    #[arg(long)]
    pub script: Option<String>,

    /// Directory for generated scripts
    #[arg(long = "tmp-path", default_value_t = default_tmp_path())]
    pub tmp_path: String,

    /// wrk binary used for the throughput probe
    #[arg(long = "wrk-bin", default_value = "wrk")]
    pub wrk_bin: String,

    /// wrk2 binary used for the fixed-rate latency run
    #[arg(long = "wrk2-bin", default_value = "wrk2")]
    pub wrk2_bin: String,

    /// redis-benchmark binary
    #[arg(long = "redis-benchmark-bin", default_value = "redis-benchmark")]
    pub redis_benchmark_bin: String,

    /// Start the bridges and serve until interrupted, without benchmarking
    #[arg(long = "bridge-only")]
    pub bridge_only: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
