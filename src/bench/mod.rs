//! Sequential benchmark orchestration.
//!
//! Targets are benchmarked one at a time. In HTTP mode each target gets a
//! bridge, a saturation probe and a fixed-rate latency run; in direct mode
//! the micro-benchmark tool talks to the backend itself.
mod orchestrator;
mod process;
mod script;
mod target;
mod tools;


use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::args::LoadTool;
use crate::error::AppResult;

pub use orchestrator::{Orchestrator, RunReport, TargetFailure, TargetPhase};
pub use process::{ProcessOutput, ProcessRunner, ProcessSpec, TokioProcessRunner};
pub use script::{WRITE_SCRIPT_NAME, prepare_script};
pub use target::{Target, TargetSpec, assign_bridge_ports};
pub use tools::{bridge_url, latency_rate, redis_benchmark_spec, wrk_spec};

/// Grace added on top of a duration-bound phase before it is killed.
pub const PHASE_TIMEOUT_GRACE: Duration = Duration::from_secs(30);
/// Limit for request-count-bound runs, which have no duration of their own.
pub const DIRECT_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Starts the bridge for a target and reports where it listens.
#[async_trait]
pub trait BridgeLauncher: Send {
    async fn launch(&mut self, target: &Target) -> AppResult<SocketAddr>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolBinaries {
    pub wrk: String,
    pub wrk2: String,
    pub redis_benchmark: String,
}

impl Default for ToolBinaries {
    fn default() -> Self {
        Self {
            wrk: "wrk".to_owned(),
            wrk2: "wrk2".to_owned(),
            redis_benchmark: "redis-benchmark".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchSettings {
    pub tool: LoadTool,
    pub requests: u64,
    pub connections: u64,
    pub pipelined: u64,
    pub threads: u64,
    pub probe_duration: Duration,
    pub latency_duration: Duration,
    pub inter_target_sleep: Duration,
    pub phase_timeout: Option<Duration>,
    pub script: Option<PathBuf>,
    pub tmp_path: PathBuf,
    pub binaries: ToolBinaries,
}

impl BenchSettings {
    /// Timeout for a phase that runs for `duration`.
    #[must_use]
    pub fn timed_phase_timeout(&self, duration: Duration) -> Duration {
        self.phase_timeout
            .unwrap_or_else(|| duration.saturating_add(PHASE_TIMEOUT_GRACE))
    }

    #[must_use]
    pub fn direct_run_timeout(&self) -> Duration {
        self.phase_timeout.unwrap_or(DIRECT_RUN_TIMEOUT)
    }
}
