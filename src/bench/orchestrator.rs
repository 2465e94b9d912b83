use std::fmt;
use std::path::Path;

use tracing::{error, info, warn};

use crate::args::LoadTool;
use crate::error::{AppError, AppResult};
use crate::report::{BenchmarkResult, build_direct_result, build_http_result, parse_requests_per_sec};
use crate::results::ResultSet;
use crate::shutdown::{ShutdownReceiver, shutdown_pending, shutdown_requested};

use super::process::ProcessRunner;
use super::script::prepare_script;
use super::tools::{bridge_url, latency_rate, redis_benchmark_spec, wrk_spec};
use super::{BenchSettings, BridgeLauncher, Target};

/// Where a target is in its benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPhase {
    Idle,
    BridgeStarted,
    ThroughputProbe,
    LatencyRun,
    Collected,
}

impl TargetPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetPhase::Idle => "idle",
            TargetPhase::BridgeStarted => "bridge-started",
            TargetPhase::ThroughputProbe => "throughput-probe",
            TargetPhase::LatencyRun => "latency-run",
            TargetPhase::Collected => "collected",
        }
    }
}

impl fmt::Display for TargetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target that was skipped, and the phase it failed in.
#[derive(Debug)]
pub struct TargetFailure {
    pub target: String,
    pub phase: TargetPhase,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub results: ResultSet,
    pub failures: Vec<TargetFailure>,
    /// Shutdown stopped the run before every target was visited.
    pub cancelled: bool,
}

/// Runs targets strictly one after another.
pub struct Orchestrator<R, L> {
    runner: R,
    launcher: L,
    settings: BenchSettings,
    shutdown_rx: ShutdownReceiver,
}

impl<R, L> Orchestrator<R, L>
where
    R: ProcessRunner,
    L: BridgeLauncher,
{
    #[must_use]
    pub const fn new(runner: R, launcher: L, settings: BenchSettings, shutdown_rx: ShutdownReceiver) -> Self {
        Self {
            runner,
            launcher,
            settings,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn into_launcher(self) -> L {
        self.launcher
    }

    /// Benchmarks every target in order. Target-scoped failures are logged
    /// and skipped; shutdown ends the run with what was collected so far.
    ///
    /// # Errors
    ///
    /// Returns an error when the workload script cannot be prepared or a
    /// bridge cannot be started.
    pub async fn run(&mut self, targets: &[Target]) -> AppResult<RunReport> {
        let script = match self.settings.tool {
            LoadTool::Wrk => Some(prepare_script(&self.settings).await?),
            LoadTool::RedisBenchmark => None,
        };

        let mut collected: Vec<BenchmarkResult> = Vec::with_capacity(targets.len());
        let mut report = RunReport::default();

        for (index, target) in targets.iter().enumerate() {
            if index > 0 && !self.pause_between_targets().await {
                report.cancelled = true;
                break;
            }
            if shutdown_pending(&mut self.shutdown_rx) {
                report.cancelled = true;
                break;
            }

            info!(
                target_name = %target.name,
                host = %target.host,
                port = target.backend_port,
                "Running benchmark"
            );
            let mut phase = TargetPhase::Idle;
            let outcome = match script.as_deref() {
                Some(script) => self.run_http(target, script, &mut phase).await,
                None => self.run_direct(target, &mut phase).await,
            };
            match outcome {
                Ok(result) => {
                    info!(target_name = %target.name, "{}", result.legend_label());
                    collected.push(result);
                }
                Err(err) if err.is_cancelled() => {
                    warn!(target_name = %target.name, %phase, "Benchmark cancelled");
                    report.cancelled = true;
                    break;
                }
                Err(err) if err.is_target_scoped() => {
                    error!(
                        target_name = %target.name,
                        %phase,
                        error = %err,
                        "Benchmark failed, skipping target"
                    );
                    report.failures.push(TargetFailure {
                        target: target.name.clone(),
                        phase,
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        report.results = ResultSet::aggregate(collected);
        Ok(report)
    }

    /// Sleeps between targets. Returns false when shutdown interrupted it.
    async fn pause_between_targets(&mut self) -> bool {
        let pause = self.settings.inter_target_sleep;
        if pause.is_zero() {
            return true;
        }
        info!(?pause, "Sleeping between targets");
        tokio::select! {
            () = tokio::time::sleep(pause) => true,
            () = shutdown_requested(&mut self.shutdown_rx) => false,
        }
    }

    async fn run_direct(&mut self, target: &Target, phase: &mut TargetPhase) -> AppResult<BenchmarkResult> {
        *phase = TargetPhase::ThroughputProbe;
        let spec = redis_benchmark_spec(&self.settings, target);
        let output = self
            .runner
            .run(&spec, self.settings.direct_run_timeout(), &mut self.shutdown_rx)
            .await?;

        *phase = TargetPhase::Collected;
        Ok(build_direct_result(&target.name, &output.combined())?)
    }

    async fn run_http(
        &mut self,
        target: &Target,
        script: &Path,
        phase: &mut TargetPhase,
    ) -> AppResult<BenchmarkResult> {
        *phase = TargetPhase::BridgeStarted;
        let addr = self.launcher.launch(target).await?;
        let url = bridge_url(addr)?;

        *phase = TargetPhase::ThroughputProbe;
        let probe_duration = self.settings.probe_duration;
        let probe_spec = wrk_spec(
            &self.settings.binaries.wrk,
            &self.settings,
            script,
            probe_duration,
            None,
            &url,
        );
        let probe = self
            .runner
            .run(
                &probe_spec,
                self.settings.timed_phase_timeout(probe_duration),
                &mut self.shutdown_rx,
            )
            .await?
            .combined();
        let throughput = parse_requests_per_sec(&probe)?;
        let rate = latency_rate(throughput);
        info!(target_name = %target.name, throughput, rate, "Throughput probe finished");

        *phase = TargetPhase::LatencyRun;
        let latency_duration = self.settings.latency_duration;
        let latency_spec = wrk_spec(
            &self.settings.binaries.wrk2,
            &self.settings,
            script,
            latency_duration,
            Some(rate),
            &url,
        );
        let latency = self
            .runner
            .run(
                &latency_spec,
                self.settings.timed_phase_timeout(latency_duration),
                &mut self.shutdown_rx,
            )
            .await?
            .combined();

        *phase = TargetPhase::Collected;
        Ok(build_http_result(&target.name, &probe, &latency)?)
    }
}

