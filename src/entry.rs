use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{info, warn};

use crate::args::BenchArgs;
use crate::backend::RedisConnector;
use crate::bench::{Orchestrator, RunReport, Target, TokioProcessRunner};
use crate::bridge::{RegistryLauncher, TargetRegistry, start_bridge};
use crate::charts::render_comparison_chart;
use crate::config::{DEFAULT_CONFIG_FILES, OutputSettings, RunSettings, apply_config, load_config};
use crate::error::{AppError, AppResult, RenderError};
use crate::results::ResultSet;
use crate::shutdown::{
    ShutdownSender, setup_signal_shutdown_handler, shutdown_channel, wait_for_shutdown,
};

/// Parses arguments, runs the benchmarks and writes the output artifacts.
///
/// # Errors
///
/// Returns an error for invalid configuration, bridge setup failures, or
/// when no comparison artifact can be produced.
pub fn run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };

    crate::logger::init_logging(args.verbose, args.no_color);

    let config = load_config(args.config.as_deref())?;
    if let Some(config) = config.as_ref() {
        apply_config(&mut args, &matches, config)?;
    }
    let settings = RunSettings::resolve(&args, config.as_ref().and_then(|file| file.pool.as_ref()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let Some(results) = runtime.block_on(run_async(&settings))? else {
        return Ok(());
    };
    write_outputs(&results, &settings.output)
}

fn parse_args() -> AppResult<Option<(BenchArgs, ArgMatches)>> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(settings: &RunSettings) -> AppResult<Option<ResultSet>> {
    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let bridged: &[Target] = if settings.bridge_only || settings.bench.tool.uses_bridge() {
        &settings.targets
    } else {
        &[]
    };
    let dial_timeout = settings.bridge.pool.dial_timeout;
    let registry = Arc::new(TargetRegistry::build(bridged, &settings.bridge, |target| {
        RedisConnector::new(&target.host, target.backend_port, dial_timeout)
    })?);

    let outcome = if settings.bridge_only {
        serve_bridges(&registry, settings, &shutdown_tx).await.map(|()| None)
    } else {
        benchmark(&registry, settings, &shutdown_tx).await.map(Some)
    };

    drop(shutdown_tx.send(()));
    registry.shutdown().await;
    signal_handle.await?;

    let Some(report) = outcome? else {
        return Ok(None);
    };
    summarize(&report);
    Ok(Some(report.results))
}

async fn benchmark(
    registry: &Arc<TargetRegistry<RedisConnector>>,
    settings: &RunSettings,
    shutdown_tx: &ShutdownSender,
) -> AppResult<RunReport> {
    let launcher = RegistryLauncher::new(Arc::clone(registry), settings.bridge.bind, shutdown_tx.clone());
    let mut orchestrator = Orchestrator::new(
        TokioProcessRunner,
        launcher,
        settings.bench.clone(),
        shutdown_tx.subscribe(),
    );
    let report = orchestrator.run(&settings.targets).await;

    // Bridges serve until the run is over.
    drop(shutdown_tx.send(()));
    for server in orchestrator.into_launcher().into_servers() {
        server.join().await?;
    }
    report
}

async fn serve_bridges(
    registry: &TargetRegistry<RedisConnector>,
    settings: &RunSettings,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    let mut servers = Vec::with_capacity(registry.len());
    for port in registry.ports() {
        servers.push(start_bridge(registry, port, settings.bridge.bind, shutdown_tx.subscribe()).await?);
    }
    info!(bridges = servers.len(), "Bridges running, press Ctrl+C to stop");
    wait_for_shutdown(shutdown_tx.subscribe()).await;
    for server in servers {
        server.join().await?;
    }
    Ok(())
}

fn summarize(report: &RunReport) {
    for result in &report.results {
        println!("{}", result.legend_label());
    }
    for failure in &report.failures {
        warn!(
            target_name = %failure.target,
            phase = %failure.phase,
            error = %failure.error,
            "Target produced no result"
        );
    }
    if report.cancelled {
        warn!(
            collected = report.results.len(),
            "Run cancelled, writing partial results"
        );
    }
}

fn write_outputs(results: &ResultSet, output: &OutputSettings) -> AppResult<()> {
    if results.is_empty() {
        return Err(AppError::render(RenderError::EmptyResultSet));
    }
    if let Some(path) = output.export_json.as_ref() {
        results.export_json(path)?;
        info!(path = %path.display(), "Results exported");
    }
    if !output.no_chart {
        render_comparison_chart(results, &output.image)?;
    }
    Ok(())
}
