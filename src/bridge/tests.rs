use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::test_support::{FakeBackend, FakeConnector};
use super::*;
use crate::backend::SetCommand;
use crate::bench::Target;
use crate::error::{AppError, AppResult, ConnectionError, ValidationError};
use crate::shutdown::shutdown_channel;

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn run_paused_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn threshold(value: u64) -> AppResult<NonZeroU64> {
    NonZeroU64::new(value).ok_or_else(|| AppError::validation("threshold must be positive"))
}

fn command(index: usize) -> SetCommand {
    SetCommand::new(
        Bytes::from(format!("key-{}", index)),
        Bytes::from(format!("value-{}", index)),
    )
}

fn small_pool(max_active: usize) -> PoolConfig {
    PoolConfig::with_connections(max_active)
}

fn pipeline(
    backend: &FakeBackend,
    config: PoolConfig,
    flush_threshold: u64,
) -> AppResult<PipelineManager<FakeConnector>> {
    let pool = Arc::new(ConnectionPool::new(backend.connector(), config));
    Ok(PipelineManager::new(pool, threshold(flush_threshold)?))
}

fn target(name: &str, bridge_port: u16) -> Target {
    Target {
        name: name.to_owned(),
        host: "127.0.0.1".to_owned(),
        backend_port: 6379,
        bridge_port,
    }
}

fn bridge_settings(flush_threshold: u64) -> AppResult<BridgeSettings> {
    Ok(BridgeSettings {
        bind: LOOPBACK,
        base_port: 0,
        flush_threshold: threshold(flush_threshold)?,
        pool: small_pool(4),
    })
}

fn single_lane_registry(
    backend: &FakeBackend,
    flush_threshold: u64,
) -> AppResult<TargetRegistry<FakeConnector>> {
    TargetRegistry::build(
        &[target("fake", 0)],
        &bridge_settings(flush_threshold)?,
        |_target| Ok(backend.connector()),
    )
}

#[test]
fn flushes_once_per_threshold() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let manager = pipeline(&backend, small_pool(2), 4)?;

        let mut flushed = Vec::new();
        for index in 0..10 {
            if let Submitted::Flushed {
                request, sequence, ..
            } = manager.submit(command(index)).await?
            {
                flushed.push((request, sequence));
            }
        }

        if flushed != [(4, 1), (8, 2)] {
            return Err(AppError::validation(format!(
                "Unexpected flushes: {:?}",
                flushed
            )));
        }
        if backend.batch_sizes() != [4, 4] {
            return Err(AppError::validation(format!(
                "Unexpected batches: {:?}",
                backend.batch_sizes()
            )));
        }
        let stats = manager.stats();
        if stats.requests != 10 || stats.flushes != 2 || stats.queued != 2 {
            return Err(AppError::validation(format!(
                "Unexpected stats: {:?}",
                stats
            )));
        }
        Ok(())
    })
}

#[test]
fn batches_keep_submission_order() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let manager = pipeline(&backend, small_pool(1), 3)?;
        for index in 0..3 {
            manager.submit(command(index)).await?;
        }

        let expected = vec![vec![command(0), command(1), command(2)]];
        if backend.batches() != expected {
            return Err(AppError::validation(format!(
                "Unexpected batch contents: {:?}",
                backend.batches()
            )));
        }
        Ok(())
    })
}

#[test]
fn concurrent_submissions_flush_exactly_floor_of_requests() -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(async {
        let backend = FakeBackend::default();
        let manager = Arc::new(pipeline(&backend, small_pool(8), 8)?);

        let mut handles = Vec::new();
        for worker in 0..8_usize {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for index in 0..25_usize {
                    let id = worker.saturating_mul(100).saturating_add(index);
                    manager.submit(command(id)).await?;
                }
                Ok::<(), AppError>(())
            }));
        }
        for handle in handles {
            handle.await??;
        }

        let sizes = backend.batch_sizes();
        if sizes.len() != 25 || sizes.iter().any(|size| *size != 8) {
            return Err(AppError::validation(format!(
                "Expected 25 batches of 8, got {:?}",
                sizes
            )));
        }
        let stats = manager.stats();
        if stats.requests != 200 || stats.queued != 0 {
            return Err(AppError::validation(format!(
                "Unexpected stats: {:?}",
                stats
            )));
        }
        Ok(())
    })
}

#[test]
fn failed_flush_drops_batch_and_next_cycle_starts_clean() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let manager = pipeline(&backend, small_pool(1), 2)?;
        backend.fail_execute(true);

        manager.submit(command(1)).await?;
        let failure = match manager.submit(command(2)).await {
            Ok(submitted) => {
                return Err(AppError::validation(format!(
                    "Expected flush failure, got {:?}",
                    submitted
                )));
            }
            Err(err) => err,
        };
        if failure.sequence != 1 || failure.commands != 2 {
            return Err(AppError::validation(format!(
                "Unexpected failure: {:?}",
                failure
            )));
        }
        if manager.stats().queued != 0 {
            return Err(AppError::validation("Failed batch was kept queued"));
        }

        backend.fail_execute(false);
        manager.submit(command(3)).await?;
        let submitted = manager.submit(command(4)).await?;
        if !matches!(submitted, Submitted::Flushed { sequence: 2, commands: 2, .. }) {
            return Err(AppError::validation(format!(
                "Unexpected second flush: {:?}",
                submitted
            )));
        }
        if backend.batches() != vec![vec![command(3), command(4)]] {
            return Err(AppError::validation(format!(
                "Unexpected batches: {:?}",
                backend.batches()
            )));
        }
        Ok(())
    })
}

#[test]
fn flush_pending_drains_remainder_once() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let manager = pipeline(&backend, small_pool(1), 4)?;
        for index in 0..6 {
            manager.submit(command(index)).await?;
        }

        let drained = manager.flush_pending().await?;
        let again = manager.flush_pending().await?;

        if drained != 2 || again != 0 {
            return Err(AppError::validation(format!(
                "Unexpected drains: {} then {}",
                drained, again
            )));
        }
        if backend.batch_sizes() != [4, 2] {
            return Err(AppError::validation(format!(
                "Unexpected batches: {:?}",
                backend.batch_sizes()
            )));
        }
        Ok(())
    })
}

#[test]
fn fresh_idle_connection_is_reused_without_probe() -> AppResult<()> {
    run_paused_test(async {
        let backend = FakeBackend::default();
        let pool = ConnectionPool::new(backend.connector(), small_pool(2));

        let conn = pool.acquire().await?;
        pool.release(conn);
        tokio::time::advance(Duration::from_secs(59)).await;
        let conn = pool.acquire().await?;
        pool.release(conn);

        if backend.dials() != 1 || backend.pings() != 0 {
            return Err(AppError::validation(format!(
                "Expected one dial and no probes, got {} dials and {} probes",
                backend.dials(),
                backend.pings()
            )));
        }
        Ok(())
    })
}

#[test]
fn stale_idle_connection_is_probed_once() -> AppResult<()> {
    run_paused_test(async {
        let backend = FakeBackend::default();
        let pool = ConnectionPool::new(backend.connector(), small_pool(2));

        let conn = pool.acquire().await?;
        pool.release(conn);
        tokio::time::advance(DEFAULT_HEALTH_CHECK_AFTER).await;
        let conn = pool.acquire().await?;

        if backend.dials() != 1 || backend.pings() != 1 {
            return Err(AppError::validation(format!(
                "Expected one dial and one probe, got {} dials and {} probes",
                backend.dials(),
                backend.pings()
            )));
        }
        pool.release(conn);
        Ok(())
    })
}

#[test]
fn failed_probe_discards_and_redials() -> AppResult<()> {
    run_paused_test(async {
        let backend = FakeBackend::default();
        let pool = ConnectionPool::new(backend.connector(), small_pool(2));

        let conn = pool.acquire().await?;
        pool.release(conn);
        backend.fail_ping(true);
        tokio::time::advance(Duration::from_secs(90)).await;
        let conn = pool.acquire().await?;

        let stats = pool.stats();
        if backend.dials() != 2 || stats.probes != 1 || stats.discarded != 1 {
            return Err(AppError::validation(format!(
                "Unexpected stats after failed probe: dials {} {:?}",
                backend.dials(),
                stats
            )));
        }
        pool.release(conn);
        Ok(())
    })
}

#[test]
fn idle_timeout_evicts_without_probe() -> AppResult<()> {
    run_paused_test(async {
        let backend = FakeBackend::default();
        let pool = ConnectionPool::new(backend.connector(), small_pool(2));

        let conn = pool.acquire().await?;
        pool.release(conn);
        tokio::time::advance(DEFAULT_IDLE_TIMEOUT).await;
        let conn = pool.acquire().await?;

        if backend.dials() != 2 || backend.pings() != 0 {
            return Err(AppError::validation(format!(
                "Expected a redial without probing, got {} dials and {} probes",
                backend.dials(),
                backend.pings()
            )));
        }
        pool.release(conn);
        Ok(())
    })
}

#[test]
fn exhausted_pool_fails_fast_without_acquire_timeout() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let config = PoolConfig {
            acquire_timeout: None,
            ..small_pool(1)
        };
        let pool = ConnectionPool::new(backend.connector(), config);

        let held = pool.acquire().await?;
        let result = pool.acquire().await;
        if !matches!(
            result,
            Err(ConnectionError::PoolExhausted { max_active: 1, waited }) if waited == Duration::ZERO
        ) {
            return Err(AppError::validation("Expected immediate exhaustion"));
        }
        pool.release(held);
        Ok(())
    })
}

#[test]
fn exhausted_pool_waits_up_to_acquire_timeout() -> AppResult<()> {
    run_paused_test(async {
        let backend = FakeBackend::default();
        let config = PoolConfig {
            acquire_timeout: Some(Duration::from_secs(1)),
            ..small_pool(1)
        };
        let pool = Arc::new(ConnectionPool::new(backend.connector(), config));

        let held = pool.acquire().await?;
        let result = pool.acquire().await;
        if !matches!(
            result,
            Err(ConnectionError::PoolExhausted { waited, .. }) if waited == Duration::from_secs(1)
        ) {
            return Err(AppError::validation("Expected exhaustion after waiting"));
        }

        let releaser = Arc::clone(&pool);
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            releaser.release(held);
        });
        let conn = pool.acquire().await?;
        release.await?;
        if backend.dials() != 1 {
            return Err(AppError::validation(format!(
                "Waiter should reuse the released connection, got {} dials",
                backend.dials()
            )));
        }
        pool.release(conn);
        Ok(())
    })
}

#[test]
fn dial_failure_frees_slot_and_pool_recovers() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let pool = ConnectionPool::new(backend.connector(), small_pool(1));

        backend.fail_dial(true);
        if !matches!(pool.acquire().await, Err(ConnectionError::Dial { .. })) {
            return Err(AppError::validation("Expected dial failure"));
        }
        if pool.stats().active != 0 {
            return Err(AppError::validation("Failed dial kept its slot"));
        }

        backend.fail_dial(false);
        let conn = pool.acquire().await?;
        pool.release(conn);
        Ok(())
    })
}

#[test]
fn release_beyond_max_idle_discards() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let config = PoolConfig {
            max_idle: 1,
            ..small_pool(2)
        };
        let pool = ConnectionPool::new(backend.connector(), config);

        let first = pool.acquire().await?;
        let second = pool.acquire().await?;
        pool.release(first);
        pool.release(second);

        let stats = pool.stats();
        if stats.idle != 1 || stats.discarded != 1 || stats.active != 0 {
            return Err(AppError::validation(format!(
                "Unexpected stats: {:?}",
                stats
            )));
        }
        Ok(())
    })
}

#[test]
fn closed_pool_rejects_acquire() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let pool = ConnectionPool::new(backend.connector(), small_pool(2));
        let conn = pool.acquire().await?;
        pool.release(conn);

        pool.close();

        if pool.stats().idle != 0 {
            return Err(AppError::validation("Idle connections survived close"));
        }
        if !matches!(pool.acquire().await, Err(ConnectionError::PoolClosed)) {
            return Err(AppError::validation("Expected closed pool error"));
        }
        Ok(())
    })
}

#[test]
fn registry_rejects_duplicate_bridge_ports() -> AppResult<()> {
    let backend = FakeBackend::default();
    let result = TargetRegistry::build(
        &[target("a", 8080), target("b", 8080)],
        &bridge_settings(1)?,
        |_target| Ok(backend.connector()),
    );
    match result {
        Err(AppError::Validation(ValidationError::DuplicateBridgePort { port: 8080 })) => Ok(()),
        Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::validation("Expected duplicate port error")),
    }
}

#[test]
fn start_bridge_rejects_unknown_port() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let registry = single_lane_registry(&backend, 1)?;
        let (_shutdown_tx, shutdown_rx) = shutdown_channel();

        match start_bridge(&registry, 9, LOOPBACK, shutdown_rx).await {
            Err(AppError::Validation(ValidationError::UnknownBridgePort { port: 9 })) => Ok(()),
            Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
            Ok(_) => Err(AppError::validation("Expected unknown port error")),
        }
    })
}

async fn post(
    client: &reqwest::Client,
    url: &str,
    method: reqwest::Method,
    key: &str,
) -> AppResult<reqwest::StatusCode> {
    let response = client
        .request(method, url)
        .header(KEY_HEADER, key)
        .header(VALUE_HEADER, format!("{}-value", key))
        .send()
        .await
        .map_err(|err| AppError::validation(format!("Request failed: {}", err)))?;
    Ok(response.status())
}

#[test]
fn bridge_turns_requests_into_pipelined_sets() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let registry = single_lane_registry(&backend, 2)?;
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let server = start_bridge(&registry, 0, LOOPBACK, shutdown_rx).await?;
        let url = format!("http://{}/anything", server.local_addr());
        let client = reqwest::Client::new();

        let statuses = vec![
            post(&client, &url, reqwest::Method::POST, "a").await?,
            post(&client, &url, reqwest::Method::GET, "b").await?,
            post(&client, &url, reqwest::Method::PUT, "c").await?,
        ];
        if statuses.iter().any(|status| *status != reqwest::StatusCode::OK) {
            return Err(AppError::validation(format!(
                "Unexpected statuses: {:?}",
                statuses
            )));
        }
        let first = SetCommand::new(Bytes::from_static(b"a"), Bytes::from_static(b"a-value"));
        let second = SetCommand::new(Bytes::from_static(b"b"), Bytes::from_static(b"b-value"));
        if backend.batches() != vec![vec![first, second]] {
            return Err(AppError::validation(format!(
                "Unexpected batches: {:?}",
                backend.batches()
            )));
        }

        drop(client);
        drop(shutdown_tx.send(()));
        server.join().await?;
        registry.shutdown().await;
        if backend.batch_sizes() != [2, 1] {
            return Err(AppError::validation(format!(
                "Shutdown should drain the leftover write, got {:?}",
                backend.batch_sizes()
            )));
        }
        Ok(())
    })
}

#[test]
fn bridge_reports_flush_failure_as_server_error() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        backend.fail_execute(true);
        let registry = single_lane_registry(&backend, 1)?;
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let server = start_bridge(&registry, 0, LOOPBACK, shutdown_rx).await?;
        let url = format!("http://{}/", server.local_addr());
        let client = reqwest::Client::new();

        let status = post(&client, &url, reqwest::Method::POST, "k").await?;
        if status != reqwest::StatusCode::INTERNAL_SERVER_ERROR {
            return Err(AppError::validation(format!(
                "Expected 500, got {}",
                status
            )));
        }

        backend.fail_execute(false);
        let status = post(&client, &url, reqwest::Method::POST, "k").await?;
        if status != reqwest::StatusCode::OK {
            return Err(AppError::validation(format!(
                "Bridge should recover after a failed flush, got {}",
                status
            )));
        }

        drop(client);
        drop(shutdown_tx.send(()));
        server.join().await?;
        Ok(())
    })
}

#[test]
fn launcher_keeps_started_servers() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let registry = Arc::new(single_lane_registry(&backend, 1)?);
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        let mut launcher = RegistryLauncher::new(Arc::clone(&registry), LOOPBACK, shutdown_tx.clone());

        let addr = crate::bench::BridgeLauncher::launch(&mut launcher, &target("fake", 0)).await?;
        if addr.ip() != LOOPBACK || addr.port() == 0 {
            return Err(AppError::validation(format!("Unexpected bridge address {}", addr)));
        }

        drop(shutdown_tx.send(()));
        for server in launcher.into_servers() {
            server.join().await?;
        }
        Ok(())
    })
}

#[test]
fn lane_reports_settings_and_counters() -> AppResult<()> {
    run_async_test(async {
        let backend = FakeBackend::default();
        let registry = single_lane_registry(&backend, 2)?;
        let lane = registry
            .lane(0)
            .ok_or_else(|| AppError::validation("Lane for port 0 missing"))?;

        if lane.flush_threshold().get() != 2 || lane.pool_config().max_active != 4 {
            return Err(AppError::validation(format!(
                "Unexpected lane settings: threshold {} pool {:?}",
                lane.flush_threshold(),
                lane.pool_config()
            )));
        }

        for index in 0..3 {
            lane.write(Bytes::from(format!("k{}", index)), Bytes::from_static(b"v"))
                .await?;
        }
        let pipeline = lane.pipeline_stats();
        let pool = lane.pool_stats();
        if pipeline.requests != 3 || pipeline.flushes != 1 || pipeline.queued != 1 {
            return Err(AppError::validation(format!(
                "Unexpected pipeline stats: {:?}",
                pipeline
            )));
        }
        if pool.dials != 1 || pool.idle != 1 || pool.active != 0 {
            return Err(AppError::validation(format!(
                "Unexpected pool stats: {:?}",
                pool
            )));
        }

        registry.shutdown().await;
        if lane.pipeline_stats().queued != 0 || lane.pool_stats().idle != 0 {
            return Err(AppError::validation("Shutdown left writes or idle connections"));
        }
        Ok(())
    })
}
