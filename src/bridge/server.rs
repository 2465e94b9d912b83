use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::backend::Connector;
use crate::bench::{BridgeLauncher, Target};
use crate::error::{AppError, AppResult, ValidationError};
use crate::shutdown::{ShutdownReceiver, ShutdownSender, wait_for_shutdown};

use super::pipeline::Submitted;
use super::registry::{BridgeLane, TargetRegistry};

pub const KEY_HEADER: &str = "key";
pub const VALUE_HEADER: &str = "value";

/// A running bridge listener.
pub struct BridgeServer {
    port: u16,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl BridgeServer {
    /// Configured bridge port this listener serves.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the listener to stop after shutdown was broadcast.
    ///
    /// # Errors
    ///
    /// Returns an error when the server task panicked.
    pub async fn join(self) -> AppResult<()> {
        self.task.await?;
        Ok(())
    }
}

/// Binds the listener for `port` and starts serving writes for the lane
/// registered on it.
///
/// # Errors
///
/// Returns an error when no lane is registered for the port or the
/// listener cannot be bound.
pub async fn start_bridge<C: Connector>(
    registry: &TargetRegistry<C>,
    port: u16,
    bind: IpAddr,
    shutdown_rx: ShutdownReceiver,
) -> AppResult<BridgeServer> {
    let lane = registry
        .lane(port)
        .ok_or_else(|| AppError::validation(ValidationError::UnknownBridgePort { port }))?;
    let addr = SocketAddr::new(bind, port);
    let listener = TcpListener::bind(addr).await.map_err(|err| {
        AppError::validation(ValidationError::BindBridge {
            addr: addr.to_string(),
            source: err,
        })
    })?;
    let local_addr = listener.local_addr()?;

    info!(
        target_name = %lane.target().name,
        %local_addr,
        backend = %format!("{}:{}", lane.target().host, lane.target().backend_port),
        flush_threshold = lane.flush_threshold().get(),
        max_active = lane.pool_config().max_active,
        "Bridge listening"
    );

    let app = Router::new()
        .fallback(handle_write::<C>)
        .with_state(Arc::clone(&lane));
    let task = tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
            .await;
        if let Err(err) = served {
            error!(%local_addr, error = %err, "Bridge listener failed");
        }
    });

    Ok(BridgeServer {
        port,
        local_addr,
        task,
    })
}

async fn handle_write<C: Connector>(
    State(lane): State<Arc<BridgeLane<C>>>,
    headers: HeaderMap,
) -> StatusCode {
    let key = header_bytes(&headers, KEY_HEADER);
    let value = header_bytes(&headers, VALUE_HEADER);
    match lane.write(key, value).await {
        Ok(Submitted::Queued { .. } | Submitted::Flushed { .. }) => StatusCode::OK,
        Err(err) => {
            warn!(target_name = %lane.target().name, error = %err, "Bridge write failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn header_bytes(headers: &HeaderMap, name: &str) -> Bytes {
    headers
        .get(name)
        .map(|value| Bytes::copy_from_slice(value.as_bytes()))
        .unwrap_or_default()
}

/// Starts bridges on demand for the orchestrator and keeps them serving
/// until shutdown.
pub struct RegistryLauncher<C: Connector> {
    registry: Arc<TargetRegistry<C>>,
    bind: IpAddr,
    shutdown_tx: ShutdownSender,
    servers: Vec<BridgeServer>,
}

impl<C: Connector> RegistryLauncher<C> {
    #[must_use]
    pub const fn new(
        registry: Arc<TargetRegistry<C>>,
        bind: IpAddr,
        shutdown_tx: ShutdownSender,
    ) -> Self {
        Self {
            registry,
            bind,
            shutdown_tx,
            servers: Vec::new(),
        }
    }

    /// Hands over every bridge started so far.
    #[must_use]
    pub fn into_servers(self) -> Vec<BridgeServer> {
        self.servers
    }
}

#[async_trait]
impl<C: Connector> BridgeLauncher for RegistryLauncher<C> {
    async fn launch(&mut self, target: &Target) -> AppResult<SocketAddr> {
        let server = start_bridge(
            &self.registry,
            target.bridge_port,
            self.bind,
            self.shutdown_tx.subscribe(),
        )
        .await?;
        let local_addr = server.local_addr();
        self.servers.push(server);
        Ok(local_addr)
    }
}
