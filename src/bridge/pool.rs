use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::time::Instant;
use tracing::debug;

use crate::backend::{BackendConnection, Connector};
use crate::error::ConnectionError;

/// Idle connections older than this are probed before reuse.
pub const DEFAULT_HEALTH_CHECK_AFTER: Duration = Duration::from_secs(60);
/// Idle connections older than this are dropped without probing.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(240);
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_active: usize,
    pub max_idle: usize,
    /// `None` keeps idle connections forever.
    pub idle_timeout: Option<Duration>,
    pub health_check_after: Duration,
    /// `None` fails fast when every connection is checked out.
    pub acquire_timeout: Option<Duration>,
    pub dial_timeout: Duration,
}

impl PoolConfig {
    /// Pool with as many idle slots as active ones.
    #[must_use]
    pub const fn with_connections(connections: usize) -> Self {
        Self {
            max_active: connections,
            max_idle: connections,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            health_check_after: DEFAULT_HEALTH_CHECK_AFTER,
            acquire_timeout: Some(DEFAULT_ACQUIRE_TIMEOUT),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub idle: usize,
    pub dials: u64,
    pub probes: u64,
    pub discarded: u64,
}

struct IdleConnection<T> {
    conn: T,
    since: Instant,
}

/// A checked-out connection. Hand it back with [`ConnectionPool::release`];
/// dropping it instead discards the connection and frees its slot.
pub struct PooledConnection<T> {
    conn: T,
    permit: OwnedSemaphorePermit,
}

impl<T> Deref for PooledConnection<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<T> DerefMut for PooledConnection<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

#[derive(Default)]
struct PoolCounters {
    dials: AtomicU64,
    probes: AtomicU64,
    discarded: AtomicU64,
}

pub struct ConnectionPool<C: Connector> {
    connector: C,
    config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<IdleConnection<C::Connection>>>,
    closed: AtomicBool,
    counters: PoolCounters,
}

impl<C: Connector> ConnectionPool<C> {
    #[must_use]
    pub fn new(connector: C, config: PoolConfig) -> Self {
        Self {
            connector,
            permits: Arc::new(Semaphore::new(config.max_active)),
            idle: Mutex::new(VecDeque::with_capacity(config.max_idle)),
            config,
            closed: AtomicBool::new(false),
            counters: PoolCounters::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Checks out a connection, reusing the freshest idle one when possible.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool is closed, exhausted past the acquire
    /// timeout, or a replacement connection cannot be dialed.
    pub async fn acquire(&self) -> Result<PooledConnection<C::Connection>, ConnectionError> {
        let permit = self.acquire_permit().await?;

        while let Some(idle) = self.pop_idle() {
            let idle_for = idle.since.elapsed();
            if self
                .config
                .idle_timeout
                .is_some_and(|timeout| idle_for >= timeout)
            {
                self.discard("idle timeout");
                continue;
            }
            let mut conn = idle.conn;
            if idle_for < self.config.health_check_after {
                return Ok(PooledConnection { conn, permit });
            }
            self.counters.probes.fetch_add(1, Ordering::Relaxed);
            match conn.ping().await {
                Ok(()) => return Ok(PooledConnection { conn, permit }),
                Err(err) => {
                    debug!(
                        backend = %self.connector.describe(),
                        error = %err,
                        "Stale connection failed health probe"
                    );
                    self.discard("failed probe");
                }
            }
        }

        self.counters.dials.fetch_add(1, Ordering::Relaxed);
        let conn = self.connector.connect().await?;
        Ok(PooledConnection { conn, permit })
    }

    /// Returns a healthy connection to the idle set.
    pub fn release(&self, pooled: PooledConnection<C::Connection>) {
        let PooledConnection { conn, permit } = pooled;
        if self.closed.load(Ordering::Acquire) {
            drop(conn);
            drop(permit);
            return;
        }
        let overflow = {
            let mut idle = self.lock_idle();
            if idle.len() < self.config.max_idle {
                idle.push_back(IdleConnection {
                    conn,
                    since: Instant::now(),
                });
                None
            } else {
                Some(conn)
            }
        };
        if let Some(conn) = overflow {
            drop(conn);
            self.discard("idle set full");
        }
        drop(permit);
    }

    /// Drains and closes every idle connection; later acquisitions fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.permits.close();
        let drained: Vec<_> = self.lock_idle().drain(..).collect();
        debug!(
            backend = %self.connector.describe(),
            closed = drained.len(),
            "Connection pool closed"
        );
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self
                .config
                .max_active
                .saturating_sub(self.permits.available_permits()),
            idle: self.lock_idle().len(),
            dials: self.counters.dials.load(Ordering::Relaxed),
            probes: self.counters.probes.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, ConnectionError> {
        let max_active = self.config.max_active;
        match self.config.acquire_timeout {
            None => self
                .permits
                .clone()
                .try_acquire_owned()
                .map_err(|err| match err {
                    TryAcquireError::Closed => ConnectionError::PoolClosed,
                    TryAcquireError::NoPermits => ConnectionError::PoolExhausted {
                        max_active,
                        waited: Duration::ZERO,
                    },
                }),
            Some(wait) => {
                match tokio::time::timeout(wait, self.permits.clone().acquire_owned()).await {
                    Ok(Ok(permit)) => Ok(permit),
                    Ok(Err(_closed)) => Err(ConnectionError::PoolClosed),
                    Err(_elapsed) => Err(ConnectionError::PoolExhausted {
                        max_active,
                        waited: wait,
                    }),
                }
            }
        }
    }

    fn pop_idle(&self) -> Option<IdleConnection<C::Connection>> {
        self.lock_idle().pop_back()
    }

    fn discard(&self, reason: &'static str) {
        self.counters.discarded.fetch_add(1, Ordering::Relaxed);
        debug!(backend = %self.connector.describe(), reason, "Discarded backend connection");
    }

    fn lock_idle(&self) -> MutexGuard<'_, VecDeque<IdleConnection<C::Connection>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
