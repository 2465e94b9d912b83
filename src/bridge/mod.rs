//! HTTP bridge in front of a key-value backend.
//!
//! Each benchmark target gets its own listening port. Requests on that port
//! carry `key`/`value` headers and are turned into pipelined `SET` commands
//! against the target's backend through a bounded connection pool.
mod pipeline;
mod pool;
mod registry;
mod server;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

use std::net::IpAddr;
use std::num::NonZeroU64;

pub use pipeline::{DRAIN_SEQUENCE, PipelineManager, PipelineStats, Submitted};
pub use pool::{
    ConnectionPool, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_DIAL_TIMEOUT, DEFAULT_HEALTH_CHECK_AFTER,
    DEFAULT_IDLE_TIMEOUT, PoolConfig, PoolStats, PooledConnection,
};
pub use registry::{BridgeLane, TargetRegistry};
pub use server::{BridgeServer, KEY_HEADER, RegistryLauncher, VALUE_HEADER, start_bridge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    pub bind: IpAddr,
    pub base_port: u16,
    /// Requests per port between flushes (the "pipelined" depth).
    pub flush_threshold: NonZeroU64,
    pub pool: PoolConfig,
}
