//! Backend connection abstraction used by the bridge.
//!
//! The bridge only ever issues single-key writes, so the surface is small:
//! dial a connection, probe it, and execute a batch of `SET` commands in one
//! round trip.
mod redis_client;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ConnectionError;

pub use redis_client::{RedisConnection, RedisConnector};

/// A single-key write queued by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCommand {
    pub key: Bytes,
    pub value: Bytes,
}

impl SetCommand {
    #[must_use]
    pub const fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

#[async_trait]
pub trait BackendConnection: Send + 'static {
    /// Lightweight liveness check issued before reusing a stale idle connection.
    async fn ping(&mut self) -> Result<(), ConnectionError>;

    /// Sends every command and waits for all acknowledgements.
    async fn execute(&mut self, batch: &[SetCommand]) -> Result<(), ConnectionError>;
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: BackendConnection;

    async fn connect(&self) -> Result<Self::Connection, ConnectionError>;

    /// Address used in logs.
    fn describe(&self) -> String;
}
