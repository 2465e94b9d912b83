use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid backend address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: redis::RedisError,
    },
    #[error("Failed to dial backend {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: redis::RedisError,
    },
    #[error("Dialing backend {addr} timed out after {timeout:?}.")]
    DialTimeout { addr: String, timeout: Duration },
    #[error("Connection pool exhausted ({max_active} active) after waiting {waited:?}.")]
    PoolExhausted { max_active: usize, waited: Duration },
    #[error("Connection pool is closed.")]
    PoolClosed,
    #[error("Backend command failed: {source}")]
    Command {
        #[source]
        source: redis::RedisError,
    },
    #[error("Health probe failed: {source}")]
    Probe {
        #[source]
        source: redis::RedisError,
    },
}

#[derive(Debug, Error)]
#[error("Batch #{sequence} ({commands} commands) failed: {source}")]
pub struct FlushError {
    pub sequence: u64,
    pub commands: usize,
    #[source]
    pub source: ConnectionError,
}
