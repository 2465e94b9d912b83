use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use super::{BackendConnection, Connector, SetCommand};
use crate::error::ConnectionError;

#[derive(Debug, Clone)]
pub struct RedisConnector {
    client: redis::Client,
    addr: String,
    dial_timeout: Duration,
}

impl RedisConnector {
    /// Builds a connector for `host:port`. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot form a valid redis URL.
    pub fn new(host: &str, port: u16, dial_timeout: Duration) -> Result<Self, ConnectionError> {
        let addr = format!("{}:{}", host, port);
        let client = redis::Client::open(format!("redis://{}/", addr)).map_err(|err| {
            ConnectionError::InvalidAddress {
                addr: addr.clone(),
                source: err,
            }
        })?;
        Ok(Self {
            client,
            addr,
            dial_timeout,
        })
    }
}

#[async_trait]
impl Connector for RedisConnector {
    type Connection = RedisConnection;

    async fn connect(&self) -> Result<Self::Connection, ConnectionError> {
        let dial = self.client.get_multiplexed_async_connection();
        let inner = tokio::time::timeout(self.dial_timeout, dial)
            .await
            .map_err(|_elapsed| ConnectionError::DialTimeout {
                addr: self.addr.clone(),
                timeout: self.dial_timeout,
            })?
            .map_err(|err| ConnectionError::Dial {
                addr: self.addr.clone(),
                source: err,
            })?;
        Ok(RedisConnection { inner })
    }

    fn describe(&self) -> String {
        self.addr.clone()
    }
}

pub struct RedisConnection {
    inner: MultiplexedConnection,
}

#[async_trait]
impl BackendConnection for RedisConnection {
    async fn ping(&mut self) -> Result<(), ConnectionError> {
        let reply: redis::RedisResult<String> =
            redis::cmd("PING").query_async(&mut self.inner).await;
        reply
            .map(drop)
            .map_err(|err| ConnectionError::Probe { source: err })
    }

    async fn execute(&mut self, batch: &[SetCommand]) -> Result<(), ConnectionError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for command in batch {
            pipe.cmd("SET")
                .arg(command.key.as_ref())
                .arg(command.value.as_ref())
                .ignore();
        }
        let reply: redis::RedisResult<()> = pipe.query_async(&mut self.inner).await;
        reply.map_err(|err| ConnectionError::Command { source: err })
    }
}
