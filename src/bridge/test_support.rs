use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::backend::{BackendConnection, Connector, SetCommand};
use crate::error::ConnectionError;

fn injected(reason: &'static str) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::IoError, reason))
}

#[derive(Default)]
struct FakeState {
    dials: AtomicU64,
    pings: AtomicU64,
    fail_dial: AtomicBool,
    fail_ping: AtomicBool,
    fail_execute: AtomicBool,
    batches: Mutex<Vec<Vec<SetCommand>>>,
}

/// In-memory backend that records every committed batch.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub(crate) fn connector(&self) -> FakeConnector {
        FakeConnector {
            backend: self.clone(),
        }
    }

    pub(crate) fn fail_dial(&self, fail: bool) {
        self.state.fail_dial.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_ping(&self, fail: bool) {
        self.state.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_execute(&self, fail: bool) {
        self.state.fail_execute.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn dials(&self) -> u64 {
        self.state.dials.load(Ordering::SeqCst)
    }

    pub(crate) fn pings(&self) -> u64 {
        self.state.pings.load(Ordering::SeqCst)
    }

    pub(crate) fn batches(&self) -> Vec<Vec<SetCommand>> {
        self.state
            .batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }
}

pub(crate) struct FakeConnector {
    backend: FakeBackend,
}

#[async_trait]
impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> Result<Self::Connection, ConnectionError> {
        self.backend.state.dials.fetch_add(1, Ordering::SeqCst);
        if self.backend.state.fail_dial.load(Ordering::SeqCst) {
            return Err(ConnectionError::Dial {
                addr: self.describe(),
                source: injected("connection refused"),
            });
        }
        Ok(FakeConnection {
            backend: self.backend.clone(),
        })
    }

    fn describe(&self) -> String {
        "fake:0".to_owned()
    }
}

pub(crate) struct FakeConnection {
    backend: FakeBackend,
}

#[async_trait]
impl BackendConnection for FakeConnection {
    async fn ping(&mut self) -> Result<(), ConnectionError> {
        self.backend.state.pings.fetch_add(1, Ordering::SeqCst);
        if self.backend.state.fail_ping.load(Ordering::SeqCst) {
            return Err(ConnectionError::Probe {
                source: injected("broken pipe"),
            });
        }
        Ok(())
    }

    async fn execute(&mut self, batch: &[SetCommand]) -> Result<(), ConnectionError> {
        tokio::task::yield_now().await;
        if self.backend.state.fail_execute.load(Ordering::SeqCst) {
            return Err(ConnectionError::Command {
                source: injected("write failed"),
            });
        }
        self.backend
            .state
            .batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.to_vec());
        Ok(())
    }
}
