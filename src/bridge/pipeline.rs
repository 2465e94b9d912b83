use std::num::NonZeroU64;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{BackendConnection, Connector, SetCommand};
use crate::error::{ConnectionError, FlushError};

use super::pool::ConnectionPool;

/// Sequence number reported for the final drain at shutdown.
pub const DRAIN_SEQUENCE: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// Queued locally; a later request will carry it to the backend.
    Queued { request: u64 },
    /// This request hit the flush threshold and its batch was committed.
    Flushed {
        request: u64,
        sequence: u64,
        commands: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub requests: u64,
    pub flushes: u64,
    pub queued: usize,
}

#[derive(Debug, Default)]
struct PipelineState {
    queued: Vec<SetCommand>,
    requests: u64,
    flushes: u64,
}

struct Batch {
    sequence: u64,
    commands: Vec<SetCommand>,
}

/// Per-port write accumulator.
///
/// Appending, counting and the flush decision happen under one lock, so
/// exactly one request out of every `flush_threshold` takes the batch. The
/// batch itself is committed outside the lock; requests that do not trigger
/// a flush never wait on one.
pub struct PipelineManager<C: Connector> {
    pool: Arc<ConnectionPool<C>>,
    flush_threshold: NonZeroU64,
    state: Mutex<PipelineState>,
}

impl<C: Connector> PipelineManager<C> {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool<C>>, flush_threshold: NonZeroU64) -> Self {
        Self {
            pool,
            flush_threshold,
            state: Mutex::new(PipelineState::default()),
        }
    }

    #[must_use]
    pub const fn flush_threshold(&self) -> NonZeroU64 {
        self.flush_threshold
    }

    /// Queues a write and flushes when this request is a multiple of the
    /// flush threshold.
    ///
    /// # Errors
    ///
    /// Returns the flush failure when this request triggered a flush that
    /// could not be committed. The batch is dropped either way.
    pub async fn submit(&self, command: SetCommand) -> Result<Submitted, FlushError> {
        let (request, batch) = self.append(command);
        let Some(batch) = batch else {
            return Ok(Submitted::Queued { request });
        };
        let sequence = batch.sequence;
        let commands = batch.commands.len();
        self.commit(batch).await?;
        Ok(Submitted::Flushed {
            request,
            sequence,
            commands,
        })
    }

    /// Commits whatever is still queued. Used once at shutdown.
    ///
    /// # Errors
    ///
    /// Returns the flush failure when the remaining batch cannot be committed.
    pub async fn flush_pending(&self) -> Result<usize, FlushError> {
        let commands = std::mem::take(&mut self.lock_state().queued);
        let count = commands.len();
        if count == 0 {
            return Ok(0);
        }
        self.commit(Batch {
            sequence: DRAIN_SEQUENCE,
            commands,
        })
        .await?;
        Ok(count)
    }

    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        let state = self.lock_state();
        PipelineStats {
            requests: state.requests,
            flushes: state.flushes,
            queued: state.queued.len(),
        }
    }

    fn append(&self, command: SetCommand) -> (u64, Option<Batch>) {
        let mut state = self.lock_state();
        state.queued.push(command);
        state.requests = state.requests.saturating_add(1);
        let request = state.requests;
        if request % self.flush_threshold != 0 {
            return (request, None);
        }
        state.flushes = state.flushes.saturating_add(1);
        let batch = Batch {
            sequence: state.flushes,
            commands: std::mem::take(&mut state.queued),
        };
        (request, Some(batch))
    }

    async fn commit(&self, batch: Batch) -> Result<(), FlushError> {
        let Batch { sequence, commands } = batch;
        let failed = |source: ConnectionError| FlushError {
            sequence,
            commands: commands.len(),
            source,
        };
        let mut conn = self.pool.acquire().await.map_err(failed)?;
        match conn.execute(&commands).await {
            Ok(()) => {
                self.pool.release(conn);
                Ok(())
            }
            Err(err) => {
                drop(conn);
                Err(failed(err))
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
