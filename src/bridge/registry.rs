use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::backend::{Connector, SetCommand};
use crate::bench::Target;
use crate::error::{AppResult, ConnectionError, FlushError, ValidationError};

use super::BridgeSettings;
use super::pipeline::{PipelineManager, PipelineStats, Submitted};
use super::pool::{ConnectionPool, PoolConfig, PoolStats};

/// Everything one bridge port writes through: the target it fronts, its
/// connection pool and its pipeline state.
pub struct BridgeLane<C: Connector> {
    target: Target,
    pool: Arc<ConnectionPool<C>>,
    pipeline: PipelineManager<C>,
}

impl<C: Connector> BridgeLane<C> {
    #[must_use]
    pub fn new(target: Target, connector: C, settings: &BridgeSettings) -> Self {
        let pool = Arc::new(ConnectionPool::new(connector, settings.pool));
        let pipeline = PipelineManager::new(Arc::clone(&pool), settings.flush_threshold);
        Self {
            target,
            pool,
            pipeline,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Issues one `SET key value` through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the flush failure when this write triggered a failing flush.
    pub async fn write(&self, key: Bytes, value: Bytes) -> Result<Submitted, FlushError> {
        self.pipeline.submit(SetCommand::new(key, value)).await
    }

    /// Requests per flush on this lane.
    #[must_use]
    pub fn flush_threshold(&self) -> NonZeroU64 {
        self.pipeline.flush_threshold()
    }

    #[must_use]
    pub fn pool_config(&self) -> &PoolConfig {
        self.pool.config()
    }

    #[must_use]
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    async fn shutdown(&self) {
        match self.pipeline.flush_pending().await {
            Ok(0) => {}
            Ok(count) => info!(
                target_name = %self.target.name,
                commands = count,
                "Flushed pending writes before shutdown"
            ),
            Err(err) => warn!(
                target_name = %self.target.name,
                error = %err,
                "Failed to flush pending writes before shutdown"
            ),
        }
        self.pool.close();
        let pipeline = self.pipeline_stats();
        let pool = self.pool_stats();
        debug!(
            target_name = %self.target.name,
            requests = pipeline.requests,
            flushes = pipeline.flushes,
            dials = pool.dials,
            probes = pool.probes,
            discarded = pool.discarded,
            "Bridge lane closed"
        );
    }
}

/// Port-to-lane lookup table, built once before any bridge accepts.
pub struct TargetRegistry<C: Connector> {
    lanes: BTreeMap<u16, Arc<BridgeLane<C>>>,
}

impl<C: Connector> TargetRegistry<C> {
    /// Builds one lane per target, keyed by the target's bridge port.
    ///
    /// # Errors
    ///
    /// Returns an error when two targets share a bridge port or a connector
    /// cannot be built for a target.
    pub fn build<F>(targets: &[Target], settings: &BridgeSettings, mut connector_for: F) -> AppResult<Self>
    where
        F: FnMut(&Target) -> Result<C, ConnectionError>,
    {
        let mut lanes = BTreeMap::new();
        for target in targets {
            let connector = connector_for(target)?;
            match lanes.entry(target.bridge_port) {
                Entry::Occupied(_) => {
                    return Err(ValidationError::DuplicateBridgePort {
                        port: target.bridge_port,
                    }
                    .into());
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(BridgeLane::new(target.clone(), connector, settings)));
                }
            }
        }
        Ok(Self { lanes })
    }

    #[must_use]
    pub fn lane(&self, port: u16) -> Option<Arc<BridgeLane<C>>> {
        self.lanes.get(&port).cloned()
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.lanes.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Flushes leftover writes once and closes every pool.
    pub async fn shutdown(&self) {
        for lane in self.lanes.values() {
            lane.shutdown().await;
        }
    }
}
