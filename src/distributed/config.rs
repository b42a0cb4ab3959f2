//! Configuration for distributed indices.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardBenchError};

/// Pool workers started per partition when not set explicitly.
pub const WORKERS_PER_PARTITION: usize = 50;

/// Configuration for a distributed index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributedIndexConfig {
    /// Number of shards.
    pub partitions: usize,

    /// Worker pool size. If None, `partitions * 50`.
    pub pool_workers: Option<usize>,

    /// How long a read waits for shard responses. If None, wait indefinitely.
    pub shard_timeout: Option<Duration>,

    /// Whether to collect read metrics.
    pub enable_metrics: bool,
}

impl Default for DistributedIndexConfig {
    fn default() -> Self {
        Self {
            partitions: 4,
            pool_workers: None,
            shard_timeout: Some(Duration::from_secs(5)),
            enable_metrics: true,
        }
    }
}

impl DistributedIndexConfig {
    /// Create a config for `partitions` shards with default settings.
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions,
            ..Default::default()
        }
    }

    /// Set the number of shards.
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    /// Set the worker pool size.
    pub fn with_pool_workers(mut self, workers: usize) -> Self {
        self.pool_workers = Some(workers);
        self
    }

    /// Set the shard read timeout.
    pub fn with_shard_timeout(mut self, timeout: Duration) -> Self {
        self.shard_timeout = Some(timeout);
        self
    }

    /// Wait for shard reads without a deadline.
    pub fn without_shard_timeout(mut self) -> Self {
        self.shard_timeout = None;
        self
    }

    /// Enable or disable metrics.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// Effective worker pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_workers
            .unwrap_or(self.partitions * WORKERS_PER_PARTITION)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.partitions == 0 {
            return Err(ShardBenchError::invalid_config(
                "partitions must be greater than zero",
            ));
        }
        if self.pool_size() == 0 {
            return Err(ShardBenchError::invalid_config(
                "pool_workers must be greater than zero",
            ));
        }
        if self.shard_timeout == Some(Duration::ZERO) {
            return Err(ShardBenchError::invalid_config(
                "shard_timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}
