//! Partitioning strategies for routing keys to shards.

use std::fmt::Debug;

use crate::error::{Result, ShardBenchError};

/// Maps a string key to a shard index in `[0, partition_count)`.
///
/// Implementations must be pure: the same key always routes to the same
/// shard for a given partition count, so writes and later reads agree
/// without coordination. An index outside the range is reported as a
/// partition error by [`split_by_key`].
pub trait Partitioner: Send + Sync + Debug {
    /// Shard index for `key`.
    fn partition_for(&self, key: &str) -> usize;

    /// Total number of partitions.
    fn partition_count(&self) -> usize;

    /// Human-readable description of this partitioner.
    fn description(&self) -> String;

    /// Validate that the partitioner is properly configured.
    fn validate(&self) -> Result<()> {
        if self.partition_count() == 0 {
            return Err(ShardBenchError::invalid_argument(
                "Partition count cannot be zero",
            ));
        }
        Ok(())
    }
}

/// CRC32 of the key modulo the partition count.
///
/// ```
/// use shardbench::partition::partitioner::{ModuloPartitioner, Partitioner};
///
/// let partitioner = ModuloPartitioner::new(4).unwrap();
/// let shard = partitioner.partition_for("doc42");
/// assert!(shard < 4);
/// assert_eq!(shard, partitioner.partition_for("doc42"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuloPartitioner {
    partition_count: usize,
}

impl ModuloPartitioner {
    /// Create a partitioner over `partition_count` shards.
    pub fn new(partition_count: usize) -> Result<Self> {
        let partitioner = ModuloPartitioner { partition_count };
        partitioner.validate()?;
        Ok(partitioner)
    }
}

impl Partitioner for ModuloPartitioner {
    fn partition_for(&self, key: &str) -> usize {
        (crc32fast::hash(key.as_bytes()) as usize) % self.partition_count
    }

    fn partition_count(&self) -> usize {
        self.partition_count
    }

    fn description(&self) -> String {
        format!("ModuloPartitioner(crc32, partitions={})", self.partition_count)
    }
}

/// Split a batch into one sub-batch per partition, keyed by `key`.
///
/// The result always has `partition_count` entries; some may be empty.
/// Items keep their relative order inside each sub-batch.
pub fn split_by_key<T, F>(
    partitioner: &dyn Partitioner,
    items: Vec<T>,
    key: F,
) -> Result<Vec<Vec<T>>>
where
    F: Fn(&T) -> &str,
{
    let mut batches: Vec<Vec<T>> = (0..partitioner.partition_count())
        .map(|_| Vec::new())
        .collect();

    for item in items {
        let routed = key(&item);
        let shard = partitioner.partition_for(routed);
        let Some(batch) = batches.get_mut(shard) else {
            return Err(ShardBenchError::partition(format!(
                "{} routed '{routed}' to shard {shard} of {}",
                partitioner.description(),
                partitioner.partition_count()
            )));
        };
        batch.push(item);
    }

    Ok(batches)
}
