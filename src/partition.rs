//! Key to shard routing.

pub mod partitioner;
