//! Distributed index and autocompleter over independent shards.
//!
//! A [`engine::DistributedIndex`] presents N shard backends as one logical
//! index. Writes are routed by a [`crate::partition::partitioner::Partitioner`],
//! reads fan out to every shard through the worker pool and the partial
//! results are merged by descending score.

pub mod config;
pub mod engine;
pub mod merger;
pub mod metrics;
