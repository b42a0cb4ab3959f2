//! # shardbench
//!
//! Sharded fan-out/merge search aggregation and a concurrent load benchmark
//! harness for search backends.
//!
//! ## Features
//!
//! - Backend-neutral `Index` and `Autocompleter` capability traits
//! - Stable CRC32 partitioning of documents and suggestion terms
//! - A bounded worker pool with task groups and deadlines
//! - A distributed index that fans reads out to every shard and merges the answers
//! - A load harness with HdrHistogram latency quantiles, progress reporting,
//!   JSON results and CSV summaries
//!
//! ## Example
//!
//! ```
//! use shardbench::distributed::config::DistributedIndexConfig;
//! use shardbench::distributed::engine::DistributedIndex;
//! use shardbench::document::document::Document;
//! use shardbench::index::index::Index;
//! use shardbench::index::metadata::Metadata;
//! use shardbench::index::options::IndexingOptions;
//! use shardbench::query::query::Query;
//!
//! let config = DistributedIndexConfig::new(2);
//! let index = DistributedIndex::in_memory("idx", Metadata::wikipedia(), config).unwrap();
//! index.create().unwrap();
//! index
//!     .index(
//!         vec![Document::new("doc1", 1.0).set("title", "hello world")],
//!         &IndexingOptions::default(),
//!     )
//!     .unwrap();
//!
//! let results = index.search(&Query::new("hello")).unwrap();
//! assert_eq!(results.total, 1);
//! ```

pub mod benchmark;
pub mod cli;
pub mod distributed;
pub mod document;
pub mod error;
pub mod index;
pub mod partition;
pub mod pool;
pub mod query;
pub mod synth;
pub mod util;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
