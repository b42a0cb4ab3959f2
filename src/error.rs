//! Error types for the shardbench library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`ShardBenchError`] enum. Errors raised by an individual shard are wrapped
//! in [`ShardBenchError::Shard`] so callers can tell which shard failed.
//!
//! # Examples
//!
//! ```
//! use shardbench::error::{Result, ShardBenchError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ShardBenchError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::time::Duration;

use thiserror::Error;

/// The main error type for shardbench operations.
#[derive(Error, Debug)]
pub enum ShardBenchError {
    /// I/O errors (file operations, output streams, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Index-related errors raised by a backend
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors
    #[error("Query error: {0}")]
    Query(String),

    /// Partitioning errors
    #[error("Partition error: {0}")]
    Partition(String),

    /// An error returned by one shard of a distributed index
    #[error("Shard {shard} failed: {source}")]
    Shard {
        shard: usize,
        #[source]
        source: Box<ShardBenchError>,
    },

    /// A wait exceeded its deadline
    #[error("Timeout after {elapsed:?}: {message}")]
    Timeout { message: String, elapsed: Duration },

    /// The worker pool has been shut down
    #[error("Worker pool is closed")]
    PoolClosed,

    /// A submitted work unit never delivered its result
    #[error("Task lost: {0}")]
    TaskLost(String),

    /// Benchmark-related errors
    #[error("Benchmark error: {0}")]
    BenchmarkFailed(String),

    /// Invalid argument or configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Latency histogram errors
    #[error("Histogram error: {0}")]
    Histogram(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ShardBenchError.
pub type Result<T> = std::result::Result<T, ShardBenchError>;

impl ShardBenchError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::Query(msg.into())
    }

    /// Create a new partition error.
    pub fn partition<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::Partition(msg.into())
    }

    /// Wrap an error raised by the shard at `shard`.
    pub fn shard(shard: usize, source: ShardBenchError) -> Self {
        ShardBenchError::Shard {
            shard,
            source: Box::new(source),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S, elapsed: Duration) -> Self {
        ShardBenchError::Timeout {
            message: msg.into(),
            elapsed,
        }
    }

    /// Create a new lost-task error.
    pub fn task_lost<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::TaskLost(msg.into())
    }

    /// Create a new benchmark error.
    pub fn benchmark<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::BenchmarkFailed(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new histogram error.
    pub fn histogram<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::Histogram(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ShardBenchError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Check whether this error (or the shard error it wraps) is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ShardBenchError::Timeout { .. } => true,
            ShardBenchError::Shard { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// The shard index, if this error came from a shard.
    pub fn shard_index(&self) -> Option<usize> {
        match self {
            ShardBenchError::Shard { shard, .. } => Some(*shard),
            _ => None,
        }
    }
}
