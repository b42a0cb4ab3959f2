//! Configuration for benchmark runs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardBenchError};

/// What a worker does when the operation returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop every worker and fail the run.
    #[default]
    Abort,

    /// Count the failure and keep going.
    Count,
}

/// Configuration for a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Number of concurrent workers.
    pub concurrency: usize,

    /// Wall-clock length of the run.
    pub duration: Duration,

    /// Progress report period. Zero disables the reporter.
    pub reporting_period: Duration,

    /// Name of the engine under test.
    pub engine: String,

    /// Title of this benchmark.
    pub title: String,

    /// Free-form metadata stored with the result.
    pub metadata: String,

    /// Request limit recorded with the result.
    pub limit: u64,

    /// Rate limit recorded with the result. Zero means unlimited.
    pub max_rps: i64,

    /// Engine-specific settings recorded with the result.
    pub db_specific_configs: BTreeMap<String, serde_json::Value>,

    /// Handling of failing operations.
    pub error_policy: ErrorPolicy,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            duration: Duration::from_secs(60),
            reporting_period: Duration::from_secs(1),
            engine: "memory".to_string(),
            title: "benchmark".to_string(),
            metadata: String::new(),
            limit: 0,
            max_rps: 0,
            db_specific_configs: BTreeMap::new(),
            error_policy: ErrorPolicy::Abort,
        }
    }
}

impl BenchmarkConfig {
    /// Create a config with the given concurrency and duration.
    pub fn new(concurrency: usize, duration: Duration) -> Self {
        Self {
            concurrency,
            duration,
            ..Default::default()
        }
    }

    /// Set the reporting period.
    pub fn with_reporting_period(mut self, period: Duration) -> Self {
        self.reporting_period = period;
        self
    }

    /// Disable the progress reporter.
    pub fn without_reporting(mut self) -> Self {
        self.reporting_period = Duration::ZERO;
        self
    }

    /// Set the engine name and benchmark title.
    pub fn with_names<E: Into<String>, T: Into<String>>(mut self, engine: E, title: T) -> Self {
        self.engine = engine.into();
        self.title = title.into();
        self
    }

    /// Set the metadata string.
    pub fn with_metadata<S: Into<String>>(mut self, metadata: S) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Record an engine-specific setting.
    pub fn with_db_config<K: Into<String>, V: Into<serde_json::Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.db_specific_configs.insert(key.into(), value.into());
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ShardBenchError::invalid_config(
                "concurrency must be greater than zero",
            ));
        }
        if self.duration.is_zero() {
            return Err(ShardBenchError::invalid_config(
                "duration must be greater than zero",
            ));
        }
        Ok(())
    }
}
