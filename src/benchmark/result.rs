//! Benchmark result records and their JSON and CSV outputs.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::benchmark::histogram::LatencyQuantiles;
use crate::error::Result;

/// Version of the JSON result layout.
pub const RESULT_FORMAT_VERSION: &str = "0.1";

/// Output path meaning standard output.
pub const STDOUT_PATH: &str = "-";

/// Operation totals of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Successful operations.
    pub total_ops: u64,

    /// Failed operations (only under the count policy).
    pub failed_ops: u64,

    /// Failed share of all attempted operations.
    pub failure_rate: f64,

    /// Mean latency of successful operations, in milliseconds.
    pub avg_latency_ms: f64,
}

/// Whole-run throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRates {
    /// Successful operations per second.
    pub overall_ops_rate: f64,
}

/// Whole-run latency quantiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallQuantiles {
    pub all_commands: LatencyQuantiles,
}

/// One reporter sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataPoint {
    /// Unix time in milliseconds.
    pub timestamp: i64,

    /// Named values sampled at this time.
    pub multi_values: BTreeMap<String, f64>,
}

impl DataPoint {
    /// Create an empty data point.
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            multi_values: BTreeMap::new(),
        }
    }

    /// Add a named value.
    pub fn with_value<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.multi_values.insert(name.into(), value);
        self
    }
}

/// Final record of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BenchmarkResult {
    pub metadata: String,
    pub result_format_version: String,
    pub limit: u64,
    pub workers: u32,
    pub max_rps: i64,
    #[serde(rename = "DBSpecificConfigs")]
    pub db_specific_configs: BTreeMap<String, serde_json::Value>,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_millis: i64,
    pub totals: Totals,
    pub overall_rates: OverallRates,
    pub overall_quantiles: OverallQuantiles,
    pub time_series: BTreeMap<String, Vec<DataPoint>>,
}

impl BenchmarkResult {
    /// Successful operations per second.
    pub fn throughput(&self) -> f64 {
        self.overall_rates.overall_ops_rate
    }

    /// Mean latency in milliseconds.
    pub fn avg_latency_ms(&self) -> f64 {
        self.totals.avg_latency_ms
    }

    /// Failed share of all attempted operations.
    pub fn failure_rate(&self) -> f64 {
        self.totals.failure_rate
    }

    /// Pretty JSON of this result.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON result to `path`, or to stdout for `-`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str() == STDOUT_PATH {
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, self)?;
            writeln!(out)?;
        } else {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(file, self)?;
        }
        Ok(())
    }

    /// Read a JSON result back.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// The single CSV line streamed per run.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub engine: String,
    pub title: String,
    pub concurrency: u32,
    pub throughput: f64,
    pub avg_latency_ms: f64,
}

impl CsvRow {
    /// Build the row for `result`.
    pub fn from_result(engine: &str, title: &str, result: &BenchmarkResult) -> Self {
        Self {
            engine: engine.to_string(),
            title: title.to_string(),
            concurrency: result.workers,
            throughput: result.throughput(),
            avg_latency_ms: result.avg_latency_ms(),
        }
    }

    /// Field values with two-decimal rates.
    pub fn to_record(&self) -> [String; 5] {
        [
            self.engine.clone(),
            self.title.clone(),
            self.concurrency.to_string(),
            format!("{:.02}", self.throughput),
            format!("{:.02}", self.avg_latency_ms),
        ]
    }

    /// Write the row to any writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.to_record())?;
        csv.flush()?;
        Ok(())
    }

    /// Append the row to `path`, or write it to stdout for `-`.
    pub fn append_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str() == STDOUT_PATH {
            self.write_to(io::stdout().lock())
        } else {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            self.write_to(file)
        }
    }
}
