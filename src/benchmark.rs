//! Concurrent load generation and latency measurement.
//!
//! A [`harness::Benchmark`] runs a single-operation closure on a fixed number
//! of workers for a fixed wall-clock duration. Every successful call is
//! counted and its latency recorded into a shared
//! [`histogram::LatencyHistogram`]; a reporter thread prints progress while
//! the run is in flight. The outcome is a [`result::BenchmarkResult`] that
//! can be persisted as JSON or streamed as one CSV row.

pub mod config;
pub mod harness;
pub mod histogram;
pub mod reporter;
pub mod result;
pub mod workload;
