//! Latency histogram backed by HdrHistogram.

use std::time::Duration;

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardBenchError};

/// Lowest trackable latency, in microseconds.
pub const LOWEST_MICROS: u64 = 1;

/// Highest trackable latency, in microseconds (one minute).
pub const HIGHEST_MICROS: u64 = 60_000_000;

/// Significant decimal digits kept per value.
pub const SIGNIFICANT_DIGITS: u8 = 3;

/// Latency quantiles in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyQuantiles {
    pub q0: f64,
    pub q50: f64,
    pub q95: f64,
    pub q99: f64,
    pub q999: f64,
    pub q100: f64,
}

/// Latency samples recorded in microseconds.
///
/// Values outside the trackable range are clamped into it.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    inner: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create an empty histogram.
    pub fn new() -> Result<Self> {
        let inner = Histogram::new_with_bounds(LOWEST_MICROS, HIGHEST_MICROS, SIGNIFICANT_DIGITS)
            .map_err(|e| ShardBenchError::histogram(format!("{e:?}")))?;
        Ok(Self { inner })
    }

    /// Record one latency sample.
    pub fn record(&mut self, latency: Duration) {
        let micros = latency.as_micros().clamp(LOWEST_MICROS as u128, HIGHEST_MICROS as u128);
        self.inner.saturating_record(micros as u64);
    }

    /// Number of recorded samples.
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    /// Check whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Latency at quantile `q` (0.0 to 1.0) in milliseconds; 0 when empty.
    pub fn value_at_quantile_ms(&self, q: f64) -> f64 {
        if self.inner.is_empty() {
            return 0.0;
        }
        self.inner.value_at_quantile(q) as f64 / 1000.0
    }

    /// Mean latency in milliseconds; 0 when empty.
    pub fn mean_ms(&self) -> f64 {
        if self.inner.is_empty() {
            return 0.0;
        }
        self.inner.mean() / 1000.0
    }

    /// The standard quantile set.
    pub fn quantiles(&self) -> LatencyQuantiles {
        LatencyQuantiles {
            q0: self.value_at_quantile_ms(0.0),
            q50: self.value_at_quantile_ms(0.5),
            q95: self.value_at_quantile_ms(0.95),
            q99: self.value_at_quantile_ms(0.99),
            q999: self.value_at_quantile_ms(0.999),
            q100: self.value_at_quantile_ms(1.0),
        }
    }

    /// Drop all samples.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}
