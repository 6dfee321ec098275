//! Per-chunk write latency, backed by an HDR histogram.

use crate::result::LatencySummary;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Records how long each write call took, in microseconds.
pub struct LatencyHistogram {
    inner: Histogram<u64>,
}

impl LatencyHistogram {
    /// Auto-resizing histogram with three significant figures.
    pub fn new() -> Result<Self, hdrhistogram::CreationError> {
        Ok(Self {
            inner: Histogram::new(3)?,
        })
    }

    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.inner.saturating_record(micros);
    }

    pub fn summary(&self) -> Option<LatencySummary> {
        if self.inner.is_empty() {
            return None;
        }
        Some(LatencySummary {
            samples: self.inner.len(),
            p50_us: self.inner.value_at_quantile(0.5),
            p99_us: self.inner.value_at_quantile(0.99),
            max_us: self.inner.max(),
        })
    }
}
