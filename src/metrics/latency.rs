use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

/// Latency tracker for the ingestion path using HDR Histograms
///
/// `enrich` covers decode + validation + window update; `publish` covers
/// serialization and fan-out to every subscriber of one record.
pub struct LatencyTracker {
    enrich_ns: Histogram<u64>,
    publish_ns: Histogram<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Enrich,
    Publish,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self {
            enrich_ns: new_histogram(),
            publish_ns: new_histogram(),
        }
    }

    /// Record the time elapsed since `start`
    #[inline]
    pub fn record(&mut self, metric: MetricType, start: Instant) {
        let nanos = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        self.histogram_mut(metric).saturating_record(nanos.max(1));
    }

    pub fn stats(&self, metric: MetricType) -> LatencyStats {
        let histogram = match metric {
            MetricType::Enrich => &self.enrich_ns,
            MetricType::Publish => &self.publish_ns,
        };
        let name = match metric {
            MetricType::Enrich => "enrich",
            MetricType::Publish => "publish",
        };

        LatencyStats {
            metric_name: name.to_string(),
            p50_ns: histogram.value_at_percentile(50.0),
            p95_ns: histogram.value_at_percentile(95.0),
            p99_ns: histogram.value_at_percentile(99.0),
            max_ns: histogram.max(),
            mean_ns: histogram.mean(),
            sample_count: histogram.len(),
        }
    }

    pub fn all_stats(&self) -> Vec<LatencyStats> {
        vec![self.stats(MetricType::Enrich), self.stats(MetricType::Publish)]
    }

    pub fn reset(&mut self) {
        self.enrich_ns.clear();
        self.publish_ns.clear();
    }

    fn histogram_mut(&mut self, metric: MetricType) -> &mut Histogram<u64> {
        match metric {
            MetricType::Enrich => &mut self.enrich_ns,
            MetricType::Publish => &mut self.publish_ns,
        }
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

// 1ns to 60 seconds, 3 significant figures
fn new_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(1, 60_000_000_000, 3).expect("constant histogram bounds are valid")
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LatencyStats {
    pub metric_name: String,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
    pub sample_count: u64,
}

impl LatencyStats {
    /// Convert nanoseconds to microseconds for display
    pub fn p99_us(&self) -> f64 {
        self.p99_ns as f64 / 1000.0
    }
}
