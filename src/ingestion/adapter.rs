use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

use crate::engine::{EnrichError, EnrichmentPipeline};
use crate::metrics::{LatencyStats, LatencyTracker, MetricType};
use crate::websocket::{Broadcaster, PublishReport};

/// What the queue client should do with the message just handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Enriched and published
    Ack,
    /// Undecodable or invalid; never broadcast
    Reject,
}

/// Statistics for the ingestion path
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IngestionStats {
    pub messages_received: u64,
    pub ticks_processed: u64,
    pub rejected_decode: u64,
    pub rejected_invalid: u64,
}

#[derive(Default)]
struct IngestionCounters {
    messages_received: AtomicU64,
    ticks_processed: AtomicU64,
    rejected_decode: AtomicU64,
    rejected_invalid: AtomicU64,
}

/// Boundary between the queue client and the enrichment core
///
/// Handles one message at a time: enrich, publish, then tell the caller to
/// acknowledge. Enrichment failures are logged and turned into
/// `Disposition::Reject`; they never escape as errors.
pub struct IngestionAdapter {
    pipeline: EnrichmentPipeline,
    broadcaster: Broadcaster,
    counters: IngestionCounters,
    latency: Mutex<LatencyTracker>,
}

impl IngestionAdapter {
    pub fn new(pipeline: EnrichmentPipeline, broadcaster: Broadcaster) -> Self {
        Self {
            pipeline,
            broadcaster,
            counters: IngestionCounters::default(),
            latency: Mutex::new(LatencyTracker::new()),
        }
    }

    pub fn pipeline(&self) -> &EnrichmentPipeline {
        &self.pipeline
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Process one message body from the queue
    pub async fn handle(&self, payload: &[u8]) -> Disposition {
        match self.ingest(payload).await {
            Ok(_) => Disposition::Ack,
            Err(_) => Disposition::Reject,
        }
    }

    /// Like [`handle`](Self::handle) but exposes the enrichment error or the
    /// publish report
    pub async fn ingest(&self, payload: &[u8]) -> Result<PublishReport, EnrichError> {
        self.counters.messages_received.fetch_add(1, Ordering::Relaxed);

        let started = Instant::now();
        let record = match self.pipeline.process(payload) {
            Ok(record) => record,
            Err(e) => {
                let counter = if e.is_decode_error() {
                    &self.counters.rejected_decode
                } else {
                    &self.counters.rejected_invalid
                };
                counter.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    kind = e.kind(),
                    payload = %String::from_utf8_lossy(truncate(payload)),
                    "⚠️  Rejecting message: {}",
                    e
                );
                return Err(e);
            }
        };
        self.latency.lock().record(MetricType::Enrich, started);

        tracing::debug!(
            symbol = %record.symbol,
            price = record.price,
            sma_fast = ?record.sma_fast,
            sma_slow = ?record.sma_slow,
            "Processed tick"
        );

        let started = Instant::now();
        let report = self.broadcaster.publish(&record).await;
        self.latency.lock().record(MetricType::Publish, started);

        self.counters.ticks_processed.fetch_add(1, Ordering::Relaxed);
        Ok(report)
    }

    pub fn stats(&self) -> IngestionStats {
        IngestionStats {
            messages_received: self.counters.messages_received.load(Ordering::Relaxed),
            ticks_processed: self.counters.ticks_processed.load(Ordering::Relaxed),
            rejected_decode: self.counters.rejected_decode.load(Ordering::Relaxed),
            rejected_invalid: self.counters.rejected_invalid.load(Ordering::Relaxed),
        }
    }

    pub fn latency_stats(&self) -> Vec<LatencyStats> {
        self.latency.lock().all_stats()
    }
}

/// Shared handle used by the queue consumer and the HTTP API
pub type SharedIngestionAdapter = Arc<IngestionAdapter>;

fn truncate(payload: &[u8]) -> &[u8] {
    const MAX_LOGGED: usize = 256;
    &payload[..payload.len().min(MAX_LOGGED)]
}
