use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use super::registry::{Frame, SubscriberId, SubscriberRegistry, SubscriberSendError};
use crate::models::EnrichedRecord;

/// Outcome of one publish call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishReport {
    /// Subscribers in the snapshot the publish was sent to
    pub recipients: usize,
    /// Frames accepted by a subscriber buffer
    pub delivered: usize,
    /// Subscribers that failed and were deregistered
    pub failed: Vec<(SubscriberId, SubscriberSendError)>,
}

/// Lifetime broadcast counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BroadcastStats {
    pub records_published: u64,
    pub frames_delivered: u64,
    pub failed_sends: u64,
    pub subscribers: usize,
}

#[derive(Default)]
struct BroadcastCounters {
    records_published: AtomicU64,
    frames_delivered: AtomicU64,
    failed_sends: AtomicU64,
}

/// Fans one enriched record out to every registered subscriber
///
/// Each record is serialized once; the same frame is handed to every sink
/// concurrently, each send bounded by `send_timeout`. A failing sink is
/// logged and deregistered without affecting the others, and nothing is
/// ever returned to the caller as an error.
#[derive(Clone)]
pub struct Broadcaster {
    registry: SubscriberRegistry,
    send_timeout: Duration,
    counters: Arc<BroadcastCounters>,
}

impl Broadcaster {
    pub fn new(registry: SubscriberRegistry, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
            counters: Arc::new(BroadcastCounters::default()),
        }
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Serialize `record` and deliver it to the current subscribers
    pub async fn publish(&self, record: &EnrichedRecord) -> PublishReport {
        match record.to_json() {
            Ok(json) => self.publish_frame(Frame::from(json)).await,
            Err(e) => {
                tracing::error!(symbol = %record.symbol, "Failed to serialize record: {}", e);
                PublishReport::default()
            }
        }
    }

    /// Deliver an already serialized frame to the current subscribers
    pub async fn publish_frame(&self, frame: Frame) -> PublishReport {
        let subscribers = self.registry.snapshot();
        let recipients = subscribers.len();

        let sends = subscribers.iter().map(|subscriber| {
            let frame = Frame::clone(&frame);
            async move {
                let result = subscriber.send(frame, self.send_timeout).await;
                (subscriber.id(), result)
            }
        });
        let results = join_all(sends).await;

        let mut report = PublishReport {
            recipients,
            ..Default::default()
        };

        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(subscriber = %id, "⚠️  Dropping subscriber after failed send: {}", e);
                    self.registry.remove(&id);
                    report.failed.push((id, e));
                }
            }
        }

        self.counters.records_published.fetch_add(1, Ordering::Relaxed);
        self.counters
            .frames_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.counters
            .failed_sends
            .fetch_add(report.failed.len() as u64, Ordering::Relaxed);

        tracing::trace!(
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed.len(),
            "Record published"
        );

        report
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            records_published: self.counters.records_published.load(Ordering::Relaxed),
            frames_delivered: self.counters.frames_delivered.load(Ordering::Relaxed),
            failed_sends: self.counters.failed_sends.load(Ordering::Relaxed),
            subscribers: self.registry.len(),
        }
    }
}
