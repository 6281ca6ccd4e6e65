use std::sync::Arc;

use super::errors::EnrichError;
use super::window_store::WindowStore;
use crate::models::{EnrichedRecord, Tick, TickTimestamp};

/// Turns raw queue payloads into enriched records
///
/// The only side effect is the Window Store update; decode and validation
/// failures are returned to the caller untouched so the ingestion boundary
/// can decide how to acknowledge the message.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    store: Arc<WindowStore>,
}

impl EnrichmentPipeline {
    pub fn new(store: Arc<WindowStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<WindowStore> {
        &self.store
    }

    /// Decode, validate and enrich one payload, stamping it with the current
    /// time if it carries no timestamp
    pub fn process(&self, payload: &[u8]) -> Result<EnrichedRecord, EnrichError> {
        self.process_at(payload, TickTimestamp::now())
    }

    /// Same as [`process`](Self::process) with an explicit receive time
    pub fn process_at(
        &self,
        payload: &[u8],
        received_at: TickTimestamp,
    ) -> Result<EnrichedRecord, EnrichError> {
        let tick = Tick::from_payload(payload, received_at)?;
        self.enrich(tick)
    }

    /// Enrich an already validated tick
    pub fn enrich(&self, tick: Tick) -> Result<EnrichedRecord, EnrichError> {
        let indicators = self.store.update(&tick.symbol, tick.price)?;
        Ok(EnrichedRecord::new(tick, indicators))
    }
}
