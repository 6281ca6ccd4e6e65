use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::WindowView;
use crate::ingestion::IngestionStats;
use crate::metrics::LatencyStats;
use crate::rabbitmq::ConsumerStats;
use crate::websocket::BroadcastStats;

/// Service health
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub subscribers: usize,
    /// `None` when no queue consumer is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_connected: Option<bool>,
    pub symbols_tracked: usize,
    pub timestamp: DateTime<Utc>,
}

/// Pipeline counters and latencies
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub ingestion: IngestionStats,
    pub broadcast: BroadcastStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<ConsumerStats>,
    pub latency: Vec<LatencyStats>,
}

/// Current rolling window of one symbol
#[derive(Debug, Serialize, ToSchema)]
pub struct IndicatorResponse {
    pub symbol: String,
    pub samples: usize,
    pub prices: Vec<f64>,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub fast_window: usize,
    pub slow_window: usize,
}

impl IndicatorResponse {
    pub fn new(view: WindowView, fast_window: usize, slow_window: usize) -> Self {
        Self {
            symbol: view.symbol,
            samples: view.prices.len(),
            prices: view.prices,
            sma_fast: view.sma_fast,
            sma_slow: view.sma_slow,
            fast_window,
            slow_window,
        }
    }
}

/// Symbols that have received at least one tick
#[derive(Debug, Serialize, ToSchema)]
pub struct SymbolListResponse {
    pub symbols: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
