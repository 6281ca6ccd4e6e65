use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use crate::engine::WindowStore;
use crate::ingestion::IngestionAdapter;
use crate::rabbitmq::RabbitMQConsumer;
use crate::websocket::SubscriberRegistry;

use super::responses::*;

/// Shared state for the REST endpoints
#[derive(Clone)]
pub struct AppState {
    pub registry: SubscriberRegistry,
    pub store: Arc<WindowStore>,
    pub adapter: Arc<IngestionAdapter>,
    pub consumer: Option<Arc<RabbitMQConsumer>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No ticks received for symbol: {0}")]
    SymbolNotFound(String),
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let consumer_connected = state.consumer.as_ref().map(|c| c.is_connected());
    let status = match consumer_connected {
        Some(false) => "degraded",
        _ => "healthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        subscribers: state.registry.len(),
        consumer_connected,
        symbols_tracked: state.store.len(),
        timestamp: Utc::now(),
    })
}

/// Ingestion, broadcast and consumer statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Metrics",
    responses(
        (status = 200, description = "Pipeline statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        ingestion: state.adapter.stats(),
        broadcast: state.adapter.broadcaster().stats(),
        consumer: state.consumer.as_ref().map(|c| c.stats()),
        latency: state.adapter.latency_stats(),
    })
}

/// List symbols with a rolling window
#[utoipa::path(
    get,
    path = "/api/v1/indicators",
    tag = "Indicators",
    responses(
        (status = 200, description = "Tracked symbols", body = SymbolListResponse)
    )
)]
pub async fn list_symbols(State(state): State<AppState>) -> Json<SymbolListResponse> {
    Json(SymbolListResponse {
        symbols: state.store.symbols(),
    })
}

/// Current window and moving averages for a symbol
#[utoipa::path(
    get,
    path = "/api/v1/indicators/{symbol}",
    tag = "Indicators",
    params(
        ("symbol" = String, Path, description = "Ticker symbol")
    ),
    responses(
        (status = 200, description = "Window found", body = IndicatorResponse),
        (status = 404, description = "Symbol has no ticks yet", body = ErrorResponse)
    )
)]
pub async fn get_indicators(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<IndicatorResponse>, ApiError> {
    let config = state.store.config();
    let view = state
        .store
        .view(&symbol)
        .ok_or_else(|| ApiError::SymbolNotFound(symbol.clone()))?;

    Ok(Json(IndicatorResponse::new(
        view,
        config.fast_window,
        config.slow_window,
    )))
}
