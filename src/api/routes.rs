use axum::{routing::get, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::websocket::{websocket_handler, WsState};

use super::handlers::*;
use super::openapi::ApiDocV1;

/// Create the API router with Swagger UI and WebSocket support
///
/// `/ws` reads the peer address, so serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(app_state: AppState, ws_state: Arc<WsState>) -> Router {
    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/v1/openapi.json", ApiDocV1::openapi()))
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        .with_state(ws_state)
        // Health and metrics
        .route("/api/v1/health", get(get_health))
        .route("/api/v1/stats", get(get_stats))
        // Indicator inspection
        .route("/api/v1/indicators", get(list_symbols))
        .route("/api/v1/indicators/:symbol", get(get_indicators))
        .with_state(app_state)
}
