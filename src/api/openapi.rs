use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::responses::*;
use crate::ingestion::IngestionStats;
use crate::metrics::LatencyStats;
use crate::rabbitmq::ConsumerStats;
use crate::websocket::BroadcastStats;

/// OpenAPI v1 specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Price Stream API",
        version = "1.0.0",
        description = "Streams price ticks from RabbitMQ, enriches them with moving averages and pushes them to WebSocket subscribers at /ws",
        license(
            name = "MIT"
        )
    ),
    paths(
        handlers::get_health,
        handlers::get_stats,
        handlers::list_symbols,
        handlers::get_indicators,
    ),
    components(
        schemas(
            HealthResponse,
            StatsResponse,
            IndicatorResponse,
            SymbolListResponse,
            ErrorResponse,
            IngestionStats,
            BroadcastStats,
            ConsumerStats,
            LatencyStats,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Metrics", description = "Ingestion and broadcast statistics"),
        (name = "Indicators", description = "Rolling window inspection"),
    )
)]
pub struct ApiDocV1;
