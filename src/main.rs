use price_stream_api::{
    create_router, AppConfig, AppState, Broadcaster, EnrichmentPipeline, IngestionAdapter,
    RabbitMQConsumer, SubscriberRegistry, WindowStore, WsState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_stream_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "📈 Indicators: SMA fast={} slow={}",
        config.indicators.fast_window,
        config.indicators.slow_window
    );

    let shutdown = CancellationToken::new();

    // Enrichment core
    let store = Arc::new(WindowStore::new(config.indicators));
    let pipeline = EnrichmentPipeline::new(store.clone());

    // Fan-out
    let registry = SubscriberRegistry::new();
    let broadcaster = Broadcaster::new(registry.clone(), config.broadcast.send_timeout());

    let adapter = Arc::new(IngestionAdapter::new(pipeline, broadcaster));

    // Queue consumer; absent in broker-less mode
    let (consumer, consumer_handle) =
        RabbitMQConsumer::spawn(config.rabbitmq.clone(), adapter.clone(), shutdown.clone())
            .unzip();

    let ws_state = Arc::new(WsState {
        registry: registry.clone(),
        subscriber_buffer: config.broadcast.subscriber_buffer,
        heartbeat: config.broadcast.heartbeat(),
        shutdown: shutdown.clone(),
    });

    let app_state = AppState {
        registry: registry.clone(),
        store,
        adapter,
        consumer,
    };

    let app = create_router(app_state, ws_state);

    let addr = config.server.bind_addr.as_str();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("❌ Failed to bind {}: {}", addr, e);
            shutdown.cancel();
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Price Stream API running on http://{}", addr);
    tracing::info!("🔌 WebSocket: ws://{}/ws", addr);
    tracing::info!("📊 Health check: http://{}/api/v1/health", addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", addr);

    tokio::spawn(watch_signals(shutdown.clone()));

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.clone().cancelled_owned())
    .await;

    if let Err(e) = served {
        tracing::error!("❌ Server error: {}", e);
        shutdown.cancel();
    }

    if let Some(handle) = consumer_handle {
        if let Err(e) = handle.await {
            tracing::error!("❌ Consumer task failed: {}", e);
        }
    }

    let dropped = registry.clear();
    tracing::info!("🔴 Shutdown complete ({} subscribers released)", dropped);
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("❌ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("🛑 Shutdown signal received");
    shutdown.cancel();
}
