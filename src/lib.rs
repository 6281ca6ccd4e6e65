// Library Crate Root
// lib.rs
//
// main.rs and the integration tests import through lib.rs like an external crate
pub mod api;
pub mod config;
pub mod engine;
pub mod ingestion;
pub mod metrics;
pub mod models;
pub mod rabbitmq;
pub mod websocket;

// pub use = re-export at crate root
pub use api::{create_router, AppState};
pub use config::{AppConfig, BroadcastConfig, ConfigError, IndicatorConfig, ServerConfig};
pub use engine::{EnrichError, EnrichmentPipeline, Indicators, WindowStore};
pub use ingestion::{Disposition, IngestionAdapter};
pub use models::{EnrichedRecord, Tick, TickTimestamp};
pub use rabbitmq::{RabbitMQConfig, RabbitMQConsumer};
pub use websocket::{Broadcaster, SubscriberRegistry, WsState};
