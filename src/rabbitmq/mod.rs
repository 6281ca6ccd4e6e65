pub mod config;
pub mod consumer;

pub use config::{RabbitMQConfig, ReconnectConfig};
pub use consumer::{Backoff, ConsumerError, ConsumerStats, RabbitMQConsumer};
