//! Process configuration
//!
//! Everything is read from environment variables (optionally seeded from a
//! `.env` file by `main`). Unparseable values fall back to their default with
//! a warning; inconsistent combinations are rejected by [`AppConfig::validate`].

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::rabbitmq::{RabbitMQConfig, ReconnectConfig};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Moving-average window sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub fast_window: usize,
    pub slow_window: usize,
}

impl IndicatorConfig {
    pub fn new(fast_window: usize, slow_window: usize) -> Result<Self, ConfigError> {
        let config = Self {
            fast_window,
            slow_window,
        };
        config.validate()?;
        Ok(config)
    }

    /// Buffer length needed to serve both averages from one window
    pub fn capacity(&self) -> usize {
        self.fast_window.max(self.slow_window)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_window == 0 {
            return Err(ConfigError::Invalid(
                "fast window must be greater than 0".to_string(),
            ));
        }
        if self.slow_window <= self.fast_window {
            return Err(ConfigError::Invalid(format!(
                "slow window ({}) must be greater than fast window ({})",
                self.slow_window, self.fast_window
            )));
        }
        Ok(())
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_window: 3,
            slow_window: 5,
        }
    }
}

/// HTTP / WebSocket listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8765".to_string(),
        }
    }
}

/// Fan-out tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Upper bound for handing one frame to one subscriber
    pub send_timeout_ms: u64,
    /// Frames buffered per subscriber before sends start waiting
    pub subscriber_buffer: usize,
    /// Interval between server-initiated WebSocket pings
    pub heartbeat_secs: u64,
}

impl BroadcastConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 250,
            subscriber_buffer: 256,
            heartbeat_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub indicators: IndicatorConfig,
    pub server: ServerConfig,
    pub broadcast: BroadcastConfig,
    pub rabbitmq: RabbitMQConfig,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let reconnect_defaults = ReconnectConfig::default();

        let config = AppConfig {
            indicators: IndicatorConfig {
                fast_window: parse_or(&lookup, "SMA_FAST_WINDOW", defaults.indicators.fast_window),
                slow_window: parse_or(&lookup, "SMA_SLOW_WINDOW", defaults.indicators.slow_window),
            },
            server: ServerConfig {
                bind_addr: lookup("WS_BIND_ADDR").unwrap_or(defaults.server.bind_addr),
            },
            broadcast: BroadcastConfig {
                send_timeout_ms: parse_or(
                    &lookup,
                    "WS_SEND_TIMEOUT_MS",
                    defaults.broadcast.send_timeout_ms,
                ),
                subscriber_buffer: parse_or(
                    &lookup,
                    "WS_SUBSCRIBER_BUFFER",
                    defaults.broadcast.subscriber_buffer,
                ),
                heartbeat_secs: parse_or(
                    &lookup,
                    "WS_HEARTBEAT_SECS",
                    defaults.broadcast.heartbeat_secs,
                ),
            },
            rabbitmq: RabbitMQConfig {
                uri: lookup("RABBITMQ_URI").unwrap_or(defaults.rabbitmq.uri),
                queue: lookup("RABBITMQ_QUEUE").unwrap_or(defaults.rabbitmq.queue),
                durable: parse_or(&lookup, "RABBITMQ_DURABLE", defaults.rabbitmq.durable),
                prefetch_count: parse_or(
                    &lookup,
                    "RABBITMQ_PREFETCH",
                    defaults.rabbitmq.prefetch_count,
                ),
                connection_timeout_secs: parse_or(
                    &lookup,
                    "RABBITMQ_TIMEOUT",
                    defaults.rabbitmq.connection_timeout_secs,
                ),
                requeue_rejected: parse_or(
                    &lookup,
                    "RABBITMQ_REQUEUE_INVALID",
                    defaults.rabbitmq.requeue_rejected,
                ),
                auto_start: parse_or(&lookup, "RABBITMQ_AUTO_START", defaults.rabbitmq.auto_start),
                reconnect: ReconnectConfig {
                    enabled: parse_or(
                        &lookup,
                        "RABBITMQ_RECONNECT",
                        reconnect_defaults.enabled,
                    ),
                    initial_delay_ms: parse_or(
                        &lookup,
                        "RABBITMQ_RECONNECT_INITIAL_MS",
                        reconnect_defaults.initial_delay_ms,
                    ),
                    max_delay_ms: parse_or(
                        &lookup,
                        "RABBITMQ_RECONNECT_MAX_MS",
                        reconnect_defaults.max_delay_ms,
                    ),
                    backoff_multiplier: reconnect_defaults.backoff_multiplier,
                    max_attempts: parse_or(
                        &lookup,
                        "RABBITMQ_RECONNECT_MAX_ATTEMPTS",
                        reconnect_defaults.max_attempts,
                    ),
                },
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;

        if self.broadcast.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(
                "subscriber buffer must be greater than 0".to_string(),
            ));
        }
        if self.broadcast.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "send timeout must be greater than 0".to_string(),
            ));
        }
        if self.broadcast.heartbeat_secs == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat interval must be greater than 0".to_string(),
            ));
        }
        if self.rabbitmq.queue.trim().is_empty() {
            return Err(ConfigError::Invalid("queue name must not be empty".to_string()));
        }
        SocketAddr::from_str(&self.server.bind_addr).map_err(|e| {
            ConfigError::Invalid(format!("bind address '{}': {}", self.server.bind_addr, e))
        })?;

        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("⚠️  Ignoring unparseable {}={:?}, using default", key, raw);
                default
            }
        },
        None => default,
    }
}
