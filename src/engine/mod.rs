//! Enrichment Engine Module
//!
//! - `errors` - Error types for decode and validation failures
//! - `window_store` - Per-symbol rolling windows and moving averages
//! - `pipeline` - Payload -> enriched record

pub mod errors;
pub mod pipeline;
pub mod window_store;

pub use errors::EnrichError;
pub use pipeline::EnrichmentPipeline;
pub use window_store::{round2, Indicators, RollingWindow, WindowStore, WindowView};
