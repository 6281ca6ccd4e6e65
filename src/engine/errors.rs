//! Error types for tick enrichment
//!
//! Both variants mean the same thing to the ingestion path: the message is
//! rejected, nothing is broadcast, and the consume loop moves on.

use thiserror::Error;

/// Errors raised while turning an inbound payload into an enriched record
///
/// # Error Categories
///
/// - **Decode Errors**: `Decode` - the payload is not a JSON object
/// - **Validation Errors**: `InvalidTick` - the object is missing a required
///   field or carries a value of the wrong type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnrichError {
    /// Payload is not valid UTF-8 JSON, or is JSON but not an object
    #[error("Decode error: {0}")]
    Decode(String),

    /// Required field missing or malformed (price, symbol)
    #[error("Invalid tick: {0}")]
    InvalidTick(String),
}

impl EnrichError {
    /// Returns true if the payload could not be decoded at all
    pub fn is_decode_error(&self) -> bool {
        matches!(self, EnrichError::Decode(_))
    }

    /// Returns true if the payload decoded but failed field validation
    pub fn is_invalid_tick(&self) -> bool {
        matches!(self, EnrichError::InvalidTick(_))
    }

    /// Short label used in logs and counters
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichError::Decode(_) => "decode_error",
            EnrichError::InvalidTick(_) => "invalid_tick",
        }
    }
}

impl From<serde_json::Error> for EnrichError {
    fn from(err: serde_json::Error) -> Self {
        EnrichError::Decode(err.to_string())
    }
}
