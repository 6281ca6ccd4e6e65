use serde::{Deserialize, Serialize};

use super::tick::{Tick, TickTimestamp};
use crate::engine::window_store::Indicators;

/// Enriched tick sent to every subscriber
///
/// Serialized once per publish. Unavailable averages serialize as JSON
/// `null`, never as `0` and never omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub symbol: String,
    pub price: f64,
    pub timestamp: TickTimestamp,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
}

impl EnrichedRecord {
    pub fn new(tick: Tick, indicators: Indicators) -> Self {
        Self {
            symbol: tick.symbol,
            price: tick.price,
            timestamp: tick.timestamp,
            sma_fast: indicators.sma_fast,
            sma_slow: indicators.sma_slow,
        }
    }

    /// Wire form of the record (one WebSocket text frame)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_unavailable_averages_serialize_as_null() {
        let record = EnrichedRecord::new(
            Tick::new("AAPL", 100.5, TickTimestamp::Epoch(1.5)),
            Indicators {
                sma_fast: None,
                sma_slow: None,
            },
        );

        let value: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "symbol": "AAPL",
                "price": 100.5,
                "timestamp": 1.5,
                "sma_fast": null,
                "sma_slow": null,
            })
        );
    }

    #[test]
    fn test_text_timestamp_serializes_as_string() {
        let record = EnrichedRecord::new(
            Tick::new(
                "AAPL",
                10.0,
                TickTimestamp::Text("2024-01-02T03:04:05".to_string()),
            ),
            Indicators {
                sma_fast: Some(10.0),
                sma_slow: None,
            },
        );

        let value: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["timestamp"], json!("2024-01-02T03:04:05"));
        assert_eq!(value["sma_fast"], json!(10.0));
        assert_eq!(value["sma_slow"], Value::Null);
    }
}
