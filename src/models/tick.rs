use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::HashMap;

use crate::engine::errors::EnrichError;

/// Tick timestamp as it travels on the wire
///
/// Producers send either Unix seconds or a formatted string (ISO-8601 from
/// some feeds). The value is passed through to subscribers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickTimestamp {
    Epoch(f64),
    Text(String),
}

impl TickTimestamp {
    /// Current wall-clock time as Unix seconds with microsecond precision
    pub fn now() -> Self {
        TickTimestamp::Epoch(chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0)
    }
}

/// Inbound message body, before validation
///
/// Fields are kept as raw JSON values so that a wrong type ends up as
/// `InvalidTick` instead of a generic decode failure.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawTick {
    pub symbol: Option<Value>,
    pub price: Option<Value>,
    pub timestamp: Option<Value>,
}

impl RawTick {
    /// Decode a queue message body
    ///
    /// Anything that is not a JSON object fails with `EnrichError::Decode`.
    /// Each field is parsed on its own, so a number outside the f64 range is
    /// charged to that field: `InvalidTick` for `symbol` and `price`, the
    /// receive-time fallback for `timestamp`.
    pub fn decode(payload: &[u8]) -> Result<Self, EnrichError> {
        let fields: HashMap<String, Box<RawValue>> = serde_json::from_slice(payload)?;

        Ok(Self {
            symbol: parse_field(&fields, "symbol")?,
            price: parse_field(&fields, "price")?,
            timestamp: parse_field(&fields, "timestamp").unwrap_or(None),
        })
    }
}

// Raw text already passed the outer parse; the only failure left is a
// number that does not fit in an f64.
fn parse_field(
    fields: &HashMap<String, Box<RawValue>>,
    name: &str,
) -> Result<Option<Value>, EnrichError> {
    fields
        .get(name)
        .map(|raw| {
            serde_json::from_str::<Value>(raw.get()).map_err(|_| {
                EnrichError::InvalidTick(format!("{} {} is out of range", name, raw.get()))
            })
        })
        .transpose()
}

/// One validated price observation
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub timestamp: TickTimestamp,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: TickTimestamp) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }

    /// Decode and validate a payload in one step
    ///
    /// `received_at` is substituted when the payload has no usable timestamp.
    pub fn from_payload(payload: &[u8], received_at: TickTimestamp) -> Result<Self, EnrichError> {
        Self::validate(RawTick::decode(payload)?, received_at)
    }

    /// Validate a decoded message, failing closed on missing or mistyped fields
    pub fn validate(raw: RawTick, received_at: TickTimestamp) -> Result<Self, EnrichError> {
        let price = match raw.price {
            None | Some(Value::Null) => {
                return Err(EnrichError::InvalidTick("missing price".to_string()))
            }
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|p| p.is_finite())
                .ok_or_else(|| EnrichError::InvalidTick(format!("price {} is not finite", n)))?,
            Some(other) => {
                return Err(EnrichError::InvalidTick(format!(
                    "price must be a number, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let symbol = match raw.symbol {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            None | Some(Value::Null) => {
                return Err(EnrichError::InvalidTick("missing symbol".to_string()))
            }
            Some(Value::String(_)) => {
                return Err(EnrichError::InvalidTick("empty symbol".to_string()))
            }
            Some(other) => {
                return Err(EnrichError::InvalidTick(format!(
                    "symbol must be a string, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let timestamp = match raw.timestamp {
            Some(Value::Number(n)) => match n.as_f64().filter(|t| t.is_finite()) {
                Some(t) => TickTimestamp::Epoch(t),
                None => received_at,
            },
            Some(Value::String(s)) if !s.is_empty() => TickTimestamp::Text(s),
            _ => received_at,
        };

        Ok(Self {
            symbol,
            price,
            timestamp,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received() -> TickTimestamp {
        TickTimestamp::Epoch(1_700_000_000.0)
    }

    #[test]
    fn test_valid_tick() {
        let tick = Tick::from_payload(
            br#"{"symbol":"AAPL","price":101.25,"timestamp":1700000123.5}"#,
            received(),
        )
        .unwrap();

        assert_eq!(tick.symbol, "AAPL");
        assert_eq!(tick.price, 101.25);
        assert_eq!(tick.timestamp, TickTimestamp::Epoch(1700000123.5));
    }

    #[test]
    fn test_integer_price_accepted() {
        let tick = Tick::from_payload(br#"{"symbol":"X","price":10}"#, received()).unwrap();
        assert_eq!(tick.price, 10.0);
    }

    #[test]
    fn test_string_timestamp_passes_through() {
        let tick = Tick::from_payload(
            br#"{"symbol":"AAPL","price":1.0,"timestamp":"2024-01-02T03:04:05"}"#,
            received(),
        )
        .unwrap();

        assert_eq!(
            tick.timestamp,
            TickTimestamp::Text("2024-01-02T03:04:05".to_string())
        );
    }

    #[test]
    fn test_missing_timestamp_uses_received_time() {
        let tick = Tick::from_payload(br#"{"symbol":"AAPL","price":1.0}"#, received()).unwrap();
        assert_eq!(tick.timestamp, received());

        let tick = Tick::from_payload(
            br#"{"symbol":"AAPL","price":1.0,"timestamp":null}"#,
            received(),
        )
        .unwrap();
        assert_eq!(tick.timestamp, received());

        let tick = Tick::from_payload(
            br#"{"symbol":"AAPL","price":1.0,"timestamp":[1,2]}"#,
            received(),
        )
        .unwrap();
        assert_eq!(tick.timestamp, received());
    }

    #[test]
    fn test_missing_price_is_invalid() {
        let err = Tick::from_payload(br#"{"symbol":"AAPL"}"#, received()).unwrap_err();
        assert_eq!(err, EnrichError::InvalidTick("missing price".to_string()));
    }

    #[test]
    fn test_non_numeric_price_is_invalid() {
        for payload in [
            br#"{"symbol":"AAPL","price":"101.2"}"#.as_slice(),
            br#"{"symbol":"AAPL","price":true}"#.as_slice(),
            br#"{"symbol":"AAPL","price":null}"#.as_slice(),
            br#"{"symbol":"AAPL","price":{"v":1}}"#.as_slice(),
        ] {
            let err = Tick::from_payload(payload, received()).unwrap_err();
            assert!(err.is_invalid_tick(), "expected InvalidTick for {:?}", payload);
        }
    }

    #[test]
    fn test_missing_or_bad_symbol_is_invalid() {
        for payload in [
            br#"{"price":1.0}"#.as_slice(),
            br#"{"symbol":"","price":1.0}"#.as_slice(),
            br#"{"symbol":"  ","price":1.0}"#.as_slice(),
            br#"{"symbol":42,"price":1.0}"#.as_slice(),
        ] {
            let err = Tick::from_payload(payload, received()).unwrap_err();
            assert!(err.is_invalid_tick(), "expected InvalidTick for {:?}", payload);
        }
    }

    #[test]
    fn test_non_object_is_decode_error() {
        for payload in [
            b"not json".as_slice(),
            b"".as_slice(),
            b"[1,2,3]".as_slice(),
            b"42".as_slice(),
            b"\"AAPL\"".as_slice(),
        ] {
            let err = Tick::from_payload(payload, received()).unwrap_err();
            assert!(err.is_decode_error(), "expected Decode for {:?}", payload);
        }
    }

    #[test]
    fn test_out_of_range_price_is_invalid() {
        for payload in [
            br#"{"symbol":"X","price":1e400}"#.as_slice(),
            br#"{"symbol":"X","price":-1e400}"#.as_slice(),
        ] {
            let err = Tick::from_payload(payload, received()).unwrap_err();
            assert!(err.is_invalid_tick(), "expected InvalidTick for {:?}", payload);
        }

        let err = Tick::from_payload(br#"{"symbol":1e999,"price":1.0}"#, received()).unwrap_err();
        assert!(err.is_invalid_tick());
    }

    #[test]
    fn test_out_of_range_timestamp_uses_received_time() {
        let tick = Tick::from_payload(
            br#"{"symbol":"X","price":1.0,"timestamp":1e400}"#,
            received(),
        )
        .unwrap();
        assert_eq!(tick.timestamp, received());
    }

    #[test]
    fn test_out_of_range_unknown_field_ignored() {
        let tick =
            Tick::from_payload(br#"{"symbol":"X","price":1.0,"volume":1e400}"#, received())
                .unwrap();
        assert_eq!(tick.price, 1.0);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let tick = Tick::from_payload(
            br#"{"symbol":"AAPL","price":2.0,"volume":100,"venue":"XNAS"}"#,
            received(),
        )
        .unwrap();
        assert_eq!(tick.price, 2.0);
    }
}
