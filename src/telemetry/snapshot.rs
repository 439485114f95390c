use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TelemetryError;

/// One reading pushed by the bin sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Centimetres.
    pub height: f64,
    /// Fill level, nominally 0 to 100.
    pub percentage: f64,
}

impl TelemetrySnapshot {
    pub fn new(height: f64, percentage: f64) -> Self {
        Self { height, percentage }
    }

    /// Decodes the value stored under the feed channel.
    ///
    /// Accepted forms, in order of preference:
    /// - `{"height": h, "percentage": p}`
    /// - `[h, p]`
    /// - any other object, whose values are read as `[h, p]` in key order
    ///
    /// Numbers may also arrive as numeric strings.
    pub fn from_value(value: &Value) -> Result<Self, TelemetryError> {
        let (height, percentage) = match value {
            Value::Object(map) if map.contains_key("height") && map.contains_key("percentage") => {
                (&map["height"], &map["percentage"])
            }
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                match keys.as_slice() {
                    [first, second, ..] => (&map[first.as_str()], &map[second.as_str()]),
                    _ => {
                        return Err(TelemetryError::InvalidPayload(format!(
                            "expected two values, got {}",
                            map.len()
                        )))
                    }
                }
            }
            Value::Array(items) => match items.as_slice() {
                [first, second, ..] => (first, second),
                _ => {
                    return Err(TelemetryError::InvalidPayload(format!(
                        "expected two values, got {}",
                        items.len()
                    )))
                }
            },
            other => {
                return Err(TelemetryError::InvalidPayload(format!(
                    "unexpected payload {}",
                    other
                )))
            }
        };

        Ok(Self {
            height: number(height, "height")?,
            percentage: number(percentage, "percentage")?,
        })
    }
}

fn number(value: &Value, field: &'static str) -> Result<f64, TelemetryError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        Some(_) => Err(TelemetryError::NonFinite { field }),
        None => Err(TelemetryError::NotANumber {
            field,
            value: value.to_string(),
        }),
    }
}
