//! Raw records - what the external record sources hand to the pipeline
//!
//! Records are immutable once fetched; nothing downstream mutates them.

use serde::{Deserialize, Serialize};

/// One metric sample for one device at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricRecord {
    /// ISO-8601 timestamp, expected in UTC
    #[serde(default)]
    pub timestamp: String,

    /// Device serial number (may carry surrounding whitespace)
    #[serde(default)]
    pub serial: String,

    /// Sample value; absent and null are treated alike
    #[serde(default)]
    pub value: Option<RawValue>,
}

impl RawMetricRecord {
    /// Create a record with a numeric value
    pub fn new(timestamp: impl Into<String>, serial: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            serial: serial.into(),
            value: Some(RawValue::Number(value)),
        }
    }

    /// Create a record with no value
    pub fn empty(timestamp: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            serial: serial.into(),
            value: None,
        }
    }
}

/// Sample value as delivered by the source
///
/// Some connectors deliver numbers as JSON strings; both forms are accepted
/// and coerced at join time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Coerce to a finite number
    ///
    /// Returns `None` for unparsable text, empty text, NaN and infinities.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Display-name record for a device
///
/// Several records can exist per serial; the one with the greatest
/// timestamp string is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetadataRecord {
    #[serde(default)]
    pub serial: String,

    #[serde(default, alias = "displayName")]
    pub display_name: String,

    #[serde(default)]
    pub timestamp: String,
}

impl RawMetadataRecord {
    pub fn new(
        serial: impl Into<String>,
        display_name: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            serial: serial.into(),
            display_name: display_name.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// One page returned by a cursor-based source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Opaque cursor for the next page; `None` or empty means done
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// Continuation cursor, if it is non-empty
    pub fn continuation(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_coercion() {
        assert_eq!(RawValue::Number(12.5).as_finite(), Some(12.5));
        assert_eq!(RawValue::Text(" 42.25 ".into()).as_finite(), Some(42.25));
        assert_eq!(RawValue::Text("".into()).as_finite(), None);
        assert_eq!(RawValue::Text("abc".into()).as_finite(), None);
        assert_eq!(RawValue::Number(f64::NAN).as_finite(), None);
        assert_eq!(RawValue::Text("inf".into()).as_finite(), None);
    }

    #[test]
    fn test_record_deserialize_mixed_values() {
        let json = r#"[
            {"timestamp": "2024-01-01T00:00:00Z", "serial": "G9-1", "value": 10.5},
            {"timestamp": "2024-01-01T00:00:00Z", "serial": "G9-2", "value": "7"},
            {"timestamp": "2024-01-01T00:00:00Z", "serial": "G9-3", "value": null},
            {"timestamp": "2024-01-01T00:00:00Z", "serial": "G9-4"}
        ]"#;
        let records: Vec<RawMetricRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].value, Some(RawValue::Number(10.5)));
        assert_eq!(records[1].value, Some(RawValue::Text("7".into())));
        assert_eq!(records[2].value, None);
        assert_eq!(records[3].value, None);
    }

    #[test]
    fn test_metadata_accepts_camel_case_name() {
        let json = r#"{"serial": "G9-1", "displayName": "Truck 1", "timestamp": "2024-01-01"}"#;
        let record: RawMetadataRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.display_name, "Truck 1");
    }

    #[test]
    fn test_page_continuation() {
        let page: Page<u8> = Page {
            items: vec![],
            next_cursor: Some(String::new()),
        };
        assert_eq!(page.continuation(), None);

        let page: Page<u8> = Page {
            items: vec![1],
            next_cursor: Some("c2".into()),
        };
        assert_eq!(page.continuation(), Some("c2"));
        assert_eq!(Page::<u8>::last(vec![]).continuation(), None);
    }
}
