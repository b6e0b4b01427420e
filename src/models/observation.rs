//! Hourly observation records as returned by the forecast API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Field carrying the observation timestamp of every record
pub const OBSERVATION_TIME: &str = "observation_time";

/// Raw value of a single observed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Parse an ISO-8601 / RFC 3339 timestamp value
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        self.as_text()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One hour of forecast data: field name to value.
///
/// Built from a JSON object whose entries look like `{"value": ..., "units": ...}`.
/// Entries that are not such wrappers (the API also echoes bare `lat`/`lon`)
/// or whose value is `null` are not addressable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "HashMap<String, Value>")]
pub struct ObservationRecord {
    fields: HashMap<String, FieldValue>,
}

impl ObservationRecord {
    pub fn new<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn observation_time(&self) -> Option<DateTime<Utc>> {
        self.get(OBSERVATION_TIME).and_then(FieldValue::as_timestamp)
    }

    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }
}

impl From<HashMap<String, Value>> for ObservationRecord {
    fn from(raw: HashMap<String, Value>) -> Self {
        let fields = raw
            .into_iter()
            .filter_map(|(name, entry)| {
                let value = match entry {
                    Value::Object(mut wrapper) => wrapper.remove("value")?,
                    _ => return None,
                };
                let value = match value {
                    Value::Number(n) => FieldValue::Number(n.as_f64()?),
                    Value::String(s) => FieldValue::Text(s),
                    _ => return None,
                };
                Some((name, value))
            })
            .collect();
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wrapped_fields() {
        let json = r#"{
            "lat": 38.66,
            "lon": 48.8,
            "temp": {"value": 21.5, "units": "C"},
            "precipitation": {"value": null, "units": "mm/hr"},
            "observation_time": {"value": "2024-01-01T03:00:00.000Z"}
        }"#;
        let record: ObservationRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.number("temp"), Some(21.5));
        assert!(record.get("lat").is_none());
        assert!(record.get("precipitation").is_none());
        assert_eq!(
            record.observation_time().unwrap().to_rfc3339(),
            "2024-01-01T03:00:00+00:00"
        );
    }

    #[test]
    fn test_field_value_accessors() {
        let number = FieldValue::from(4.0);
        assert_eq!(number.as_f64(), Some(4.0));
        assert!(number.as_timestamp().is_none());

        let text = FieldValue::from("not a date");
        assert!(text.as_f64().is_none());
        assert!(text.as_timestamp().is_none());
    }
}
