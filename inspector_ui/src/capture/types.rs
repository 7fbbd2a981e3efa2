//! Core types for the capture buffers

use crate::viewer::Value;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories of the protocol log buffer
pub const LOG_CATEGORIES: [&str; 6] = ["app_state", "logs", "received", "sent", "decode", "encode"];

/// Category of the host event buffer
pub const EVENT_CATEGORY: &str = "events";

/// Label classifying a record; each can be enabled or disabled on its own
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-case tag used in text exports and list rows
    pub fn tag(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One captured record. Immutable once appended.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Monotonic sequence number, unique within one buffer
    pub seq: u64,
    pub category: Category,
    /// Host event name for event records
    pub label: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Local wall-clock time, `HH:MM:SS`
    pub formatted_time: String,
    pub payload: Vec<Value>,
}

impl LogRecord {
    pub(crate) fn new(seq: u64, category: Category, label: Option<String>, payload: Vec<Value>) -> Self {
        let timestamp = Utc::now();
        let formatted_time = timestamp.with_timezone(&Local).format("%H:%M:%S").to_string();
        Self {
            seq,
            category,
            label,
            timestamp,
            formatted_time,
            payload,
        }
    }

    /// ISO-8601 capture time with millisecond precision
    pub fn iso_timestamp(&self) -> String {
        iso_timestamp(&self.timestamp)
    }

    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.payload.iter().map(Value::to_json).collect())
    }

    /// Export shape: `{type, timestamp, formattedTime, data}` plus `event` when labelled
    pub fn to_json(&self) -> serde_json::Value {
        let mut entry = serde_json::json!({
            "type": self.category.as_str(),
            "timestamp": self.iso_timestamp(),
            "formattedTime": self.formatted_time,
            "data": self.payload_json(),
        });
        if let (Some(label), Some(map)) = (&self.label, entry.as_object_mut()) {
            map.insert("event".to_string(), serde_json::Value::String(label.clone()));
        }
        entry
    }

    /// `[time] [TYPE] <json payload>`
    pub fn format_display(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.formatted_time,
            self.category.tag(),
            self.payload_json()
        )
    }
}

pub fn iso_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = LogRecord::new(
            7,
            Category::new("sent"),
            None,
            vec![Value::from("ping"), Value::object([("id", Value::from(3i64))])],
        );
        let json = record.to_json();
        assert_eq!(json["type"], "sent");
        assert_eq!(json["data"], serde_json::json!(["ping", {"id": 3}]));
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(record.formatted_time.len(), 8);
        assert!(json.get("event").is_none());
    }

    #[test]
    fn test_format_display_uses_tag() {
        let record = LogRecord::new(1, Category::new("app_state"), None, vec![Value::Null]);
        let line = record.format_display();
        assert!(line.contains("[APP_STATE] [null]"), "{}", line);
    }

    #[test]
    fn test_event_label_in_json() {
        let record = LogRecord::new(1, Category::new(EVENT_CATEGORY), Some("chat.open".into()), vec![]);
        assert_eq!(record.to_json()["event"], "chat.open");
    }
}
