//! Warning events pushed by the forwarder and the bounded log they feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

use crate::domain::conversion::deserialize_raw_value;
use crate::domain::foundation::{NodeId, SensorId, SensorPath, ServerId, Timestamp, ValidationError};

/// Log length used when nothing else is configured.
pub const DEFAULT_WARNING_LOG_LEN: usize = 6;
pub const MAX_WARNING_LOG_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningNode {
    pub id: NodeId,
}

/// Decoded body of a realtime `warning` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningPayload {
    pub timestamp: f64,
    pub sensor_id: SensorId,
    #[serde(deserialize_with = "deserialize_raw_value")]
    pub raw_value: f64,
    pub sensor_type: String,
    pub server: ServerId,
    pub node: WarningNode,
}

impl WarningPayload {
    /// Parses the event data as delivered on the wire.
    ///
    /// Accepts the JSON document itself, a string holding it, or an object
    /// wrapping either under `data`.
    pub fn from_event_data(data: &Value) -> Result<Self, ValidationError> {
        match data {
            Value::String(text) => serde_json::from_str(text)
                .map_err(|e| ValidationError::invalid_format("warning", e.to_string())),
            Value::Object(map) if !map.contains_key("sensor_id") => match map.get("data") {
                Some(inner) => Self::from_event_data(inner),
                None => Err(ValidationError::empty_field("data")),
            },
            other => serde_json::from_value(other.clone())
                .map_err(|e| ValidationError::invalid_format("warning", e.to_string())),
        }
    }

    pub fn sensor_path(&self) -> SensorPath {
        SensorPath {
            server_id: self.server.clone(),
            node_id: self.node.id.clone(),
            sensor_id: self.sensor_id.clone(),
        }
    }

    /// When the node observed the reading; falls back to now for garbage.
    pub fn observed_at(&self) -> Timestamp {
        Timestamp::from_unix_secs_f64(self.timestamp).unwrap_or_else(Timestamp::now)
    }
}

/// One formatted row of the warning log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningItem {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    /// `server/node`.
    pub device: String,
    pub sensor_id: SensorId,
    pub sensor_type: String,
    pub kind: String,
    /// Converted display value.
    pub value: String,
}

/// Fixed-length, most-recent-first list of warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct WarningLog {
    max_len: usize,
    items: VecDeque<WarningItem>,
}

impl WarningLog {
    pub fn new(max_len: usize) -> Result<Self, ValidationError> {
        if !(1..=MAX_WARNING_LOG_LEN).contains(&max_len) {
            return Err(ValidationError::out_of_range(
                "warning_log_len",
                1,
                MAX_WARNING_LOG_LEN as i64,
                max_len as i64,
            ));
        }
        Ok(Self {
            max_len,
            items: VecDeque::with_capacity(max_len + 1),
        })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepends an entry and drops whatever falls off the tail.
    pub fn record(&mut self, item: WarningItem) {
        self.items.push_front(item);
        self.items.truncate(self.max_len);
    }

    pub fn newest(&self) -> Option<&WarningItem> {
        self.items.front()
    }

    pub fn items(&self) -> Vec<WarningItem> {
        self.items.iter().cloned().collect()
    }
}

impl Default for WarningLog {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_WARNING_LOG_LEN,
            items: VecDeque::with_capacity(DEFAULT_WARNING_LOG_LEN + 1),
        }
    }
}
