//! Configuration documents exchanged with the backend.
//!
//! Each device type has a flat key/value document. Documents are fetched on
//! demand and replaced wholesale on save. Every field defaults so partial
//! documents from older backends still decode.

use serde::{Deserialize, Serialize};

use crate::domain::conversion::deserialize_raw_value;
use crate::domain::foundation::{ForwarderId, NodeId, SensorId, ServerId};

/// Forwarder configuration (`/forwarder/forwarderconfig`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    pub forwarder_host: String,
    pub forwarder_port: u16,
    pub forwarder_id: ForwarderId,
    pub forwarder_desc: String,
}

/// Server configuration (`/server/serverconfig/{serverId}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server_host: String,
    pub server_port: u16,
    pub server_id: ServerId,
    pub server_desc: String,
    pub forwarder_addr: String,
    pub forwarder_port: u16,
}

/// One sensor row embedded in a node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorEntry {
    pub sensor_type: String,
    pub sensor_id: SensorId,
    pub sensor_desc: String,
    /// Driver-specific settings, opaque to the console.
    pub sensor_config: serde_json::Map<String, serde_json::Value>,
}

/// One warning filter row embedded in a node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterEntry {
    pub apply_on_sensor_type: String,
    pub apply_on_sensor_id: String,
    pub comparing_method: String,
    pub threshold: f64,
}

/// Node configuration (`/server/nodeconfig/{serverId}/{nodeId}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_host: String,
    pub node_port: u16,
    pub node_id: NodeId,
    pub node_desc: String,
    pub server_addr: String,
    pub server_port: u16,
    pub sensors: Vec<SensorEntry>,
    pub filters: Vec<FilterEntry>,
}

/// An entry of `/forwarder/knownservers` or `/server/knownnodes/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnownDevice {
    pub id: String,
    pub addr: String,
    pub port: u16,
    pub desc: String,
}

impl KnownDevice {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }
}

/// One reading from `/server/sensordata/{serverId}/{nodeId}/{sensorId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Unix seconds, possibly fractional.
    pub timestamp: f64,
    #[serde(deserialize_with = "deserialize_raw_value")]
    pub raw_value: f64,
    pub sensor_type: String,
}
