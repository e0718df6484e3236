//! In-memory mirror of the forwarder → server → node → sensor hierarchy.
//!
//! Child lists are rebuilt wholesale on every refresh. Anything that needs
//! to find "the same" device after a refresh matches on id strings.

use serde::Serialize;
use std::fmt;

use super::config::{ForwarderConfig, KnownDevice, NodeConfig, ServerConfig};
use super::location::LocationNode;
use crate::domain::foundation::{NodeId, SensorId, SensorPath, ServerId};

/// The four levels of the device hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceKind {
    Forwarder,
    Server,
    Node,
    Sensor,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceKind::Forwarder => "FORWARDER",
            DeviceKind::Server => "SERVER",
            DeviceKind::Node => "NODE",
            DeviceKind::Sensor => "SENSOR",
        };
        f.write_str(s)
    }
}

/// Behaviour shared by every level of the hierarchy.
pub trait Device {
    fn kind(&self) -> DeviceKind;

    /// Identity string reported by the backend.
    fn id(&self) -> &str;

    /// Number of direct children (always zero for sensors).
    fn child_count(&self) -> usize;
}

/// Leaf of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sensor {
    pub id: SensorId,
    pub sensor_type: String,
    pub desc: String,
    /// Converted display value, or `"Error: ..."` when the sample failed.
    pub value: String,
    pub warning: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub info: KnownDevice,
    /// Full configuration, absent when the fetch failed.
    pub config: Option<NodeConfig>,
    pub sensors: Vec<Sensor>,
    pub warning: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Server {
    pub id: ServerId,
    pub info: KnownDevice,
    pub config: Option<ServerConfig>,
    pub nodes: Vec<Node>,
    pub warning: bool,
}

/// Root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Forwarder {
    pub config: ForwarderConfig,
    pub servers: Vec<Server>,
    /// Servers grouped by the location path in their description.
    pub locations: Vec<LocationNode>,
    /// Set when the forwarder itself could not be reached.
    pub error: Option<String>,
}

/// Shared view-model holding the current root.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceTree {
    pub forwarder: Forwarder,
}

impl Sensor {
    pub fn new(id: impl Into<SensorId>, sensor_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sensor_type: sensor_type.into(),
            ..Self::default()
        }
    }
}

impl Node {
    pub fn from_known(info: KnownDevice) -> Self {
        Self {
            id: NodeId::new(info.id.clone()),
            info,
            config: None,
            sensors: Vec::new(),
            warning: false,
        }
    }

    pub fn sensor(&self, id: &SensorId) -> Option<&Sensor> {
        self.sensors.iter().find(|s| &s.id == id)
    }

    pub fn sensor_mut(&mut self, id: &SensorId) -> Option<&mut Sensor> {
        self.sensors.iter_mut().find(|s| &s.id == id)
    }

    /// Clears the node's own flag and every sensor flag below it.
    pub fn clear_warnings(&mut self) {
        self.warning = false;
        for sensor in &mut self.sensors {
            sensor.warning = false;
        }
    }
}

impl Server {
    pub fn from_known(info: KnownDevice) -> Self {
        Self {
            id: ServerId::new(info.id.clone()),
            info,
            config: None,
            nodes: Vec::new(),
            warning: false,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// Flags the server, the matching node and the matching sensor.
    ///
    /// The sensor's displayed value is replaced with `display_value`.
    /// Returns true if the sensor itself was found.
    pub fn flag_warning(&mut self, path: &SensorPath, display_value: impl Into<String>) -> bool {
        if self.id != path.server_id {
            return false;
        }
        self.warning = true;
        let Some(node) = self.node_mut(&path.node_id) else {
            return false;
        };
        node.warning = true;
        match node.sensor_mut(&path.sensor_id) {
            Some(sensor) => {
                sensor.warning = true;
                sensor.value = display_value.into();
                true
            }
            None => false,
        }
    }

    pub fn sensor_count(&self) -> usize {
        self.nodes.iter().map(|n| n.sensors.len()).sum()
    }
}

impl Forwarder {
    pub fn server(&self, id: &ServerId) -> Option<&Server> {
        self.servers.iter().find(|s| &s.id == id)
    }

    pub fn server_mut(&mut self, id: &ServerId) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| &s.id == id)
    }

    pub fn sensor(&self, path: &SensorPath) -> Option<&Sensor> {
        self.server(&path.server_id)?
            .node(&path.node_id)?
            .sensor(&path.sensor_id)
    }
}

impl Device for Forwarder {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Forwarder
    }

    fn id(&self) -> &str {
        self.config.forwarder_id.as_str()
    }

    fn child_count(&self) -> usize {
        self.servers.len()
    }
}

impl Device for Server {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Server
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn child_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Device for Node {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Node
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn child_count(&self) -> usize {
        self.sensors.len()
    }
}

impl Device for Sensor {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Sensor
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn child_count(&self) -> usize {
        0
    }
}
