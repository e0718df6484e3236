//! Device module - the forwarder/server/node/sensor hierarchy and the
//! configuration documents attached to each level.

mod config;
mod location;
mod tree;

pub use config::{
    FilterEntry, ForwarderConfig, KnownDevice, NodeConfig, SensorEntry, SensorSample,
    ServerConfig,
};
pub use location::{location_tree, structurize, LocationNode};
pub use tree::{Device, DeviceKind, DeviceTree, Forwarder, Node, Sensor, Server};
