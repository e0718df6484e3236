//! Strongly-typed device identifiers.
//!
//! Device identity across tree refreshes is by id string, never by
//! object reference, so these are cheap string newtypes compared by value.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! device_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the backend has not reported an id yet.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

device_id!(
    /// Identifier of the forwarder (tree root).
    ForwarderId
);
device_id!(
    /// Identifier of a server known to the forwarder.
    ServerId
);
device_id!(
    /// Identifier of a node attached to a server.
    NodeId
);
device_id!(
    /// Identifier of a sensor on a node.
    SensorId
);

/// Full coordinates of one sensor in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorPath {
    pub server_id: ServerId,
    pub node_id: NodeId,
    pub sensor_id: SensorId,
}

impl SensorPath {
    pub fn new(
        server_id: impl Into<ServerId>,
        node_id: impl Into<NodeId>,
        sensor_id: impl Into<SensorId>,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            node_id: node_id.into(),
            sensor_id: sensor_id.into(),
        }
    }
}

impl fmt::Display for SensorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.server_id, self.node_id, self.sensor_id)
    }
}
