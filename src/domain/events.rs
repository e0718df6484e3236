//! Console events carried by the broadcast bus.
//!
//! Every event carries its own payload. Handlers never read shared state to
//! find out what an event meant.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::domain::device::DeviceKind;
use crate::domain::foundation::{NodeId, SensorPath, ServerId};
use crate::domain::tab::Tab;

/// Which device's configuration an editor should load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "device", rename_all = "UPPERCASE")]
pub enum ConfigTarget {
    Forwarder,
    Server { server_id: ServerId },
    Node { server_id: ServerId, node_id: NodeId },
}

impl ConfigTarget {
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            ConfigTarget::Forwarder => DeviceKind::Forwarder,
            ConfigTarget::Server { .. } => DeviceKind::Server,
            ConfigTarget::Node { .. } => DeviceKind::Node,
        }
    }
}

/// Routing key for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    JumpPage,
    ShowSubtree,
    ShowConfig,
    ShowChart,
    ShowWarning,
    RefreshTree,
    ForwarderConnect,
    ForwarderDisconnect,
    ServerConnect,
    ServerDisconnect,
    CancelWarning,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::JumpPage,
        EventKind::ShowSubtree,
        EventKind::ShowConfig,
        EventKind::ShowChart,
        EventKind::ShowWarning,
        EventKind::RefreshTree,
        EventKind::ForwarderConnect,
        EventKind::ForwarderDisconnect,
        EventKind::ServerConnect,
        EventKind::ServerDisconnect,
        EventKind::CancelWarning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JumpPage => "JUMP_PAGE",
            EventKind::ShowSubtree => "SHOW_SUBTREE",
            EventKind::ShowConfig => "SHOW_CONFIG",
            EventKind::ShowChart => "SHOW_CHART",
            EventKind::ShowWarning => "SHOW_WARNING",
            EventKind::RefreshTree => "REFRESH_TREE",
            EventKind::ForwarderConnect => "FORWARDER_CONNECT",
            EventKind::ForwarderDisconnect => "FORWARDER_DISCONNECT",
            EventKind::ServerConnect => "SERVER_CONNECT",
            EventKind::ServerDisconnect => "SERVER_DISCONNECT",
            EventKind::CancelWarning => "CANCEL_WARNING",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named event plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsoleEvent {
    /// Switch the visible tab.
    JumpPage { tab: Tab },
    /// Show one server's subtree in the detail panel.
    ShowSubtree { server_id: ServerId },
    /// Load a device configuration into its editor.
    ShowConfig(ConfigTarget),
    /// (Re)start the live chart for one sensor.
    ShowChart {
        sensor: SensorPath,
        #[serde(with = "duration_ms")]
        interval: Duration,
    },
    /// Highlight the device path a warning came from.
    ShowWarning { sensor: SensorPath, raw_value: f64 },
    RefreshTree,
    ForwarderConnect,
    ForwarderDisconnect,
    ServerConnect,
    ServerDisconnect,
    CancelWarning,
}

impl ConsoleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConsoleEvent::JumpPage { .. } => EventKind::JumpPage,
            ConsoleEvent::ShowSubtree { .. } => EventKind::ShowSubtree,
            ConsoleEvent::ShowConfig(_) => EventKind::ShowConfig,
            ConsoleEvent::ShowChart { .. } => EventKind::ShowChart,
            ConsoleEvent::ShowWarning { .. } => EventKind::ShowWarning,
            ConsoleEvent::RefreshTree => EventKind::RefreshTree,
            ConsoleEvent::ForwarderConnect => EventKind::ForwarderConnect,
            ConsoleEvent::ForwarderDisconnect => EventKind::ForwarderDisconnect,
            ConsoleEvent::ServerConnect => EventKind::ServerConnect,
            ConsoleEvent::ServerDisconnect => EventKind::ServerDisconnect,
            ConsoleEvent::CancelWarning => EventKind::CancelWarning,
        }
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
