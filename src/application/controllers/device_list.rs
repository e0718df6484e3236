//! DeviceListController - the detail panel for one server's subtree.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::conversion::ValueConverter;
use crate::domain::device::{DeviceTree, Server};
use crate::domain::events::{ConfigTarget, ConsoleEvent, EventKind};
use crate::domain::foundation::{DomainError, NodeId, SensorPath, ServerId};
use crate::domain::tab::Tab;
use crate::ports::{EventBus, EventHandler, EventPublisher};

/// Holds a snapshot of the shown server, taken from the shared tree on
/// `ShowSubtree`. Warning flags live on the snapshot and vanish with it.
pub struct DeviceListController {
    bus: Arc<dyn EventBus>,
    converter: Arc<ValueConverter>,
    tree: Arc<RwLock<DeviceTree>>,
    chart_interval: Duration,
    shown: RwLock<Option<Server>>,
}

impl DeviceListController {
    pub const KINDS: [EventKind; 2] = [EventKind::ShowSubtree, EventKind::ShowWarning];

    pub fn new(
        bus: Arc<dyn EventBus>,
        converter: Arc<ValueConverter>,
        tree: Arc<RwLock<DeviceTree>>,
        chart_interval: Duration,
    ) -> Self {
        Self {
            bus,
            converter,
            tree,
            chart_interval,
            shown: RwLock::new(None),
        }
    }

    pub async fn shown(&self) -> Option<Server> {
        self.shown.read().await.clone()
    }

    async fn load_subtree(&self, server_id: &ServerId) {
        let server = self.tree.read().await.forwarder.server(server_id).cloned();
        if server.is_none() {
            debug!(server = %server_id, "subtree requested for unknown server");
        }
        *self.shown.write().await = server;
    }

    async fn flag_warning(&self, sensor: &SensorPath, raw_value: f64) {
        let mut shown = self.shown.write().await;
        let Some(server) = shown.as_mut() else {
            return;
        };
        let sensor_type = server
            .node(&sensor.node_id)
            .and_then(|n| n.sensor(&sensor.sensor_id))
            .map(|s| s.sensor_type.clone())
            .unwrap_or_default();
        let display = self.converter.display(&sensor_type, raw_value);
        server.flag_warning(sensor, display);
    }

    pub async fn clear_server_warning(&self) {
        if let Some(server) = self.shown.write().await.as_mut() {
            server.warning = false;
        }
    }

    /// Clears one sensor's highlight.
    pub async fn clear_warning(&self, sensor: &SensorPath) {
        let mut shown = self.shown.write().await;
        if let Some(s) = shown
            .as_mut()
            .filter(|server| server.id == sensor.server_id)
            .and_then(|server| server.node_mut(&sensor.node_id))
            .and_then(|node| node.sensor_mut(&sensor.sensor_id))
        {
            s.warning = false;
        }
    }

    /// Clears a node's highlight and every sensor highlight below it.
    pub async fn clear_node_warnings(&self, node_id: &NodeId) {
        if let Some(node) = self
            .shown
            .write()
            .await
            .as_mut()
            .and_then(|server| server.node_mut(node_id))
        {
            node.clear_warnings();
        }
    }

    /// Switches to the chart tab and starts charting `sensor`.
    pub async fn open_sensor_chart(&self, sensor: SensorPath) -> Result<(), DomainError> {
        self.bus
            .publish_all(vec![
                ConsoleEvent::JumpPage { tab: Tab::Chart },
                ConsoleEvent::ShowChart {
                    sensor,
                    interval: self.chart_interval,
                },
            ])
            .await
    }

    pub async fn show_server_config(&self, server_id: ServerId) -> Result<(), DomainError> {
        self.bus
            .publish_all(vec![
                ConsoleEvent::ShowConfig(ConfigTarget::Server { server_id }),
                ConsoleEvent::JumpPage {
                    tab: Tab::ServerConfig,
                },
            ])
            .await
    }

    pub async fn show_node_config(
        &self,
        server_id: ServerId,
        node_id: NodeId,
    ) -> Result<(), DomainError> {
        self.bus
            .publish_all(vec![
                ConsoleEvent::ShowConfig(ConfigTarget::Node { server_id, node_id }),
                ConsoleEvent::JumpPage {
                    tab: Tab::NodeConfig,
                },
            ])
            .await
    }
}

#[async_trait]
impl EventHandler for DeviceListController {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        match event {
            ConsoleEvent::ShowSubtree { server_id } => self.load_subtree(&server_id).await,
            ConsoleEvent::ShowWarning { sensor, raw_value } => {
                self.flag_warning(&sensor, raw_value).await
            }
            _ => {}
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DeviceListController"
    }
}
