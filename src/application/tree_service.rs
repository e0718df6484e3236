//! DeviceTreeService - rebuilds the forwarder → server → node → sensor tree.
//!
//! Every refresh starts from an empty root and cascades API calls down the
//! hierarchy. Siblings are fetched concurrently. A failing branch is left
//! empty (or carries an error string) without aborting its siblings, and
//! nothing is retried.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::conversion::ValueConverter;
use crate::domain::device::{
    location_tree, DeviceTree, Forwarder, KnownDevice, Node, Sensor, Server,
};
use crate::domain::events::ConsoleEvent;
use crate::domain::foundation::{SensorPath, ServerId};
use crate::ports::{EventBus, EventPublisher, PinicApi};

/// Counts gathered while building one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub servers: usize,
    pub nodes: usize,
    pub sensors: usize,
    pub sensor_errors: usize,
    /// Set when the forwarder configuration itself could not be fetched.
    pub forwarder_error: Option<String>,
}

impl RefreshSummary {
    fn from_forwarder(forwarder: &Forwarder) -> Self {
        let nodes = forwarder.servers.iter().flat_map(|s| &s.nodes);
        let sensors: Vec<&Sensor> = nodes.clone().flat_map(|n| &n.sensors).collect();
        Self {
            servers: forwarder.servers.len(),
            nodes: nodes.count(),
            sensors: sensors.len(),
            sensor_errors: sensors.iter().filter(|s| s.value.starts_with("Error:")).count(),
            forwarder_error: forwarder.error.clone(),
        }
    }
}

/// Builds device trees from the backend.
pub struct DeviceTreeService {
    api: Arc<dyn PinicApi>,
    bus: Arc<dyn EventBus>,
    converter: Arc<ValueConverter>,
}

impl DeviceTreeService {
    pub fn new(
        api: Arc<dyn PinicApi>,
        bus: Arc<dyn EventBus>,
        converter: Arc<ValueConverter>,
    ) -> Self {
        Self {
            api,
            bus,
            converter,
        }
    }

    /// Rebuilds the tree and swaps it into `target` in a single write.
    ///
    /// Readers of `target` see either the previous tree or the complete new
    /// one, never a partially populated root.
    pub async fn refresh_all(&self, target: &RwLock<DeviceTree>) -> RefreshSummary {
        let forwarder = self.build_forwarder().await;
        let summary = RefreshSummary::from_forwarder(&forwarder);

        target.write().await.forwarder = forwarder;

        info!(
            servers = summary.servers,
            nodes = summary.nodes,
            sensors = summary.sensors,
            sensor_errors = summary.sensor_errors,
            "device tree refreshed"
        );
        summary
    }

    /// Builds a fresh root without touching any shared state.
    pub async fn build_forwarder(&self) -> Forwarder {
        let config = match self.api.forwarder_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "forwarder unreachable");
                return Forwarder {
                    error: Some(e.to_string()),
                    ..Forwarder::default()
                };
            }
        };

        let known = match self.api.known_servers().await {
            Ok(known) => known,
            Err(e) => {
                warn!(error = %e, "failed to list servers");
                return Forwarder {
                    config,
                    error: Some(e.to_string()),
                    ..Forwarder::default()
                };
            }
        };

        let servers = join_all(known.into_iter().map(|info| self.load_server(info))).await;
        let locations = location_tree(&servers);

        Forwarder {
            config,
            servers,
            locations,
            error: None,
        }
    }

    async fn load_server(&self, info: KnownDevice) -> Server {
        let mut server = Server::from_known(info);
        let id = server.id.clone();

        let (config, known_nodes) =
            tokio::join!(self.api.server_config(&id), self.api.known_nodes(&id));

        match config {
            Ok(config) => server.config = Some(config),
            Err(e) => warn!(server = %id, error = %e, "failed to fetch server config"),
        }

        match known_nodes {
            Ok(known) => {
                self.announce(ConsoleEvent::ServerConnect).await;
                server.nodes = join_all(known.into_iter().map(|info| self.load_node(&id, info))).await;
            }
            Err(e) => {
                warn!(server = %id, error = %e, "failed to list nodes");
                self.announce(ConsoleEvent::ServerDisconnect).await;
            }
        }

        server
    }

    async fn load_node(&self, server_id: &ServerId, info: KnownDevice) -> Node {
        let mut node = Node::from_known(info);

        let config = match self.api.node_config(server_id, &node.id).await {
            Ok(config) => config,
            Err(e) => {
                warn!(server = %server_id, node = %node.id, error = %e, "failed to fetch node config");
                return node;
            }
        };

        let sensors = config.sensors.iter().map(|entry| {
            let mut sensor = Sensor::new(entry.sensor_id.clone(), entry.sensor_type.clone());
            sensor.desc = entry.sensor_desc.clone();
            let path = SensorPath {
                server_id: server_id.clone(),
                node_id: node.id.clone(),
                sensor_id: entry.sensor_id.clone(),
            };
            self.load_sensor(path, sensor)
        });
        node.sensors = join_all(sensors).await;
        node.config = Some(config);
        node
    }

    async fn load_sensor(&self, path: SensorPath, mut sensor: Sensor) -> Sensor {
        sensor.value = match self.api.sensor_data(&path).await {
            Ok(sample) => self.converter.display(&sample.sensor_type, sample.raw_value),
            Err(e) => {
                debug!(sensor = %path, error = %e, "sensor sample unavailable");
                format!("Error: {}", e)
            }
        };
        sensor
    }

    async fn announce(&self, event: ConsoleEvent) {
        if let Err(e) = self.bus.publish(event).await {
            warn!(error = %e, "status handler failed");
        }
    }
}
