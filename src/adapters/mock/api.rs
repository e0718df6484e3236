//! Mock forwarder backend.
//!
//! Provides a scriptable in-process implementation of the `PinicApi` port,
//! so controllers and the device tree can be exercised without a forwarder.
//!
//! # Features
//!
//! - A device hierarchy built with builder methods
//! - Per-endpoint failure injection, switchable at runtime
//! - Simulated latency
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let api = MockPinicApi::new()
//!     .with_server(KnownDevice::new("S-1"))
//!     .with_node(&ServerId::new("S-1"), KnownDevice::new("N-1"), node_config)
//!     .failing(Endpoint::KnownNodes(ServerId::new("S-2")));
//!
//! let servers = api.known_servers().await?;
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::device::{
    ForwarderConfig, KnownDevice, NodeConfig, SensorEntry, SensorSample, ServerConfig,
};
use crate::domain::foundation::{NodeId, SensorPath, ServerId, Timestamp};
use crate::ports::{ApiError, PinicApi};

/// Identifies one endpoint call, for failure injection and call tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ForwarderConfig,
    SetForwarderConfig,
    KnownServers,
    ServerConfig(ServerId),
    SetServerConfig(ServerId),
    KnownNodes(ServerId),
    NodeConfig(ServerId, NodeId),
    SetNodeConfig(ServerId, NodeId),
    SensorData(SensorPath),
}

#[derive(Debug, Clone)]
struct MockServer {
    info: KnownDevice,
    config: ServerConfig,
    nodes: Vec<(KnownDevice, NodeConfig)>,
}

#[derive(Debug, Default)]
struct MockState {
    forwarder: ForwarderConfig,
    servers: Vec<MockServer>,
    samples: HashMap<SensorPath, SensorSample>,
    failing: HashSet<Endpoint>,
    calls: Vec<Endpoint>,
}

/// Mock forwarder for tests and offline demos.
#[derive(Debug, Clone, Default)]
pub struct MockPinicApi {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

impl MockPinicApi {
    /// Creates an empty backend: no servers, default forwarder config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the forwarder configuration.
    pub fn with_forwarder(self, config: ForwarderConfig) -> Self {
        self.lock().forwarder = config;
        self
    }

    /// Adds a server with a default configuration carrying its id.
    pub fn with_server(self, info: KnownDevice) -> Self {
        let config = ServerConfig {
            server_id: ServerId::new(info.id.clone()),
            server_desc: info.desc.clone(),
            server_port: info.port,
            ..ServerConfig::default()
        };
        self.lock().servers.push(MockServer {
            info,
            config,
            nodes: Vec::new(),
        });
        self
    }

    /// Adds a node under an existing server.
    ///
    /// Every sensor of `config` gets a zero sample of its own type unless
    /// one is set with `with_sample`.
    pub fn with_node(self, server_id: &ServerId, info: KnownDevice, config: NodeConfig) -> Self {
        {
            let mut state = self.lock();
            let node_id = NodeId::new(info.id.clone());
            for sensor in &config.sensors {
                let path = SensorPath {
                    server_id: server_id.clone(),
                    node_id: node_id.clone(),
                    sensor_id: sensor.sensor_id.clone(),
                };
                state
                    .samples
                    .entry(path)
                    .or_insert_with(|| zero_sample(sensor));
            }
            if let Some(server) = state.servers.iter_mut().find(|s| &s.info.id == server_id.as_str()) {
                server.nodes.push((info, config));
            }
        }
        self
    }

    /// Sets the sample returned for one sensor.
    pub fn with_sample(self, path: SensorPath, sample: SensorSample) -> Self {
        self.set_sample(path, sample);
        self
    }

    /// Makes one endpoint fail until `recover` is called.
    pub fn failing(self, endpoint: Endpoint) -> Self {
        self.set_failing(endpoint);
        self
    }

    /// Adds latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    // === Runtime controls ===

    pub fn set_sample(&self, path: SensorPath, sample: SensorSample) {
        self.lock().samples.insert(path, sample);
    }

    pub fn set_failing(&self, endpoint: Endpoint) {
        self.lock().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: &Endpoint) {
        self.lock().failing.remove(endpoint);
    }

    /// Removes a server and everything below it.
    pub fn remove_server(&self, server_id: &ServerId) {
        self.lock()
            .servers
            .retain(|s| s.info.id != server_id.as_str());
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: &Endpoint) -> usize {
        self.lock().calls.iter().filter(|c| *c == endpoint).count()
    }

    pub fn forwarder(&self) -> ForwarderConfig {
        self.lock().forwarder.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the call, waits out the delay and applies failure injection.
    async fn enter(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        let failing = {
            let mut state = self.lock();
            state.calls.push(endpoint.clone());
            state.failing.contains(&endpoint)
        };
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if failing {
            return Err(ApiError::status(503, format!("{:?} unavailable", endpoint)));
        }
        Ok(())
    }

    fn not_found(what: impl std::fmt::Display) -> ApiError {
        ApiError::status(404, format!("{} not found", what))
    }
}

fn zero_sample(sensor: &SensorEntry) -> SensorSample {
    SensorSample {
        timestamp: 0.0,
        raw_value: 0.0,
        sensor_type: sensor.sensor_type.clone(),
    }
}

#[async_trait]
impl PinicApi for MockPinicApi {
    async fn forwarder_config(&self) -> Result<ForwarderConfig, ApiError> {
        self.enter(Endpoint::ForwarderConfig).await?;
        Ok(self.lock().forwarder.clone())
    }

    async fn set_forwarder_config(
        &self,
        config: &ForwarderConfig,
    ) -> Result<ForwarderConfig, ApiError> {
        self.enter(Endpoint::SetForwarderConfig).await?;
        let mut state = self.lock();
        state.forwarder = config.clone();
        Ok(state.forwarder.clone())
    }

    async fn known_servers(&self) -> Result<Vec<KnownDevice>, ApiError> {
        self.enter(Endpoint::KnownServers).await?;
        Ok(self.lock().servers.iter().map(|s| s.info.clone()).collect())
    }

    async fn server_config(&self, server_id: &ServerId) -> Result<ServerConfig, ApiError> {
        self.enter(Endpoint::ServerConfig(server_id.clone())).await?;
        self.lock()
            .servers
            .iter()
            .find(|s| s.info.id == server_id.as_str())
            .map(|s| s.config.clone())
            .ok_or_else(|| Self::not_found(format!("server {}", server_id)))
    }

    async fn set_server_config(
        &self,
        server_id: &ServerId,
        config: &ServerConfig,
    ) -> Result<ServerConfig, ApiError> {
        self.enter(Endpoint::SetServerConfig(server_id.clone())).await?;
        let mut state = self.lock();
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.info.id == server_id.as_str())
            .ok_or_else(|| Self::not_found(format!("server {}", server_id)))?;
        server.config = config.clone();
        server.info.desc = config.server_desc.clone();
        Ok(server.config.clone())
    }

    async fn known_nodes(&self, server_id: &ServerId) -> Result<Vec<KnownDevice>, ApiError> {
        self.enter(Endpoint::KnownNodes(server_id.clone())).await?;
        self.lock()
            .servers
            .iter()
            .find(|s| s.info.id == server_id.as_str())
            .map(|s| s.nodes.iter().map(|(info, _)| info.clone()).collect())
            .ok_or_else(|| Self::not_found(format!("server {}", server_id)))
    }

    async fn node_config(
        &self,
        server_id: &ServerId,
        node_id: &NodeId,
    ) -> Result<NodeConfig, ApiError> {
        self.enter(Endpoint::NodeConfig(server_id.clone(), node_id.clone()))
            .await?;
        self.lock()
            .servers
            .iter()
            .find(|s| s.info.id == server_id.as_str())
            .and_then(|s| s.nodes.iter().find(|(info, _)| info.id == node_id.as_str()))
            .map(|(_, config)| config.clone())
            .ok_or_else(|| Self::not_found(format!("node {}/{}", server_id, node_id)))
    }

    async fn set_node_config(
        &self,
        server_id: &ServerId,
        node_id: &NodeId,
        config: &NodeConfig,
    ) -> Result<NodeConfig, ApiError> {
        self.enter(Endpoint::SetNodeConfig(server_id.clone(), node_id.clone()))
            .await?;
        let mut state = self.lock();
        let node = state
            .servers
            .iter_mut()
            .find(|s| s.info.id == server_id.as_str())
            .and_then(|s| s.nodes.iter_mut().find(|(info, _)| info.id == node_id.as_str()))
            .ok_or_else(|| Self::not_found(format!("node {}/{}", server_id, node_id)))?;
        node.1 = config.clone();
        Ok(node.1.clone())
    }

    async fn sensor_data(&self, sensor: &SensorPath) -> Result<SensorSample, ApiError> {
        self.enter(Endpoint::SensorData(sensor.clone())).await?;
        let mut sample = self
            .lock()
            .samples
            .get(sensor)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("sensor {}", sensor)))?;
        if sample.timestamp == 0.0 {
            sample.timestamp = Timestamp::now().as_unix_secs_f64();
        }
        Ok(sample)
    }
}
