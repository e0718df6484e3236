//! HTTP implementation of the `PinicApi` port.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpApiConfig::new("http://192.168.1.20:8080")
//!     .with_timeout(Duration::from_secs(5));
//!
//! let api = HttpPinicApi::new(config)?;
//! let servers = api.known_servers().await?;
//! ```
//!
//! Path segments (server, node and sensor ids) are percent-encoded, so ids
//! containing `/` or spaces reach the backend intact.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::device::{ForwarderConfig, KnownDevice, NodeConfig, SensorSample, ServerConfig};
use crate::domain::foundation::{NodeId, SensorPath, ServerId};
use crate::ports::{ApiError, PinicApi};

/// Configuration for the HTTP API adapter.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Forwarder base URL, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpApiConfig {
    /// Creates a configuration with a 10 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Forwarder REST client.
pub struct HttpPinicApi {
    config: HttpApiConfig,
    base: Url,
    client: Client,
}

impl HttpPinicApi {
    /// Creates a client for the given forwarder.
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::network(format!("invalid base url '{}': {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::network(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// Builds an endpoint URL from path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::network("base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else if e.is_connect() {
            ApiError::network(format!("Connection failed: {}", e))
        } else {
            ApiError::network(e.to_string())
        }
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    /// Turns a response into the expected document, keeping the raw body
    /// of error responses for display.
    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PinicApi for HttpPinicApi {
    async fn forwarder_config(&self) -> Result<ForwarderConfig, ApiError> {
        self.get(&["forwarder", "forwarderconfig"]).await
    }

    async fn set_forwarder_config(
        &self,
        config: &ForwarderConfig,
    ) -> Result<ForwarderConfig, ApiError> {
        self.post(&["forwarder", "forwarderconfig"], config).await
    }

    async fn known_servers(&self) -> Result<Vec<KnownDevice>, ApiError> {
        self.get(&["forwarder", "knownservers"]).await
    }

    async fn server_config(&self, server_id: &ServerId) -> Result<ServerConfig, ApiError> {
        self.get(&["server", "serverconfig", server_id.as_str()]).await
    }

    async fn set_server_config(
        &self,
        server_id: &ServerId,
        config: &ServerConfig,
    ) -> Result<ServerConfig, ApiError> {
        self.post(&["server", "serverconfig", server_id.as_str()], config)
            .await
    }

    async fn known_nodes(&self, server_id: &ServerId) -> Result<Vec<KnownDevice>, ApiError> {
        self.get(&["server", "knownnodes", server_id.as_str()]).await
    }

    async fn node_config(
        &self,
        server_id: &ServerId,
        node_id: &NodeId,
    ) -> Result<NodeConfig, ApiError> {
        self.get(&["server", "nodeconfig", server_id.as_str(), node_id.as_str()])
            .await
    }

    async fn set_node_config(
        &self,
        server_id: &ServerId,
        node_id: &NodeId,
        config: &NodeConfig,
    ) -> Result<NodeConfig, ApiError> {
        self.post(
            &["server", "nodeconfig", server_id.as_str(), node_id.as_str()],
            config,
        )
        .await
    }

    async fn sensor_data(&self, sensor: &SensorPath) -> Result<SensorSample, ApiError> {
        self.get(&[
            "server",
            "sensordata",
            sensor.server_id.as_str(),
            sensor.node_id.as_str(),
            sensor.sensor_id.as_str(),
        ])
        .await
    }
}
