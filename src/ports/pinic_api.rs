//! PinicApi port - the forwarder's REST surface.
//!
//! Every device configuration and every sensor sample the console shows
//! comes through this trait. The HTTP adapter maps each method onto one
//! endpoint; tests substitute an in-process mock.
//!
//! | Method | Endpoint |
//! |--------|----------|
//! | `forwarder_config` | `GET /forwarder/forwarderconfig` |
//! | `set_forwarder_config` | `POST /forwarder/forwarderconfig` |
//! | `known_servers` | `GET /forwarder/knownservers` |
//! | `server_config` | `GET /server/serverconfig/{serverId}` |
//! | `set_server_config` | `POST /server/serverconfig/{serverId}` |
//! | `known_nodes` | `GET /server/knownnodes/{serverId}` |
//! | `node_config` | `GET /server/nodeconfig/{serverId}/{nodeId}` |
//! | `set_node_config` | `POST /server/nodeconfig/{serverId}/{nodeId}` |
//! | `sensor_data` | `GET /server/sensordata/{serverId}/{nodeId}/{sensorId}` |

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::device::{ForwarderConfig, KnownDevice, NodeConfig, SensorSample, ServerConfig};
use crate::domain::foundation::{NodeId, SensorPath, ServerId};

/// Port for talking to the forwarder backend.
///
/// Calls are independent; callers may issue any number concurrently.
#[async_trait]
pub trait PinicApi: Send + Sync {
    async fn forwarder_config(&self) -> Result<ForwarderConfig, ApiError>;

    /// Replaces the forwarder configuration and returns what the forwarder
    /// now reports.
    async fn set_forwarder_config(&self, config: &ForwarderConfig)
        -> Result<ForwarderConfig, ApiError>;

    async fn known_servers(&self) -> Result<Vec<KnownDevice>, ApiError>;

    async fn server_config(&self, server_id: &ServerId) -> Result<ServerConfig, ApiError>;

    async fn set_server_config(
        &self,
        server_id: &ServerId,
        config: &ServerConfig,
    ) -> Result<ServerConfig, ApiError>;

    async fn known_nodes(&self, server_id: &ServerId) -> Result<Vec<KnownDevice>, ApiError>;

    /// Node configuration, including its embedded sensor list.
    async fn node_config(
        &self,
        server_id: &ServerId,
        node_id: &NodeId,
    ) -> Result<NodeConfig, ApiError>;

    async fn set_node_config(
        &self,
        server_id: &ServerId,
        node_id: &NodeId,
        config: &NodeConfig,
    ) -> Result<NodeConfig, ApiError>;

    /// Latest sample of one sensor.
    async fn sensor_data(&self, sensor: &SensorPath) -> Result<SensorSample, ApiError>;
}

/// Errors from the forwarder API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Could not reach the forwarder.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The forwarder answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        /// Raw response body, shown to the user as-is.
        body: String,
    },

    /// The response body did not match the expected document.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network(message.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            body: body.into(),
        }
    }

    /// True for failures where the device itself is likely unreachable.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn PinicApi) {}

    #[test]
    fn status_error_shows_raw_body() {
        let err = ApiError::status(502, "server S-1 unreachable");
        assert_eq!(err.to_string(), "HTTP 502: server S-1 unreachable");
        assert!(!err.is_unreachable());
    }

    #[test]
    fn timeout_counts_as_unreachable() {
        assert!(ApiError::Timeout { timeout_secs: 10 }.is_unreachable());
        assert!(ApiError::network("refused").is_unreachable());
    }
}
