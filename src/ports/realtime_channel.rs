//! RealtimeChannel port - push notifications from the forwarder.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::domain::warning::WarningPayload;

/// Events delivered by the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// The channel (re)connected to the forwarder.
    Connected,
    /// The connection was lost.
    Disconnected,
    /// A sensor crossed a configured filter threshold.
    Warning(WarningPayload),
}

/// Port for the forwarder's push channel.
///
/// `run` keeps the connection alive (reconnecting as the adapter sees fit)
/// and forwards events into `events` until `shutdown` flips to true or the
/// receiver is dropped.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn run(
        &self,
        events: mpsc::Sender<RealtimeEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), RealtimeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    #[error("invalid channel url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("gave up after {attempts} reconnection attempts")]
    RetriesExhausted { attempts: u32 },
}
