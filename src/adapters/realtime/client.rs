//! Socket.IO client for the forwarder's warning namespace.
//!
//! Connects over a plain WebSocket transport (no long-polling), joins the
//! configured namespace and forwards `warning` events. Lost connections are
//! retried with exponential backoff until `max_attempts` consecutive
//! failures.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::codec::{decode_engine, decode_socket, encode_connect, encode_pong, EnginePacket, SocketPacket};
use crate::domain::warning::WarningPayload;
use crate::ports::{RealtimeChannel, RealtimeError, RealtimeEvent};

/// Maximum consecutive failed connection attempts before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Base delay between reconnection attempts (exponential backoff).
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Maximum delay between reconnection attempts.
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

const WARNING_EVENT: &str = "warning";

#[derive(Debug, Clone)]
pub struct SocketIoConfig {
    /// Forwarder base URL; `http(s)` is mapped to `ws(s)`.
    pub base_url: String,
    /// Namespace to join, e.g. `/warning`.
    pub namespace: String,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl SocketIoConfig {
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            namespace: namespace.into(),
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            base_delay: RECONNECT_BASE_DELAY,
            max_delay: MAX_RECONNECT_DELAY,
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Delay before reconnection attempt number `attempts`.
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        std::cmp::min(
            self.base_delay.saturating_mul(1 << attempts.min(6)),
            self.max_delay,
        )
    }
}

/// Builds the Engine.IO v4 WebSocket endpoint for a forwarder base URL.
pub fn socket_url(base_url: &str) -> Result<Url, RealtimeError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| RealtimeError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(RealtimeError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| RealtimeError::InvalidUrl(format!("cannot use scheme {}", scheme)))?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Ok(url)
}

/// How one connection ended.
#[derive(Debug)]
enum SessionEnd {
    /// The connection dropped or never came up.
    Lost { joined: bool, reason: String },
    /// Nobody is listening any more.
    ReceiverGone,
}

/// `RealtimeChannel` backed by Socket.IO over WebSocket.
pub struct SocketIoChannel {
    config: SocketIoConfig,
    url: Url,
}

impl SocketIoChannel {
    pub fn new(config: SocketIoConfig) -> Result<Self, RealtimeError> {
        if !config.namespace.starts_with('/') {
            return Err(RealtimeError::InvalidUrl(format!(
                "namespace '{}' must start with '/'",
                config.namespace
            )));
        }
        let url = socket_url(&config.base_url)?;
        Ok(Self { config, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Runs one connection until it drops.
    async fn run_session(&self, events: &mpsc::Sender<RealtimeEvent>) -> SessionEnd {
        let lost = |joined: bool, reason: String| SessionEnd::Lost { joined, reason };

        let (stream, _) = match connect_async(self.url.as_str()).await {
            Ok(connected) => connected,
            Err(e) => return lost(false, e.to_string()),
        };
        debug!(url = %self.url, "websocket open");

        let (mut write, mut read) = stream.split();
        let mut joined = false;

        while let Some(message) = read.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => return lost(joined, "closed by server".to_string()),
                Ok(_) => continue,
                Err(e) => return lost(joined, e.to_string()),
            };

            let packet = match decode_engine(&text) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!(error = %e, "dropping malformed frame");
                    continue;
                }
            };

            let reply = match packet {
                EnginePacket::Open(_) => Some(encode_connect(&self.config.namespace)),
                EnginePacket::Ping(payload) => Some(encode_pong(&payload)),
                EnginePacket::Close => return lost(joined, "engine closed".to_string()),
                EnginePacket::Message(payload) => {
                    match self.handle_packet(&payload, events, &mut joined).await {
                        Ok(()) => None,
                        Err(end) => return end,
                    }
                }
                EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => None,
            };

            if let Some(frame) = reply {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    return lost(joined, e.to_string());
                }
            }
        }

        lost(joined, "stream ended".to_string())
    }

    async fn handle_packet(
        &self,
        payload: &str,
        events: &mpsc::Sender<RealtimeEvent>,
        joined: &mut bool,
    ) -> Result<(), SessionEnd> {
        let packet = match decode_socket(payload) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "dropping malformed packet");
                return Ok(());
            }
        };

        if packet.namespace() != self.config.namespace {
            debug!(namespace = packet.namespace(), "ignoring packet for other namespace");
            return Ok(());
        }

        let forward = match packet {
            SocketPacket::Connect { .. } => {
                info!(namespace = %self.config.namespace, "joined namespace");
                *joined = true;
                Some(RealtimeEvent::Connected)
            }
            SocketPacket::Disconnect { .. } => {
                return Err(SessionEnd::Lost {
                    joined: *joined,
                    reason: "namespace disconnected by server".to_string(),
                })
            }
            SocketPacket::ConnectError { data, .. } => {
                return Err(SessionEnd::Lost {
                    joined: *joined,
                    reason: format!(
                        "namespace refused: {}",
                        data.map(|d| d.to_string()).unwrap_or_default()
                    ),
                })
            }
            SocketPacket::Event { name, args, .. } if name == WARNING_EVENT => {
                match args.first().map(WarningPayload::from_event_data) {
                    Some(Ok(warning)) => Some(RealtimeEvent::Warning(warning)),
                    Some(Err(e)) => {
                        warn!(error = %e, "dropping undecodable warning");
                        None
                    }
                    None => {
                        warn!("warning event without data");
                        None
                    }
                }
            }
            other => {
                debug!(packet = ?other, "ignoring packet");
                None
            }
        };

        if let Some(event) = forward {
            if events.send(event).await.is_err() {
                return Err(SessionEnd::ReceiverGone);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RealtimeChannel for SocketIoChannel {
    async fn run(
        &self,
        events: mpsc::Sender<RealtimeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), RealtimeError> {
        let mut attempts = 0u32;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            let end = tokio::select! {
                end = self.run_session(&events) => end,
                _ = shutdown.changed() => return Ok(()),
            };

            let (joined, reason) = match end {
                SessionEnd::ReceiverGone => return Ok(()),
                SessionEnd::Lost { joined, reason } => (joined, reason),
            };

            if joined {
                attempts = 0;
                if events.send(RealtimeEvent::Disconnected).await.is_err() {
                    return Ok(());
                }
            }

            attempts += 1;
            if attempts >= self.config.max_attempts {
                warn!(attempts, reason = %reason, "giving up on realtime channel");
                return Err(RealtimeError::RetriesExhausted { attempts });
            }

            let delay = self.config.backoff_delay(attempts);
            warn!(attempts, reason = %reason, delay_ms = delay.as_millis() as u64, "realtime channel lost, retrying");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_maps_http_schemes() {
        assert_eq!(
            socket_url("http://127.0.0.1:8080").unwrap().as_str(),
            "ws://127.0.0.1:8080/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("https://pinic.example/some/path?x=1").unwrap().as_str(),
            "wss://pinic.example/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn socket_url_rejects_other_schemes() {
        assert!(matches!(
            socket_url("ftp://host"),
            Err(RealtimeError::InvalidUrl(_))
        ));
        assert!(socket_url("not a url").is_err());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let config = SocketIoConfig::new("http://h", "/warning");
        assert_eq!(config.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(8));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(32));
        assert_eq!(config.backoff_delay(5), Duration::from_secs(60));
        assert_eq!(config.backoff_delay(30), Duration::from_secs(60));
    }

    #[test]
    fn channel_requires_absolute_namespace() {
        assert!(SocketIoChannel::new(SocketIoConfig::new("http://h", "warning")).is_err());
        let channel = SocketIoChannel::new(SocketIoConfig::new("http://h:1", "/warning")).unwrap();
        assert_eq!(channel.url().scheme(), "ws");
    }

    #[tokio::test]
    async fn unreachable_forwarder_exhausts_retries() {
        // Port 1 on localhost refuses connections immediately.
        let config = SocketIoConfig::new("http://127.0.0.1:1", "/warning").with_retry(
            3,
            Duration::from_millis(1),
            Duration::from_millis(5),
        );
        let channel = SocketIoChannel::new(config).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = channel.run(tx, shutdown_rx).await;

        assert_eq!(result, Err(RealtimeError::RetriesExhausted { attempts: 3 }));
        // Never joined, so no Disconnected is reported.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_stops_retry_loop() {
        let config = SocketIoConfig::new("http://127.0.0.1:1", "/warning").with_retry(
            100,
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        let channel = SocketIoChannel::new(config).unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { channel.run(tx, shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Ok(()));
    }
}
