//! StatusController - connection lights, warning light and alert sound.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::DomainError;
use crate::ports::{EventBus, EventHandler, EventPublisher};

/// What the status bar shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub forwarder_online: bool,
    pub server_online: bool,
    /// Raised by any warning, lowered by `cancel_warning`.
    pub warning: bool,
    pub sound_alert: bool,
    /// Alerts sounded since start.
    pub alerts_sounded: u64,
}

impl Default for StatusView {
    fn default() -> Self {
        Self {
            forwarder_online: true,
            server_online: false,
            warning: false,
            sound_alert: false,
            alerts_sounded: 0,
        }
    }
}

pub struct StatusController {
    bus: Arc<dyn EventBus>,
    view: RwLock<StatusView>,
}

impl StatusController {
    pub const KINDS: [EventKind; 6] = [
        EventKind::ForwarderConnect,
        EventKind::ForwarderDisconnect,
        EventKind::ServerConnect,
        EventKind::ServerDisconnect,
        EventKind::ShowWarning,
        EventKind::CancelWarning,
    ];

    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self {
            bus,
            view: RwLock::new(StatusView::default()),
        }
    }

    pub async fn view(&self) -> StatusView {
        self.view.read().await.clone()
    }

    pub async fn set_sound_alert(&self, enabled: bool) {
        self.view.write().await.sound_alert = enabled;
    }

    /// Lowers the warning light everywhere.
    pub async fn cancel_warning(&self) -> Result<(), DomainError> {
        self.bus.publish(ConsoleEvent::CancelWarning).await
    }
}

#[async_trait]
impl EventHandler for StatusController {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        let mut view = self.view.write().await;
        match event {
            ConsoleEvent::ForwarderConnect => view.forwarder_online = true,
            ConsoleEvent::ForwarderDisconnect => view.forwarder_online = false,
            ConsoleEvent::ServerConnect => view.server_online = true,
            ConsoleEvent::ServerDisconnect => view.server_online = false,
            ConsoleEvent::ShowWarning { sensor, .. } => {
                view.warning = true;
                if view.sound_alert {
                    view.alerts_sounded += 1;
                    info!(sensor = %sensor, "sounding alert");
                }
            }
            ConsoleEvent::CancelWarning => view.warning = false,
            _ => {}
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "StatusController"
    }
}
