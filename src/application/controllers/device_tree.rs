//! DeviceTreeController - owns the shared tree and keeps it fresh.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::application::tree_service::{DeviceTreeService, RefreshSummary};
use crate::domain::device::DeviceTree;
use crate::domain::events::{ConfigTarget, ConsoleEvent, EventKind};
use crate::domain::foundation::{DomainError, ErrorCode, ServerId};
use crate::domain::tab::Tab;
use crate::ports::{EventBus, EventHandler, EventPublisher};

pub struct DeviceTreeController {
    service: DeviceTreeService,
    bus: Arc<dyn EventBus>,
    tree: Arc<RwLock<DeviceTree>>,
    last_shown: RwLock<Option<ServerId>>,
    refresh_every: Duration,
}

impl DeviceTreeController {
    pub const KINDS: [EventKind; 1] = [EventKind::RefreshTree];

    pub fn new(
        service: DeviceTreeService,
        bus: Arc<dyn EventBus>,
        tree: Arc<RwLock<DeviceTree>>,
        refresh_every: Duration,
    ) -> Self {
        Self {
            service,
            bus,
            tree,
            last_shown: RwLock::new(None),
            refresh_every,
        }
    }

    pub fn tree(&self) -> Arc<RwLock<DeviceTree>> {
        Arc::clone(&self.tree)
    }

    pub async fn refresh(&self) -> RefreshSummary {
        self.service.refresh_all(&self.tree).await
    }

    pub async fn last_shown(&self) -> Option<ServerId> {
        self.last_shown.read().await.clone()
    }

    /// Shows one server's subtree in the detail panel.
    pub async fn show_server(&self, server_id: ServerId) -> Result<(), DomainError> {
        if self.tree.read().await.forwarder.server(&server_id).is_none() {
            return Err(DomainError::new(
                ErrorCode::DeviceNotFound,
                format!("server {} is not in the tree", server_id),
            ));
        }
        *self.last_shown.write().await = Some(server_id.clone());
        self.bus.publish(ConsoleEvent::ShowSubtree { server_id }).await
    }

    /// Announces the last shown server again, if it still exists.
    pub async fn reannounce(&self) -> Result<(), DomainError> {
        let Some(server_id) = self.last_shown().await else {
            return Ok(());
        };
        if self.tree.read().await.forwarder.server(&server_id).is_none() {
            debug!(server = %server_id, "last shown server is gone");
            return Ok(());
        }
        self.bus.publish(ConsoleEvent::ShowSubtree { server_id }).await
    }

    pub async fn show_forwarder_config(&self) -> Result<(), DomainError> {
        self.bus
            .publish_all(vec![
                ConsoleEvent::ShowConfig(ConfigTarget::Forwarder),
                ConsoleEvent::JumpPage {
                    tab: Tab::ForwarderConfig,
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

    /// Refreshes once, then on every period until `shutdown` flips.
    ///
    /// Each periodic tick re-announces the last shown server before
    /// refreshing.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        self.refresh().await;

        let mut interval = time::interval(self.refresh_every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("device tree refresh stopped");
                        return;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.reannounce().await {
                        debug!(error = %e, "re-announcing server failed");
                    }
                    self.refresh().await;
                }
            }
        }
    }
}

#[async_trait]
impl EventHandler for DeviceTreeController {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        if let ConsoleEvent::RefreshTree = event {
            self.refresh().await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DeviceTreeController"
    }
}
