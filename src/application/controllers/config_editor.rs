//! Config editors for the forwarder, server and node configuration tabs.
//!
//! One generic editor is instantiated per document type. It loads the
//! device's current document on `ShowConfig`, keeps a draft the user edits,
//! and posts the draft on `send`. Either outcome asks the tree to refresh.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::device::{FilterEntry, ForwarderConfig, NodeConfig, SensorEntry, ServerConfig};
use crate::domain::events::{ConfigTarget, ConsoleEvent, EventKind};
use crate::domain::foundation::{DomainError, NodeId, ServerId};
use crate::ports::{ApiError, EventBus, EventHandler, EventPublisher, PinicApi};

/// A configuration document with its own fetch and store endpoints.
#[async_trait]
pub trait ConfigDocument: Clone + Serialize + Send + Sync + 'static {
    /// Identifies which device's document this is.
    type Address: Clone + fmt::Debug + Send + Sync + 'static;

    /// Handler name of the editor for this document.
    const EDITOR: &'static str;

    /// Address named by `target`, if it targets this document type.
    fn address(target: &ConfigTarget) -> Option<Self::Address>;

    async fn fetch(api: &dyn PinicApi, address: &Self::Address) -> Result<Self, ApiError>;

    /// Posts `self` and returns the document the backend now reports.
    async fn store(&self, api: &dyn PinicApi, address: &Self::Address) -> Result<Self, ApiError>;
}

#[async_trait]
impl ConfigDocument for ForwarderConfig {
    type Address = ();

    const EDITOR: &'static str = "ForwarderConfigEditor";

    fn address(target: &ConfigTarget) -> Option<()> {
        matches!(target, ConfigTarget::Forwarder).then_some(())
    }

    async fn fetch(api: &dyn PinicApi, _address: &()) -> Result<Self, ApiError> {
        api.forwarder_config().await
    }

    async fn store(&self, api: &dyn PinicApi, _address: &()) -> Result<Self, ApiError> {
        api.set_forwarder_config(self).await
    }
}

#[async_trait]
impl ConfigDocument for ServerConfig {
    type Address = ServerId;

    const EDITOR: &'static str = "ServerConfigEditor";

    fn address(target: &ConfigTarget) -> Option<ServerId> {
        match target {
            ConfigTarget::Server { server_id } => Some(server_id.clone()),
            _ => None,
        }
    }

    async fn fetch(api: &dyn PinicApi, server_id: &ServerId) -> Result<Self, ApiError> {
        api.server_config(server_id).await
    }

    async fn store(&self, api: &dyn PinicApi, server_id: &ServerId) -> Result<Self, ApiError> {
        api.set_server_config(server_id, self).await
    }
}

#[async_trait]
impl ConfigDocument for NodeConfig {
    type Address = (ServerId, NodeId);

    const EDITOR: &'static str = "NodeConfigEditor";

    fn address(target: &ConfigTarget) -> Option<(ServerId, NodeId)> {
        match target {
            ConfigTarget::Node { server_id, node_id } => {
                Some((server_id.clone(), node_id.clone()))
            }
            _ => None,
        }
    }

    async fn fetch(api: &dyn PinicApi, address: &(ServerId, NodeId)) -> Result<Self, ApiError> {
        let (server_id, node_id) = address;
        api.node_config(server_id, node_id).await
    }

    async fn store(
        &self,
        api: &dyn PinicApi,
        address: &(ServerId, NodeId),
    ) -> Result<Self, ApiError> {
        let (server_id, node_id) = address;
        api.set_node_config(server_id, node_id, self).await
    }
}

/// Result of the last load or send, shown under the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Pretty-printed document the backend answered with.
    Success(String),
    Failed(String),
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SendOutcome::Success(_))
    }
}

struct EditorState<D: ConfigDocument> {
    address: Option<D::Address>,
    current: Option<D>,
    draft: Option<D>,
    outcome: Option<SendOutcome>,
}

impl<D: ConfigDocument> Default for EditorState<D> {
    fn default() -> Self {
        Self {
            address: None,
            current: None,
            draft: None,
            outcome: None,
        }
    }
}

pub struct ConfigEditor<D: ConfigDocument> {
    api: Arc<dyn PinicApi>,
    bus: Arc<dyn EventBus>,
    state: RwLock<EditorState<D>>,
}

pub type ForwarderConfigEditor = ConfigEditor<ForwarderConfig>;
pub type ServerConfigEditor = ConfigEditor<ServerConfig>;
pub type NodeConfigEditor = ConfigEditor<NodeConfig>;

impl<D: ConfigDocument> ConfigEditor<D> {
    pub const KINDS: [EventKind; 1] = [EventKind::ShowConfig];

    pub fn new(api: Arc<dyn PinicApi>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            api,
            bus,
            state: RwLock::new(EditorState::default()),
        }
    }

    /// Fetches the document at `address` into both `current` and `draft`.
    pub async fn load(&self, address: D::Address) {
        let fetched = D::fetch(self.api.as_ref(), &address).await;

        let mut state = self.state.write().await;
        state.address = Some(address);
        match fetched {
            Ok(doc) => {
                state.draft = Some(doc.clone());
                state.current = Some(doc);
                state.outcome = None;
            }
            Err(e) => {
                warn!(editor = D::EDITOR, address = ?state.address, error = %e, "loading config failed");
                state.current = None;
                state.draft = None;
                state.outcome = Some(SendOutcome::Failed(e.to_string()));
            }
        }
    }

    pub async fn address(&self) -> Option<D::Address> {
        self.state.read().await.address.clone()
    }

    pub async fn current(&self) -> Option<D> {
        self.state.read().await.current.clone()
    }

    pub async fn draft(&self) -> Option<D> {
        self.state.read().await.draft.clone()
    }

    pub async fn outcome(&self) -> Option<SendOutcome> {
        self.state.read().await.outcome.clone()
    }

    /// Edits the draft in place. Returns false when nothing is loaded.
    pub async fn update_draft(&self, edit: impl FnOnce(&mut D) + Send) -> bool {
        match self.state.write().await.draft.as_mut() {
            Some(draft) => {
                edit(draft);
                true
            }
            None => false,
        }
    }

    /// Throws away draft edits.
    pub async fn reset_draft(&self) {
        let mut state = self.state.write().await;
        state.draft = state.current.clone();
    }

    /// Posts the draft, records the outcome and asks for a tree refresh.
    pub async fn send(&self) -> Result<SendOutcome, DomainError> {
        let pending = {
            let state = self.state.read().await;
            state.address.clone().zip(state.draft.clone())
        };
        let Some((address, draft)) = pending else {
            let outcome = SendOutcome::Failed("no configuration loaded".to_string());
            self.state.write().await.outcome = Some(outcome.clone());
            return Ok(outcome);
        };

        let outcome = match draft.store(self.api.as_ref(), &address).await {
            Ok(stored) => {
                info!(editor = D::EDITOR, address = ?address, "config saved");
                let message = serde_json::to_string_pretty(&stored).unwrap_or_default();
                let mut state = self.state.write().await;
                state.draft = Some(stored.clone());
                state.current = Some(stored);
                SendOutcome::Success(message)
            }
            Err(e) => {
                warn!(editor = D::EDITOR, address = ?address, error = %e, "saving config failed");
                SendOutcome::Failed(e.to_string())
            }
        };
        self.state.write().await.outcome = Some(outcome.clone());

        self.bus.publish(ConsoleEvent::RefreshTree).await?;
        Ok(outcome)
    }
}

impl ConfigEditor<NodeConfig> {
    pub async fn add_sensor_row(&self) -> bool {
        self.update_draft(|draft| draft.sensors.push(SensorEntry::default()))
            .await
    }

    pub async fn add_filter_row(&self) -> bool {
        self.update_draft(|draft| draft.filters.push(FilterEntry::default()))
            .await
    }

    /// Removes the sensor row at `index`; false if there is none.
    pub async fn remove_sensor_row(&self, index: usize) -> bool {
        let mut removed = false;
        self.update_draft(|draft| {
            if index < draft.sensors.len() {
                draft.sensors.remove(index);
                removed = true;
            }
        })
        .await;
        removed
    }

    /// Removes the filter row at `index`; false if there is none.
    pub async fn remove_filter_row(&self, index: usize) -> bool {
        let mut removed = false;
        self.update_draft(|draft| {
            if index < draft.filters.len() {
                draft.filters.remove(index);
                removed = true;
            }
        })
        .await;
        removed
    }
}

#[async_trait]
impl<D: ConfigDocument> EventHandler for ConfigEditor<D> {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        if let ConsoleEvent::ShowConfig(target) = event {
            if let Some(address) = D::address(&target) {
                self.load(address).await;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        D::EDITOR
    }
}
