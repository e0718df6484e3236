//! TabController - tracks which tab is visible.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::DomainError;
use crate::domain::tab::Tab;
use crate::ports::EventHandler;

/// Follows `JumpPage` events.
#[derive(Debug, Default)]
pub struct TabController {
    current: RwLock<Tab>,
}

impl TabController {
    pub const KINDS: [EventKind; 1] = [EventKind::JumpPage];

    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Tab {
        *self.current.read().await
    }
}

#[async_trait]
impl EventHandler for TabController {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        if let ConsoleEvent::JumpPage { tab } = event {
            debug!(tab = tab.number(), "switching tab");
            *self.current.write().await = tab;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TabController"
    }
}
