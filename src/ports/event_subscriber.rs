//! EventSubscriber port - Interface for subscribing to console events.
//!
//! Handlers register interest in an event kind and stay registered until
//! their owning controller unsubscribes.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::DomainError;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handler for processing console events.
///
/// Implementations should be:
/// - **Quick** - publish awaits every handler in turn
/// - **Isolated** - errors don't affect other handlers
///
/// # Example
///
/// ```ignore
/// struct StatusBar { /* ... */ }
///
/// #[async_trait]
/// impl EventHandler for StatusBar {
///     async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
///         if let ConsoleEvent::ServerDisconnect = event { /* ... */ }
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "StatusBar"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for subscribing to console events.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to one event kind.
    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionId;

    /// Subscribe the same handler to several kinds under one id.
    fn subscribe_all(&self, kinds: &[EventKind], handler: Arc<dyn EventHandler>)
        -> SubscriptionId;

    /// Removes every registration made under `id`.
    ///
    /// Returns false if the id was unknown (already removed).
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Combined trait for event bus implementations.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

// Blanket implementation - any type that implements both traits is an EventBus
impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
