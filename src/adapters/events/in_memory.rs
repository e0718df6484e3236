//! In-process event bus.
//!
//! Delivery is synchronous with respect to `publish`: every handler
//! subscribed to the event's kind is awaited, in subscription order, before
//! `publish` returns. There is no buffering, so an event published before a
//! handler subscribes never reaches it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber, SubscriptionId};

struct Registration {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

/// In-memory event bus shared by every controller of one console.
///
/// Features:
/// - Ordered, synchronous delivery
/// - Unsubscribe by id when a controller goes away
/// - Last event per kind, for inspection
/// - Optional capture of every published event, for test assertions
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::recording());
/// bus.subscribe(EventKind::RefreshTree, tree_controller);
/// bus.publish(ConsoleEvent::RefreshTree).await?;
/// assert!(bus.has_event(EventKind::RefreshTree));
/// ```
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Registration>>>,
    last_events: RwLock<HashMap<EventKind, ConsoleEvent>>,
    recorded: Option<Mutex<Vec<ConsoleEvent>>>,
    next_id: AtomicU64,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            last_events: RwLock::new(HashMap::new()),
            recorded: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a bus that also keeps every published event.
    pub fn recording() -> Self {
        Self {
            recorded: Some(Mutex::new(Vec::new())),
            ..Self::new()
        }
    }

    /// Number of live registrations for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        read(&self.handlers).get(&kind).map_or(0, Vec::len)
    }

    // === Test Helpers ===

    /// Returns all published events (empty unless built with `recording`).
    pub fn published_events(&self) -> Vec<ConsoleEvent> {
        match &self.recorded {
            Some(recorded) => recorded
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            None => Vec::new(),
        }
    }

    /// Returns recorded events of a specific kind.
    pub fn events_of_kind(&self, kind: EventKind) -> Vec<ConsoleEvent> {
        self.published_events()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    /// Checks if an event of `kind` was recorded.
    pub fn has_event(&self, kind: EventKind) -> bool {
        self.published_events().iter().any(|e| e.kind() == kind)
    }

    /// Clears recorded events (for test isolation).
    pub fn clear(&self) {
        if let Some(recorded) = &self.recorded {
            recorded.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

// A panicking handler must not wedge the whole console, so poisoned locks
// are recovered rather than propagated.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        let kind = event.kind();

        write(&self.last_events).insert(kind, event.clone());
        if let Some(recorded) = &self.recorded {
            recorded
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event.clone());
        }

        // Snapshot handlers so none of our locks are held across awaits;
        // handlers are free to publish or (un)subscribe.
        let handlers: Vec<Arc<dyn EventHandler>> = read(&self.handlers)
            .get(&kind)
            .map(|regs| regs.iter().map(|r| Arc::clone(&r.handler)).collect())
            .unwrap_or_default();

        debug!(event = %kind, handlers = handlers.len(), "publishing");

        let mut errors = Vec::new();
        for handler in handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                warn!(event = %kind, handler = handler.name(), error = %e, "handler failed");
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::HandlerFailed,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }

        Ok(())
    }

    fn last_event(&self, kind: EventKind) -> Option<ConsoleEvent> {
        read(&self.last_events).get(&kind).cloned()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        self.subscribe_all(&[kind], handler)
    }

    fn subscribe_all(
        &self,
        kinds: &[EventKind],
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        let mut handlers = write(&self.handlers);
        for kind in kinds {
            handlers.entry(*kind).or_default().push(Registration {
                id,
                handler: Arc::clone(&handler),
            });
        }
        debug!(subscription = %id, handler = handler.name(), kinds = kinds.len(), "subscribed");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = write(&self.handlers);
        let mut removed = false;
        for registrations in handlers.values_mut() {
            let before = registrations.len();
            registrations.retain(|r| r.id != id);
            removed |= registrations.len() != before;
        }
        handlers.retain(|_, regs| !regs.is_empty());
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ServerId;
    use crate::domain::tab::Tab;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _: ConsoleEvent) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    /// Appends its tag to a shared log, to observe ordering.
    struct OrderHandler {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl EventHandler for OrderHandler {
        async fn handle(&self, _: ConsoleEvent) -> Result<(), DomainError> {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "OrderHandler"
        }
    }

    #[tokio::test]
    async fn publish_records_event_when_recording() {
        let bus = InMemoryEventBus::recording();

        bus.publish(ConsoleEvent::RefreshTree).await.unwrap();

        assert_eq!(bus.published_events().len(), 1);
        assert!(bus.has_event(EventKind::RefreshTree));
    }

    #[tokio::test]
    async fn plain_bus_does_not_record() {
        let bus = InMemoryEventBus::new();
        bus.publish(ConsoleEvent::RefreshTree).await.unwrap();
        assert!(bus.published_events().is_empty());
        assert!(bus.last_event(EventKind::RefreshTree).is_some());
    }

    #[tokio::test]
    async fn handlers_run_in_subscription_order() {
        let bus = InMemoryEventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            bus.subscribe(
                EventKind::CancelWarning,
                Arc::new(OrderHandler {
                    tag,
                    log: log.clone(),
                }),
            );
        }

        bus.publish(ConsoleEvent::CancelWarning).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn publish_before_subscribe_is_lost() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.publish(ConsoleEvent::RefreshTree).await.unwrap();
        bus.subscribe(EventKind::RefreshTree, Arc::new(CountingHandler(counter.clone())));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscribe_all_registers_for_multiple_kinds() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe_all(
            &[EventKind::ServerConnect, EventKind::ServerDisconnect],
            Arc::new(CountingHandler(counter.clone())),
        );

        bus.publish(ConsoleEvent::ServerConnect).await.unwrap();
        bus.publish(ConsoleEvent::ServerDisconnect).await.unwrap();
        bus.publish(ConsoleEvent::ForwarderConnect).await.unwrap(); // Not subscribed

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery_for_every_kind() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = bus.subscribe_all(
            &[EventKind::ServerConnect, EventKind::ServerDisconnect],
            Arc::new(CountingHandler(counter.clone())),
        );

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));

        bus.publish(ConsoleEvent::ServerConnect).await.unwrap();
        bus.publish(ConsoleEvent::ServerDisconnect).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(bus.handler_count(EventKind::ServerConnect), 0);
    }

    #[tokio::test]
    async fn last_event_tracks_most_recent_publish() {
        let bus = InMemoryEventBus::new();
        bus.publish(ConsoleEvent::ShowSubtree {
            server_id: ServerId::new("S-1"),
        })
        .await
        .unwrap();
        bus.publish(ConsoleEvent::ShowSubtree {
            server_id: ServerId::new("S-2"),
        })
        .await
        .unwrap();

        assert_eq!(
            bus.last_event(EventKind::ShowSubtree),
            Some(ConsoleEvent::ShowSubtree {
                server_id: ServerId::new("S-2")
            })
        );
        assert!(bus.last_event(EventKind::JumpPage).is_none());
    }

    #[tokio::test]
    async fn handler_may_publish_from_inside_handler() {
        struct Relay(Arc<InMemoryEventBus>);

        #[async_trait]
        impl EventHandler for Relay {
            async fn handle(&self, _: ConsoleEvent) -> Result<(), DomainError> {
                self.0
                    .publish(ConsoleEvent::JumpPage { tab: Tab::Chart })
                    .await
            }
            fn name(&self) -> &'static str {
                "Relay"
            }
        }

        let bus = Arc::new(InMemoryEventBus::recording());
        bus.subscribe(EventKind::RefreshTree, Arc::new(Relay(bus.clone())));

        bus.publish(ConsoleEvent::RefreshTree).await.unwrap();

        assert!(bus.has_event(EventKind::JumpPage));
    }

    #[tokio::test]
    async fn failing_handler_does_not_starve_later_ones() {
        struct FailingHandler;

        #[async_trait]
        impl EventHandler for FailingHandler {
            async fn handle(&self, _: ConsoleEvent) -> Result<(), DomainError> {
                Err(DomainError::new(ErrorCode::InternalError, "Handler failed"))
            }
            fn name(&self) -> &'static str {
                "FailingHandler"
            }
        }

        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe(EventKind::RefreshTree, Arc::new(FailingHandler));
        bus.subscribe(EventKind::RefreshTree, Arc::new(CountingHandler(counter.clone())));

        let result = bus.publish(ConsoleEvent::RefreshTree).await;

        let err = result.unwrap_err();
        assert_eq!(err.code, ErrorCode::HandlerFailed);
        assert!(err.message.contains("FailingHandler"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
