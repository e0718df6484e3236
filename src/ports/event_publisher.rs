//! EventPublisher port - Interface for broadcasting console events.
//!
//! Controllers publish without knowing who listens.

use async_trait::async_trait;

use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::DomainError;

/// Port for publishing console events.
///
/// Implementations must ensure:
/// - Every handler subscribed to the event's kind at publish time is invoked
///   before `publish` returns, in subscription order
/// - A failing handler does not prevent later handlers from running
/// - Handler errors are reported to the caller
///
/// # Example
///
/// ```ignore
/// publisher.publish(ConsoleEvent::RefreshTree).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: ConsoleEvent) -> Result<(), DomainError>;

    /// Publish several events in order.
    async fn publish_all(&self, events: Vec<ConsoleEvent>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }

    /// The most recent event published under `kind`, if any.
    ///
    /// Updated before handlers run, so a handler sees its own event here.
    fn last_event(&self, kind: EventKind) -> Option<ConsoleEvent>;
}
