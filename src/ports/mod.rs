//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the console's controllers and the outside world. Adapters implement
//! these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for broadcasting console events
//! - `EventSubscriber` - Port for subscribing to console events
//! - `EventHandler` - Handler that processes incoming events
//!
//! ## Backend Ports
//!
//! - `PinicApi` - The forwarder's REST surface
//! - `RealtimeChannel` - The forwarder's push channel

mod event_publisher;
mod event_subscriber;
mod pinic_api;
mod realtime_channel;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber, SubscriptionId};
pub use pinic_api::{ApiError, PinicApi};
pub use realtime_channel::{RealtimeChannel, RealtimeError, RealtimeEvent};
