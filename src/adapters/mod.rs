//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the console to external systems:
//! - `events` - In-process event bus
//! - `http` - Forwarder REST client
//! - `realtime` - Socket.IO warning channel
//! - `mock` - Scriptable backend for tests and offline runs

pub mod events;
pub mod http;
pub mod mock;
pub mod realtime;

pub use events::InMemoryEventBus;
pub use http::{HttpApiConfig, HttpPinicApi};
pub use mock::{Endpoint, MockPinicApi};
pub use realtime::{SocketIoChannel, SocketIoConfig};
