//! Realtime adapters - the forwarder's push channel.
//!
//! - `SocketIoChannel` - Socket.IO (Engine.IO v4) over WebSocket

mod client;
pub mod codec;

pub use client::{
    socket_url, SocketIoChannel, SocketIoConfig, MAX_RECONNECT_ATTEMPTS, MAX_RECONNECT_DELAY,
    RECONNECT_BASE_DELAY,
};
