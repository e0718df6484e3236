//! HTTP adapters - the forwarder's REST surface.

mod client;

pub use client::{HttpApiConfig, HttpPinicApi};
