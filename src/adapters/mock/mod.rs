//! Mock adapters for testing.

mod api;

pub use api::{Endpoint, MockPinicApi};
