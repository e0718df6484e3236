//! Domain layer - pure types and rules of the monitoring console.
//!
//! Nothing in here performs I/O. Controllers in `application` combine these
//! types with the ports.

pub mod chart;
pub mod conversion;
pub mod device;
pub mod events;
pub mod foundation;
pub mod tab;
pub mod warning;
