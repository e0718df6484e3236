//! Pinic Console - monitoring client for the pinic sensor network
//!
//! Mirrors the forwarder → server → node → sensor hierarchy, charts live
//! sensor readings, collects threshold warnings pushed by the forwarder and
//! edits each device's configuration.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
