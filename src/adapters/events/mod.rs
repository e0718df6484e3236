//! Event bus adapters.
//!
//! - `InMemoryEventBus` - Synchronous, in-process bus shared by the
//!   controllers of one console

mod in_memory;

pub use in_memory::InMemoryEventBus;
