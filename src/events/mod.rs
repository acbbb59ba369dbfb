//! Fan-out of opportunity/execution events to external subscribers.

pub mod bus;

pub use bus::{EngineEvent, EventBus};
