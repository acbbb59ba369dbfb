//! Application layer: wires every port/adapter into a running engine and
//! exposes the result as an [`EngineHandle`].

pub mod handle;
pub mod orchestrator;

pub use handle::{ConfigView, EngineHandle, HealthStatus};
pub use orchestrator::Engine;
