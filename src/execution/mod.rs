//! Two-leg execution: concurrent order placement with partial-failure
//! compensation (spec §4.5).

pub mod coordinator;

pub use coordinator::{ExecutionCoordinator, ExecutionOutcome, ExecutionResult};
