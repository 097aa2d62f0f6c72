pub mod coordinator;

pub use coordinator::{ExecutionCoordinator, ExecutionOutcome};
