//! Workflow layer
//!
//! Sequences the services over the lifetime of one stage pod.

mod stage;

pub use stage::StageCoordinator;
