//! Repository layer
//!
//! Repositories abstract the two remote systems the coordinator talks to:
//! the Kubernetes API server and the log collection server. They carry no
//! coordination logic.
//!
//! All repositories are trait-based so tests can substitute in-memory fakes.

mod logs;
mod pods;

// Re-export traits
pub use logs::LogRepository;
pub use pods::PodRepository;

// Re-export implementations
pub use logs::HttpLogRepository;
pub use pods::KubePodRepository;
