//! Service layer
//!
//! Services hold the coordination logic. They operate on one pod through
//! the repositories and know nothing about how a stage is sequenced.

mod extractor;
mod log_relay;
mod publisher;
mod retry;
mod waiter;

pub use extractor::FileExtractor;
pub use log_relay::LogRelay;
pub use publisher::ResultPublisher;
pub use retry::{RetryPolicy, retry_on_conflict};
pub use waiter::ContainerStateWaiter;
