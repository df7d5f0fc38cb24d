//! Steward Coordinator library
//!
//! Building blocks for coordinating the workload containers of a stage pod.
//! The `steward-coordinator` binary wires them together through
//! [`workflow::StageCoordinator`]; they can also be driven individually:
//!
//! - [`service::ContainerStateWaiter`]: wait for containers to reach a milestone
//! - [`service::LogRelay`]: relay container logs to the log server
//! - [`service::ResultPublisher`]: publish stage results onto the pod
//! - [`service::FileExtractor`]: copy files out of containers

pub mod config;
pub mod error;
pub mod repository;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod test_support;
