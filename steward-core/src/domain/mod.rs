//! Core domain types
//!
//! These types describe the workload pod the coordinator runs in and the data
//! it publishes back onto it. They are shared between the coordinator (which
//! reads and writes them) and any controller that consumes stage results.

pub mod container;
pub mod pod;
pub mod resource;
pub mod result;
