//! Data transfer objects
//!
//! Structures exchanged with the log collection server.

pub mod log;
