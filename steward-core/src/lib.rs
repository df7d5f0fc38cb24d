//! Steward Core
//!
//! Core types shared by the Steward stage coordinator and its clients.
//!
//! This crate contains:
//! - Domain types: pod identity, container lifecycle milestones and selectors,
//!   stage results and the `Resource` custom resource
//! - DTOs: data passed to the log collection server
//! - Metadata: well-known annotation keys and reserved container names

pub mod domain;
pub mod dto;
pub mod meta;
