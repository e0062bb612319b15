//! Core forwarding rule lifecycle
//!
//! This module contains the core types and logic for managing TCP
//! port-forwarding rules against an external engine. It provides:
//!
//! - [`forward`]: Data structures for port specs, descriptors, and live rules
//! - [`engine`]: The boundary trait to the native forwarding engine
//! - [`registry`]: Ownership and lifecycle of the live rule set
//! - [`router`]: Fan-out of asynchronous per-rule engine errors
//! - [`error`]: Error types for forwarding operations

pub mod engine;
pub mod error;
pub mod forward;
pub mod registry;
pub mod router;

#[cfg(test)]
pub mod test_helpers;
