//! portward - TCP port-forwarding rule lifecycle
//!
//! Control-plane library for a set of TCP port-forwarding rules run against an
//! external forwarding engine: rule identities, start/stop transitions, the
//! single-port-vs-range abstraction with its validation and remap rules, and
//! asynchronous routing of per-rule engine errors back to the rule that
//! caused them.
//!
//! # Architecture
//!
//! - [`core`] - Rule data model, engine boundary, registry, and error routing
//! - [`config`] - Forwarding-list persistence (JSON, atomic writes)
//! - [`validators`] - Authoritative pre-engine input validation
//! - [`utils`] - Utility functions (XDG directories)
//!
//! # Lifecycle
//!
//! Construct an [`ErrorRouter`], install it on the engine, build a
//! [`RuleRegistry`] over both, and drive every rule transition through the
//! registry. The actual connection proxying, GUI, and OS integration live
//! outside this crate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use portward::{ErrorRouter, RuleRegistry};
//! use portward::core::engine::ForwardingEngine;
//!
//! fn init(engine: Arc<dyn ForwardingEngine>) -> portward::Result<RuleRegistry> {
//!     let router = ErrorRouter::new();
//!     router.install(engine.as_ref())?;
//!     Ok(RuleRegistry::new(engine, router))
//! }
//! ```

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod core;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use self::core::engine::{ForwardingEngine, RuleId};
pub use self::core::error::{EngineError, Error, Result};
pub use self::core::forward::{ForwardedItemInfo, ForwardingRule, PortSpec, RuleDescriptor};
pub use self::core::registry::RuleRegistry;
pub use self::core::router::ErrorRouter;
