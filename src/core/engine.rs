//! Boundary adapter to the native forwarding engine
//!
//! The engine is an external collaborator: it binds the local listeners,
//! proxies the actual TCP connections, and hands out rule identities. This
//! crate only depends on the contract below; the engine's internals (accept
//! loops, LAN bind logic) are opaque.
//!
//! # Contract notes
//!
//! - `start`/`start_range` are synchronous handoffs (local registration, not
//!   the proxy loop itself). There is no cancellation or timeout primitive;
//!   they either return an id or fail.
//! - `stop` is fire-and-forget and not double-stop safe on the engine side.
//!   [`crate::core::forward::ForwardingRule`] enforces at-most-one stop per id.
//! - `subscribe_errors` accepts exactly one subscriber for the lifetime of the
//!   process. The callback fires from arbitrary background threads at any time
//!   between a rule's start and (narrowly past) its stop.

use super::error::EngineError;

/// Engine-assigned rule identity.
///
/// Small integer handed out from the engine's pool of 128 ids; stable for the
/// rule's lifetime and unique among concurrently active rules.
pub type RuleId = i8;

/// Asynchronous per-rule error callback.
///
/// Invoked off any UI-affinity thread, so it must be `Send + Sync` and must
/// stay short and non-blocking.
pub type ErrorSubscriber = Box<dyn Fn(RuleId, EngineError) + Send + Sync + 'static>;

/// The forwarding engine contract.
///
/// Implementations live outside this crate (the native proxy core); tests use
/// the in-memory mock from the test helpers.
pub trait ForwardingEngine: Send + Sync {
    /// Pure syntactic/resolvability check for an address. Never fails.
    fn check_address_valid(&self, address: &str) -> bool;

    /// Starts forwarding a single remote port. Returns the new rule id.
    fn start(
        &self,
        address: &str,
        remote_port: u16,
        local_port: u16,
        allow_lan: bool,
    ) -> Result<RuleId, EngineError>;

    /// Starts forwarding a contiguous remote port range. The engine derives
    /// the local range end from `local_start` the same way
    /// [`crate::core::forward::PortSpec::local_range_end`] does.
    fn start_range(
        &self,
        address: &str,
        remote_start: u16,
        remote_end: u16,
        local_start: u16,
        allow_lan: bool,
    ) -> Result<RuleId, EngineError>;

    /// Releases the engine-side resource for `rule_id`. Fire-and-forget.
    fn stop(&self, rule_id: RuleId);

    /// Registers the single process-wide error subscriber.
    ///
    /// A second registration fails with
    /// [`EngineError::HandlerAlreadyRegistered`] and leaves the first
    /// subscription intact.
    fn subscribe_errors(&self, subscriber: ErrorSubscriber) -> Result<(), EngineError>;
}
