//! Per-rule routing of asynchronous engine errors
//!
//! The engine reports runtime failures (bind races, OS-level issues discovered
//! after a rule is running) through a single process-wide callback. The
//! [`ErrorRouter`] owns that subscription and fans the events out into an
//! append-only error list per rule id, which the UI reads back through
//! [`crate::core::registry::RuleRegistry::errors_for`].
//!
//! The router is an explicitly constructed handle, not module-level state:
//! the registry and the engine callback each hold a clone, and the whole pair
//! is torn down with the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::engine::{ForwardingEngine, RuleId};
use super::error::EngineError;

/// Fan-out point for the engine's asynchronous `(rule_id, error)` events.
///
/// Cloning is cheap and shares the underlying map. Key presence marks a rule
/// id the registry currently owns: the installed callback appends only to
/// existing entries, so a late error arriving after the rule is pruned is
/// silently dropped instead of resurrecting state for a dead rule.
#[derive(Clone, Default)]
pub struct ErrorRouter {
    // Touched from the engine's callback thread; every access is a short,
    // non-blocking critical section.
    errors: Arc<Mutex<HashMap<RuleId, Vec<EngineError>>>>,
}

impl ErrorRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs this router as the engine's single error subscriber.
    ///
    /// May be called once per process; a second install (or any other
    /// subscriber already registered with the engine) fails with
    /// [`EngineError::HandlerAlreadyRegistered`] and leaves the existing
    /// subscription intact.
    pub fn install(&self, engine: &dyn ForwardingEngine) -> Result<(), EngineError> {
        let errors = Arc::clone(&self.errors);
        engine.subscribe_errors(Box::new(move |rule_id, error| {
            let mut map = errors.lock().unwrap();
            if let Some(list) = map.get_mut(&rule_id) {
                tracing::warn!(rule_id, %error, "engine reported rule error");
                list.push(error);
            } else {
                // Defined race: the rule was removed before this event landed.
                tracing::debug!(rule_id, %error, "dropping error for unknown rule");
            }
        }))
    }

    /// Opens an (empty) error list for a freshly started rule.
    pub(crate) fn register(&self, rule_id: RuleId) {
        self.errors
            .lock()
            .unwrap()
            .entry(rule_id)
            .or_default();
    }

    /// Drops the error list for a removed rule. Later events for this id are
    /// discarded until the id is registered again.
    pub(crate) fn prune(&self, rule_id: RuleId) {
        self.errors
            .lock()
            .unwrap()
            .remove(&rule_id);
    }

    /// Drops every error list. Used by registry teardown.
    pub(crate) fn clear(&self) {
        self.errors
            .lock()
            .unwrap()
            .clear();
    }

    /// Snapshot of the accumulated errors for `rule_id`, oldest first.
    ///
    /// Empty both for a rule with no errors and for an unknown id.
    pub fn errors_for(&self, rule_id: RuleId) -> Vec<EngineError> {
        self.errors
            .lock()
            .unwrap()
            .get(&rule_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of rule ids currently holding an error list.
    pub fn tracked_rules(&self) -> usize {
        self.errors
            .lock()
            .unwrap()
            .len()
    }
}

impl std::fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRouter")
            .field("tracked_rules", &self.tracked_rules())
            .finish()
    }
}
