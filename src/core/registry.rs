//! Live forwarding rule ownership and lifecycle
//!
//! The [`RuleRegistry`] owns the insertion-ordered set of live
//! [`ForwardingRule`]s and drives every engine transition for them. It is the
//! only place that calls `start`/`start_range`/`stop`, which keeps the
//! one-engine-call-per-transition invariant in a single file.
//!
//! # Threading
//!
//! Mutating operations (`add_rule`, `update_rule`, `remove_rule`) are meant to
//! run on one logical control thread; callers serialize structural mutations
//! themselves (an event loop or an external mutex). The engine's error
//! callback is the only cross-thread path and is isolated inside
//! [`ErrorRouter`].
//!
//! # Rule state machine
//!
//! `Unstarted → Active` on a successful start, `Active → Destroyed` on stop.
//! There is no `Active → Active` transition: any semantic change is
//! destroy-then-recreate, producing a new rule entity that may reuse the old
//! collection slot.

use std::sync::Arc;

use super::engine::{ForwardingEngine, RuleId};
use super::error::{EngineError, Error, Result};
use super::forward::{ForwardingRule, RuleDescriptor};
use super::router::ErrorRouter;
use crate::validators;

/// Owns the live set of forwarding rules against one engine.
///
/// Construct one registry (and its [`ErrorRouter`]) at startup, pass it by
/// reference to whatever control plane consumes it, and call
/// [`shutdown`](Self::shutdown) on the way out. Dropping a non-empty registry
/// without shutdown leaks the engine resources (each leaked rule logs a
/// warning).
pub struct RuleRegistry {
    engine: Arc<dyn ForwardingEngine>,
    router: ErrorRouter,
    rules: Vec<ForwardingRule>,
}

impl RuleRegistry {
    /// Creates an empty registry over `engine`, accumulating asynchronous
    /// errors into `router`.
    ///
    /// The router should already be installed as the engine's subscriber (see
    /// [`ErrorRouter::install`]); the registry itself never touches the
    /// subscription.
    pub fn new(engine: Arc<dyn ForwardingEngine>, router: ErrorRouter) -> Self {
        Self {
            engine,
            router,
            rules: Vec::new(),
        }
    }

    /// Validates `desc` and starts forwarding for it.
    ///
    /// Validation failures (empty address, engine-invalid address, zero or
    /// inverted or overflowing ports) are synchronous [`Error::Validation`]
    /// results and never reach the engine. Engine failures surface as
    /// [`Error::Engine`] and leave the collection unchanged — there is no
    /// partial insert. On success the new rule is appended and its error slot
    /// opened with the router.
    ///
    /// # Errors
    ///
    /// Returns validation failures or the engine error from the start call.
    pub fn add_rule(&mut self, desc: &RuleDescriptor) -> Result<&ForwardingRule> {
        self.validate(desc)?;

        let rule = ForwardingRule::start(self.engine.as_ref(), desc)?;
        self.router.register(rule.rule_id());
        self.rules.push(rule);

        Ok(self.rules.last().expect("rule was just pushed"))
    }

    /// Replaces the rule identified by `existing` with a rule built from `desc`.
    ///
    /// Semantically destroy-old-then-create-new: the old engine resource is
    /// released (and its accumulated errors cleared) before the new start is
    /// requested, so one logical slot never holds two engine identities. If
    /// the new start fails, the slot is vacated and the address stays
    /// unforwarded until the caller corrects and resubmits — an explicit
    /// tradeoff, not an atomic swap.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRuleId`] when `existing` is not a live
    /// rule, validation failures for `desc`, or the engine error from the new
    /// start call.
    pub fn update_rule(&mut self, existing: RuleId, desc: &RuleDescriptor) -> Result<&ForwardingRule> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.rule_id() == existing)
            .ok_or(EngineError::InvalidRuleId)?;

        // Validate before destroying anything: a descriptor that cannot pass
        // validation must leave the old rule running.
        self.validate(desc)?;

        let mut old = self.rules.remove(index);
        old.stop(self.engine.as_ref());
        self.router.prune(existing);

        match ForwardingRule::start(self.engine.as_ref(), desc) {
            Ok(rule) => {
                self.router.register(rule.rule_id());
                tracing::info!(old_id = existing, new_id = rule.rule_id(), "rule updated");
                self.rules.insert(index, rule);
                Ok(&self.rules[index])
            }
            Err(err) => {
                tracing::warn!(
                    old_id = existing,
                    %err,
                    "re-create after update failed; slot vacated"
                );
                Err(err.into())
            }
        }
    }

    /// Stops the rule identified by `rule_id` and removes it from the
    /// collection, pruning its error list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRuleId`] when no live rule carries the id.
    pub fn remove_rule(&mut self, rule_id: RuleId) -> Result<()> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.rule_id() == rule_id)
            .ok_or(EngineError::InvalidRuleId)?;

        let mut rule = self.rules.remove(index);
        rule.stop(self.engine.as_ref());
        self.router.prune(rule_id);
        Ok(())
    }

    /// Live rules in insertion order. Insertion order is display order; the
    /// registry never reorders.
    pub fn rules(&self) -> &[ForwardingRule] {
        &self.rules
    }

    /// Looks up a live rule by its engine identity.
    pub fn rule(&self, rule_id: RuleId) -> Option<&ForwardingRule> {
        self.rules.iter().find(|rule| rule.rule_id() == rule_id)
    }

    /// Number of live rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rules are live.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Snapshot of the asynchronous errors accumulated for `rule_id` during
    /// its current engine session, oldest first.
    pub fn errors_for(&self, rule_id: RuleId) -> Vec<EngineError> {
        self.router.errors_for(rule_id)
    }

    /// Stops every live rule and clears all error state.
    ///
    /// Explicit teardown counterpart to construction; after this the registry
    /// is empty and reusable.
    pub fn shutdown(&mut self) {
        for rule in &mut self.rules {
            rule.stop(self.engine.as_ref());
        }
        self.rules.clear();
        self.router.clear();
        tracing::info!("registry shut down");
    }

    /// Authoritative pre-engine validation for a descriptor.
    ///
    /// Independently rechecks everything the edit-time helpers check, plus the
    /// engine's own address check.
    fn validate(&self, desc: &RuleDescriptor) -> Result<()> {
        if desc.address.is_empty() {
            return Err(Error::validation("address", "address must not be empty"));
        }
        if !self.engine.check_address_valid(&desc.address) {
            return Err(Error::validation(
                "address",
                format!("not a valid hostname or IP literal: {}", desc.address),
            ));
        }
        validators::validate_port_spec(desc.remote, desc.local)
            .map_err(|message| Error::validation("remote", message))?;
        Ok(())
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
