//! Shared test utilities for core module tests
//!
//! Provides an in-memory [`MockEngine`] implementing the full engine contract
//! (id pool, range validation, single error subscriber) plus descriptor
//! builders. This module is only compiled in test mode;
//! `tests/integration_tests.rs` carries its own copy of the mock.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::engine::{ErrorSubscriber, ForwardingEngine, RuleId};
use crate::core::error::EngineError;
use crate::core::forward::{PortSpec, RuleDescriptor};

/// One recorded engine call, for asserting call counts and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Start {
        address: String,
        remote_port: u16,
        local_port: u16,
        allow_lan: bool,
    },
    StartRange {
        address: String,
        remote_start: u16,
        remote_end: u16,
        local_start: u16,
        allow_lan: bool,
    },
    Stop {
        rule_id: RuleId,
    },
}

struct MockState {
    available: Vec<RuleId>,
    active: Vec<RuleId>,
    calls: Vec<EngineCall>,
    stop_counts: HashMap<RuleId, usize>,
    fail_next_start: Option<EngineError>,
}

impl Default for MockState {
    fn default() -> Self {
        // Same id pool the native core hands out from: 0..=127, popped from
        // the back.
        let mut available: Vec<RuleId> = (0..=127).collect();
        available.reverse();
        Self {
            available,
            active: Vec::new(),
            calls: Vec::new(),
            stop_counts: HashMap::new(),
            fail_next_start: None,
        }
    }
}

/// In-memory engine mirroring the native core's observable behavior:
/// ids from a capped pool, the same range validation the native side does,
/// and a single error subscriber that tests can fire from any thread.
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
    subscriber: Mutex<Option<ErrorSubscriber>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `start`/`start_range` call fail with `error`.
    pub fn fail_next_start(&self, error: EngineError) {
        self.state.lock().unwrap().fail_next_start = Some(error);
    }

    /// Ids currently holding an engine-side resource.
    pub fn active_ids(&self) -> Vec<RuleId> {
        self.state.lock().unwrap().active.clone()
    }

    /// How many times `stop` was called for `rule_id`.
    pub fn stop_count(&self, rule_id: RuleId) -> usize {
        self.state
            .lock()
            .unwrap()
            .stop_counts
            .get(&rule_id)
            .copied()
            .unwrap_or(0)
    }

    /// Every call made against the engine, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn has_subscriber(&self) -> bool {
        self.subscriber.lock().unwrap().is_some()
    }

    /// Fires the registered subscriber as the engine would, from whatever
    /// thread the test calls this on. No-op without a subscriber.
    pub fn emit(&self, rule_id: RuleId, error: EngineError) {
        if let Some(subscriber) = self.subscriber.lock().unwrap().as_ref() {
            subscriber(rule_id, error);
        }
    }

    fn allocate(state: &mut MockState) -> Result<RuleId, EngineError> {
        let Some(id) = state.available.pop() else {
            return Err(EngineError::TooManyRules);
        };
        state.active.push(id);
        Ok(id)
    }

    fn take_injected_failure(state: &mut MockState) -> Result<(), EngineError> {
        match state.fail_next_start.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ForwardingEngine for MockEngine {
    fn check_address_valid(&self, address: &str) -> bool {
        !address.is_empty() && !address.contains(char::is_whitespace)
    }

    fn start(
        &self,
        address: &str,
        remote_port: u16,
        local_port: u16,
        allow_lan: bool,
    ) -> Result<RuleId, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Start {
            address: address.to_string(),
            remote_port,
            local_port,
            allow_lan,
        });
        Self::take_injected_failure(&mut state)?;
        Self::allocate(&mut state)
    }

    fn start_range(
        &self,
        address: &str,
        remote_start: u16,
        remote_end: u16,
        local_start: u16,
        allow_lan: bool,
    ) -> Result<RuleId, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::StartRange {
            address: address.to_string(),
            remote_start,
            remote_end,
            local_start,
            allow_lan,
        });
        Self::take_injected_failure(&mut state)?;

        // Same checks the native engine runs before touching its pool.
        if remote_end < remote_start {
            return Err(EngineError::InvalidRemotePortRangeEnd);
        }
        if u16::MAX - (remote_end - remote_start) < local_start {
            return Err(EngineError::InvalidLocalPortRangeStart);
        }

        Self::allocate(&mut state)
    }

    fn stop(&self, rule_id: RuleId) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Stop { rule_id });
        *state.stop_counts.entry(rule_id).or_insert(0) += 1;
        if state.active.contains(&rule_id) {
            state.active.retain(|id| *id != rule_id);
            state.available.push(rule_id);
        }
    }

    fn subscribe_errors(&self, subscriber: ErrorSubscriber) -> Result<(), EngineError> {
        let mut slot = self.subscriber.lock().unwrap();
        if slot.is_some() {
            return Err(EngineError::HandlerAlreadyRegistered);
        }
        *slot = Some(subscriber);
        Ok(())
    }
}

/// Descriptor for a plain single-port forward to `address`.
pub fn single_descriptor(address: &str, port: u16) -> RuleDescriptor {
    RuleDescriptor {
        address: address.to_string(),
        remote: PortSpec::Single(port),
        local: None,
        allow_lan: false,
    }
}

/// Descriptor for a range forward with an explicit local remap base.
pub fn range_descriptor(address: &str, start: u16, end: u16, local: Option<u16>) -> RuleDescriptor {
    RuleDescriptor {
        address: address.to_string(),
        remote: PortSpec::Range { start, end },
        local,
        allow_lan: false,
    }
}
