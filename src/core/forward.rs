//! Forwarding rule data structures
//!
//! This module defines the core data model for port-forwarding rules:
//!
//! - [`PortSpec`]: the single-port-or-range abstraction shared by descriptors
//!   and live rules
//! - [`RuleDescriptor`]: a requested rule, not yet backed by the engine
//! - [`ForwardedItemInfo`]: the serializable snapshot used for persistence
//! - [`ForwardingRule`]: a live, engine-backed rule holding its engine identity
//!
//! # Port model
//!
//! A rule forwards either a single remote port or a contiguous range of remote
//! ports. The local side mirrors the remote side unless an explicit local
//! remap base is given; for ranges the local range is derived start-for-start
//! from the remap base. Port `0` is the sentinel for "unset" throughout and is
//! never a valid bound.
//!
//! # Example
//!
//! ```
//! use portward::core::forward::{PortSpec, RuleDescriptor};
//!
//! let desc = RuleDescriptor {
//!     address: "192.168.1.20".to_string(),
//!     remote: PortSpec::Range { start: 1000, end: 2000 },
//!     local: Some(3000),
//!     allow_lan: false,
//! };
//! assert_eq!(desc.remote.local_range_end(3000), 4000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::engine::{ForwardingEngine, RuleId};
use super::error::EngineError;

/// Maximum number of concurrently active rules.
///
/// This mirrors the engine's hard cap (rule ids are handed out from a pool of
/// 128). The loader also rejects forwarding-list files with more entries to
/// avoid pointless engine churn on malformed files.
pub const MAX_RULES: usize = 128;

/// A single remote port or a contiguous, inclusive range of remote ports.
///
/// Equality is structural per-variant: `Single(80)` never equals
/// `Range { start: 80, end: 80 }`. The serde encoding is a compatibility
/// surface shared with other consumers of the forwarding-list format:
/// `{"single": 80}` or `{"range": {"start": 1000, "end": 2000}}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortSpec {
    /// One remote port.
    Single(u16),
    /// An inclusive range of remote ports. A finalized range has
    /// `end > start`; `0` in either bound means "still being edited".
    Range { start: u16, end: u16 },
}

impl PortSpec {
    /// Returns `true` for the [`PortSpec::Single`] variant.
    #[inline]
    pub const fn is_single(&self) -> bool {
        matches!(self, PortSpec::Single(_))
    }

    /// Returns `true` for the [`PortSpec::Range`] variant.
    #[inline]
    pub const fn is_range(&self) -> bool {
        matches!(self, PortSpec::Range { .. })
    }

    /// Derives the local range end for a range forwarded from `local_start`.
    ///
    /// For `remote = (start, end)` the local range is
    /// `local_start ..= local_start + (end - start)`. Returns `0` (the
    /// "invalid" sentinel) instead of wrapping when the derivation is not
    /// meaningful:
    ///
    /// - the variant is [`PortSpec::Single`]
    /// - either bound or `local_start` is the `0` sentinel
    /// - the range is inverted (`end < start`)
    /// - the local end would exceed the 16-bit port space
    ///
    /// This is a pure helper for in-progress edits; the authoritative checks
    /// before any engine call live in [`crate::validators`].
    pub const fn local_range_end(&self, local_start: u16) -> u16 {
        match *self {
            PortSpec::Single(_) => 0,
            PortSpec::Range { start, end } => {
                if start == 0 || end == 0 || local_start == 0 {
                    0
                } else if end < start {
                    0
                } else if u16::MAX - (end - start) < local_start {
                    0
                } else {
                    end - start + local_start
                }
            }
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSpec::Single(port) => write!(f, "{port}"),
            PortSpec::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// A requested forwarding rule, not yet registered with the engine.
///
/// This is what callers hand to [`crate::core::registry::RuleRegistry::add_rule`].
/// `local` is the remap base: when `None`, the local side mirrors the remote
/// side (start-for-start for ranges).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Hostname or IP literal of the forward target.
    pub address: String,
    /// Remote port or port range to forward.
    pub remote: PortSpec,
    /// Optional local port (or local range start) remap base.
    pub local: Option<u16>,
    /// Bind to all interfaces instead of loopback only.
    pub allow_lan: bool,
}

/// Serializable snapshot of a forwarding rule's descriptive fields.
///
/// Carries no engine identity; constructing a live rule from it is a separate,
/// fallible operation through the registry. Field names and the tagged-union
/// port encoding are the on-disk compatibility surface and must round-trip
/// exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedItemInfo {
    pub address: String,
    pub remote_port: PortSpec,
    pub local_port: Option<u16>,
    pub allow_lan: bool,
}

impl ForwardedItemInfo {
    /// Snapshots the descriptive fields of a live rule, stripping the engine id.
    pub fn from_rule(rule: &ForwardingRule) -> Self {
        Self {
            address: rule.address.clone(),
            remote_port: rule.remote,
            local_port: rule.local,
            allow_lan: rule.allow_lan,
        }
    }

    /// Rebuilds the descriptor this snapshot was taken from.
    pub fn to_descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            address: self.address.clone(),
            remote: self.remote_port,
            local: self.local_port,
            allow_lan: self.allow_lan,
        }
    }
}

/// A live forwarding rule backed by an engine-side resource.
///
/// Instances exist only after a successful engine start; from the caller's
/// point of view construction and engine registration are atomic. The
/// engine-side resource is released by exactly one [`stop`](Self::stop) call,
/// guarded by an internal flag — never by `Drop` (dropping an unstopped rule
/// is a leak of the engine resource and logs a warning).
#[derive(Debug)]
pub struct ForwardingRule {
    address: String,
    remote: PortSpec,
    local: Option<u16>,
    allow_lan: bool,
    rule_id: RuleId,
    stopped: bool,
}

impl ForwardingRule {
    /// Starts forwarding for `desc` and wraps the engine identity.
    ///
    /// Dispatches to the engine's single-port or range call depending on the
    /// descriptor's [`PortSpec`] variant. When no local remap is given, the
    /// local side mirrors the remote side. Callers are expected to have run
    /// the authoritative validation first; engine failures surface unchanged.
    pub(crate) fn start(
        engine: &dyn ForwardingEngine,
        desc: &RuleDescriptor,
    ) -> Result<Self, EngineError> {
        let rule_id = match desc.remote {
            PortSpec::Single(port) => {
                let local_port = desc.local.unwrap_or(port);
                engine.start(&desc.address, port, local_port, desc.allow_lan)?
            }
            PortSpec::Range { start, end } => {
                let local_start = desc.local.unwrap_or(start);
                engine.start_range(&desc.address, start, end, local_start, desc.allow_lan)?
            }
        };

        tracing::info!(
            rule_id,
            address = %desc.address,
            remote = %desc.remote,
            local = ?desc.local,
            allow_lan = desc.allow_lan,
            "forwarding started"
        );

        Ok(Self {
            address: desc.address.clone(),
            remote: desc.remote,
            local: desc.local,
            allow_lan: desc.allow_lan,
            rule_id,
            stopped: false,
        })
    }

    /// Releases the engine-side resource.
    ///
    /// Safe to call more than once from the core's perspective: the second and
    /// later calls are no-ops. The engine itself does not guarantee double-stop
    /// safety, so this flag is the only thing standing between a repeated stop
    /// and a double-free class bug.
    pub(crate) fn stop(&mut self, engine: &dyn ForwardingEngine) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        engine.stop(self.rule_id);
        tracing::info!(rule_id = self.rule_id, address = %self.address, "forwarding stopped");
    }

    /// Forward target hostname or IP literal.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Remote port or port range.
    pub const fn remote(&self) -> PortSpec {
        self.remote
    }

    /// Local remap base, if any.
    pub const fn local(&self) -> Option<u16> {
        self.local
    }

    /// Whether the rule binds to all interfaces.
    pub const fn allow_lan(&self) -> bool {
        self.allow_lan
    }

    /// Engine-assigned identity, stable for this rule's lifetime.
    pub const fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    /// Returns the descriptor equivalent of this rule's descriptive fields.
    pub fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            address: self.address.clone(),
            remote: self.remote,
            local: self.local,
            allow_lan: self.allow_lan,
        }
    }
}

impl Drop for ForwardingRule {
    fn drop(&mut self) {
        if !self.stopped {
            // The engine resource cannot be released from here without risking
            // a release on a background thread the engine never sees. Leaking
            // loudly beats double-freeing silently.
            tracing::warn!(
                rule_id = self.rule_id,
                address = %self.address,
                "forwarding rule dropped without stop; engine resource leaked"
            );
        }
    }
}
