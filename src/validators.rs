//! Input validation for forwarding descriptors
//!
//! Centralizes the authoritative pre-engine checks so the registry, the
//! loader, and any form layer all agree on what a valid descriptor is. The
//! edit-time helper [`crate::core::forward::PortSpec::local_range_end`] covers
//! the same ground with a sentinel return; this module is the hard gate that
//! runs before any engine call.

use crate::core::forward::PortSpec;

/// Validates a single port number.
///
/// # Errors
///
/// Returns `Err` if port is 0 (the "unset" sentinel).
pub fn validate_port(port: u16) -> Result<u16, String> {
    if port == 0 {
        Err("Port must be between 1 and 65535".to_string())
    } else {
        Ok(port)
    }
}

/// Validates a remote port range.
///
/// A forwardable range needs both bounds set and strictly increasing; a
/// single port is expressed as [`PortSpec::Single`], never as a degenerate
/// range.
///
/// # Errors
///
/// Returns `Err` if either bound is 0 or `end <= start`.
pub fn validate_port_range(start: u16, end: u16) -> Result<(u16, u16), String> {
    validate_port(start)?;
    validate_port(end)?;

    if end <= start {
        Err("Range end must be greater than range start".to_string())
    } else {
        Ok((start, end))
    }
}

/// Authoritative validation of a remote port spec with its optional local
/// remap base.
///
/// Rechecks every condition the edit-time derivation treats as the `0`
/// sentinel, independently of it:
///
/// - single: port non-zero; local remap (when given) non-zero
/// - range: both bounds non-zero, `end > start`, local base (when given)
///   non-zero and small enough that `local + (end - start)` stays within the
///   16-bit port space
///
/// # Errors
///
/// Returns a human-readable message naming the failed condition.
pub fn validate_port_spec(remote: PortSpec, local: Option<u16>) -> Result<(), String> {
    match remote {
        PortSpec::Single(port) => {
            validate_port(port)?;
            if let Some(local_port) = local {
                validate_port(local_port)?;
            }
            Ok(())
        }
        PortSpec::Range { start, end } => {
            validate_port_range(start, end)?;
            if let Some(local_start) = local {
                validate_port(local_start)?;
                if u16::MAX - (end - start) < local_start {
                    return Err(format!(
                        "Local range start {local_start} pushes the local range end past 65535"
                    ));
                }
            }
            Ok(())
        }
    }
}
