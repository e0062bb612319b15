//! Error types for forwarding operations

use thiserror::Error;

/// Errors defined by the forwarding engine, surfaced unchanged to callers.
///
/// The engine reports these both synchronously (as the result of a
/// `start`/`start_range`/`subscribe_errors` call) and asynchronously through
/// the error subscriber once a rule is running. Each kind has a stable raw
/// `i8` code on the engine's wire: library errors from -10 down, OS-level
/// errors from -51 down.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum EngineError {
    /// Unknown error.
    #[error("Unknown error")]
    Unknown,

    /// The address is invalid.
    #[error("The address is invalid")]
    InvalidAddress,

    /// At most 128 rules are allowed.
    #[error("At most 128 rules are allowed")]
    TooManyRules,

    /// The forward rule ID is invalid.
    #[error("The forward rule ID is invalid")]
    InvalidRuleId,

    /// The local port range start is invalid, which would push the local
    /// range end past 65535.
    #[error("The local port range start is invalid")]
    InvalidLocalPortRangeStart,

    /// The remote port range end is invalid.
    #[error("The remote port range end is invalid")]
    InvalidRemotePortRangeEnd,

    /// The error subscriber has already been registered.
    #[error("The error handler has already been registered")]
    HandlerAlreadyRegistered,

    /// Permission denied.
    #[error("Permission denied")]
    PermissionDenied,

    /// Address already in use.
    #[error("Address already in use")]
    AddressInUse,

    /// Address already exists.
    #[error("Address already exists")]
    AlreadyExists,

    /// An operation could not be completed because it failed to allocate
    /// enough memory.
    #[error("Out of memory")]
    OutOfMemory,

    /// Too many open files.
    #[error("Too many open files")]
    TooManyOpenFiles,
}

impl EngineError {
    /// Raw engine wire code for this error.
    pub const fn code(self) -> i8 {
        match self {
            EngineError::Unknown => -1,
            EngineError::InvalidAddress => -11,
            EngineError::TooManyRules => -12,
            EngineError::InvalidRuleId => -13,
            EngineError::InvalidLocalPortRangeStart => -14,
            EngineError::InvalidRemotePortRangeEnd => -15,
            EngineError::HandlerAlreadyRegistered => -16,
            EngineError::PermissionDenied => -51,
            EngineError::AddressInUse => -52,
            EngineError::AlreadyExists => -53,
            EngineError::OutOfMemory => -54,
            EngineError::TooManyOpenFiles => -55,
        }
    }

    /// Maps a raw engine wire code back to an error kind.
    ///
    /// Codes the engine may grow in the future fold to [`EngineError::Unknown`]
    /// rather than failing, so newer engines stay usable.
    pub const fn from_code(code: i8) -> Self {
        match code {
            -11 => EngineError::InvalidAddress,
            -12 => EngineError::TooManyRules,
            -13 => EngineError::InvalidRuleId,
            -14 => EngineError::InvalidLocalPortRangeStart,
            -15 => EngineError::InvalidRemotePortRangeEnd,
            -16 => EngineError::HandlerAlreadyRegistered,
            -51 => EngineError::PermissionDenied,
            -52 => EngineError::AddressInUse,
            -53 => EngineError::AlreadyExists,
            -54 => EngineError::OutOfMemory,
            -55 => EngineError::TooManyOpenFiles,
            _ => EngineError::Unknown,
        }
    }
}

/// Core error type for portward operations
#[derive(Debug, Error)]
pub enum Error {
    /// The forwarding engine rejected an operation
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Input validation failed before reaching the engine
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Data directory not available
    #[error("Data directory not available")]
    DataDirUnavailable,
}

impl Error {
    /// Convenience constructor for validation failures.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn codes_round_trip_for_every_kind() {
        for kind in EngineError::iter() {
            assert_eq!(EngineError::from_code(kind.code()), kind, "{kind:?}");
        }
    }

    #[test]
    fn unknown_codes_fold_to_unknown() {
        assert_eq!(EngineError::from_code(-99), EngineError::Unknown);
        assert_eq!(EngineError::from_code(0), EngineError::Unknown);
        assert_eq!(EngineError::from_code(42), EngineError::Unknown);
    }

    #[test]
    fn messages_match_engine_wording() {
        assert_eq!(
            EngineError::TooManyRules.to_string(),
            "At most 128 rules are allowed"
        );
        assert_eq!(EngineError::AddressInUse.to_string(), "Address already in use");
    }

    #[test]
    fn validation_errors_carry_field_context() {
        let err = Error::validation("remote", "port must be non-zero");
        assert_eq!(
            err.to_string(),
            "Validation error in remote: port must be non-zero"
        );
    }
}
