//! # Error Types
//!
//! Shared error types for the rental service. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! State machine errors live next to the state machine in `rental-state`
//! and carry the current state, attempted target, and acting party. The
//! types here cover the primitives every crate shares.

use thiserror::Error;

/// Error raised when parsing or constructing a primitive value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier string was not a valid UUID.
    #[error("invalid {kind} identifier {value:?}: {reason}")]
    InvalidIdentifier {
        /// Identifier namespace (e.g. "loan").
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A timestamp string was malformed or not UTC.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// An enumerated value (status, role) was not recognised.
    #[error("unknown {kind} {value:?}; expected one of: {expected}")]
    UnknownVariant {
        /// What was being parsed (e.g. "loan status").
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identifier_message_names_kind() {
        let err = ValidationError::InvalidIdentifier {
            kind: "loan",
            value: "abc".into(),
            reason: "too short".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid loan identifier \"abc\": too short"
        );
    }
}
