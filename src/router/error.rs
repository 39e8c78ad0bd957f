//! Route registration errors.

use thiserror::Error;

/// Errors raised while compiling or registering a route.
///
/// These are startup errors: an application with an invalid route table
/// never starts serving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The path pattern is empty or malformed.
    #[error("Invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
