//! Error kinds for the index engine (spec §7).

use thiserror::Error;

/// Crate-wide result alias, mirroring `rdms::core::Result`.
pub type Result<T> = std::result::Result<T, Error>;

/// The engine's public error type. Every public operation returns either a
/// result or one of these; no variant carries a stack trace, only the
/// offending index name and a human-readable reason.
#[derive(Debug, Error)]
pub enum Error {
    #[error("index {name}: not found")]
    NotFound { name: String },

    #[error("index {name}: already exists")]
    AlreadyExists { name: String },

    #[error("index {name}: unsupported operation: {reason}")]
    Unsupported { name: String, reason: String },

    #[error("index {name}: uniqueness violation: {reason}")]
    UniquenessViolation { name: String, reason: String },

    #[error("index {name}: cardinality exceeded: {reason}")]
    CardinalityExceeded { name: String, reason: String },

    #[error("index {name}: operation timed out: {reason}")]
    Timeout { name: String, reason: String },

    #[error("index {name}: corruption detected: {reason}")]
    Corruption { name: String, reason: String },

    /// Internal only: a condition/predicate evaluator raised. Never escapes
    /// to a public caller — callers observe `false` for the row plus a
    /// counter increment (§3.3, §7).
    #[error("index {name}: evaluation error: {reason}")]
    EvaluationError { name: String, reason: String },

    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound { name: name.into() }
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Error::AlreadyExists { name: name.into() }
    }

    pub fn unsupported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unsupported {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn uniqueness_violation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UniquenessViolation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn cardinality_exceeded(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CardinalityExceeded {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Timeout {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn corruption(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Corruption {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn evaluation_error(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::EvaluationError {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The index name carried by this error, if any (`Fmt` has none).
    pub fn index_name(&self) -> Option<&str> {
        match self {
            Error::NotFound { name }
            | Error::AlreadyExists { name }
            | Error::Unsupported { name, .. }
            | Error::UniquenessViolation { name, .. }
            | Error::CardinalityExceeded { name, .. }
            | Error::Timeout { name, .. }
            | Error::Corruption { name, .. }
            | Error::EvaluationError { name, .. } => Some(name),
            Error::Fmt(_) => None,
        }
    }
}
