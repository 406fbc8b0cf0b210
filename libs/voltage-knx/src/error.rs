//! Error types for voltage-knx

use thiserror::Error;

/// Failure of a single binding configuration line.
///
/// A bad line only affects its own item; callers log the message and move on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Malformed refresh parameter or group address text
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Duplicate address, second readable marker, bad refresh value, too many datapoints
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// DPT could not be inferred or is not supported
    #[error("Unresolved type: {0}")]
    UnresolvedType(String),
}

impl BindingError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    pub fn unresolved(msg: impl Into<String>) -> Self {
        Self::UnresolvedType(msg.into())
    }

    /// Human-readable message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax(msg) | Self::ConstraintViolation(msg) | Self::UnresolvedType(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, BindingError>;
