//! Error types for Astrolabe layout operations.
//!
//! Errors are fatal: a call that returns one produces no geometry at all.
//! Problems in the diagram model that layout can recover from are reported as
//! [`Diagnostic`](crate::diagnostic::Diagnostic)s on the result instead.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// The main error type for Astrolabe operations.
///
/// # Size Limits
///
/// [`LayoutError::SizeLimitExceeded`] and [`LayoutError::NestingLimitExceeded`]
/// are raised before any layout work starts, so callers can reject oversized
/// input cheaply.
///
/// # Invariant Violations
///
/// [`LayoutError::InvariantViolation`] means the engine produced inconsistent
/// intermediate state, for example a rank assignment contradicting an edge
/// direction after cycle breaking. It points at a bug in the engine, never at
/// bad input.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Diagram has {elements} elements, exceeding the limit of {limit}")]
    SizeLimitExceeded { elements: usize, limit: usize },

    #[error("Nesting depth {depth} exceeds the limit of {limit}")]
    NestingLimitExceeded { depth: usize, limit: usize },

    #[error("Internal layout invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LayoutError {
    /// Create an `InvariantViolation` error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Returns true for the size-limit class of errors.
    pub fn is_size_limit(&self) -> bool {
        matches!(
            self,
            Self::SizeLimitExceeded { .. } | Self::NestingLimitExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_message() {
        let err = LayoutError::SizeLimitExceeded {
            elements: 12,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "Diagram has 12 elements, exceeding the limit of 10"
        );
        assert!(err.is_size_limit());
    }

    #[test]
    fn test_config_error_converts() {
        let err: LayoutError = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, LayoutError::Config(ConfigError::Validation(_))));
        assert!(!err.is_size_limit());
    }

    #[test]
    fn test_invariant_helper() {
        let err = LayoutError::invariant("rank order");
        assert_eq!(
            err.to_string(),
            "Internal layout invariant violated: rank order"
        );
    }
}
