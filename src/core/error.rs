//! Configuration errors
//!
//! The simulation itself cannot fail once running; everything that can go
//! wrong is caught while loading or validating configuration.

use thiserror::Error;

/// Errors that can occur while building a population
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializeError(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializeError(String),
    /// File extension is neither `.ron` nor `.json`
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
    /// A migration pattern name with no evaluator
    #[error("Unknown migration pattern: {0}")]
    UnknownPattern(String),
    /// A numeric parameter outside its allowed domain
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
