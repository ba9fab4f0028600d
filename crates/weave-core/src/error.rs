//! Core error types for weave-core.
//!
//! Insufficient interaction history is not an error: it is reported as
//! [`crate::tier_fit::TierFit::InsufficientData`]. The variants here cover
//! lookups against the data-access layer, configuration, and snapshot
//! validation at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for weave-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A record referenced by id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    /// Shorthand for an unknown friend id.
    pub fn friend_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind: "friend",
            id: id.into(),
        }
    }

    /// True when this error is a not-found lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors raised when loading records at the data-access boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A record points at a friend that is not in the snapshot
    #[error("{record} '{record_id}' references unknown friend '{friend_id}'")]
    DanglingReference {
        record: &'static str,
        record_id: String,
        friend_id: String,
    },

    /// Two records share an id
    #[error("Duplicate {record} id: {id}")]
    DuplicateId { record: &'static str, id: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
