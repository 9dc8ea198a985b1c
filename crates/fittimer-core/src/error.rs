//! Core error types for fittimer-core.
//!
//! Timer engines never fail: redundant lifecycle calls are no-ops and
//! collaborator failures are isolated. Errors only arise at the edges:
//! validating interval configs, talking to SQLite, and reading config files.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fittimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

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
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Interval config outside the engine's defined domain
    #[error("Invalid interval config: {field} {message}")]
    InvalidIntervalConfig {
        field: &'static str,
        message: String,
    },

    /// Unknown exercise name
    #[error("Unknown exercise type: {0}")]
    UnknownExercise(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Failures reported by a feedback sink.
///
/// Engines log and drop these; they never reach timer state.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// Output device (speaker, vibration motor, terminal) not available
    #[error("Feedback output unavailable: {0}")]
    Unavailable(String),

    /// The consumer side of a cue channel has gone away
    #[error("Feedback channel closed")]
    Closed,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rusqlite_errors_map_to_query_failed() {
        let err: CoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, CoreError::Database(DatabaseError::QueryFailed(_))));
    }

    #[test]
    fn validation_error_message_names_field() {
        let err = ValidationError::InvalidIntervalConfig {
            field: "rounds",
            message: "must be at least 1".into(),
        };
        assert_eq!(err.to_string(), "Invalid interval config: rounds must be at least 1");
    }
}
