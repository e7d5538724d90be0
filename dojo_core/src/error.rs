//! Error types for the dojo_core library.

use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dojo_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout lookup failure
    #[error("Workout {0} not found")]
    WorkoutNotFound(Uuid),

    /// Session lookup failure
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    /// Optimistic concurrency check failed on an event stream
    #[error("Version conflict on stream {aggregate_id}: expected {expected}, found {actual}")]
    VersionConflict {
        aggregate_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
