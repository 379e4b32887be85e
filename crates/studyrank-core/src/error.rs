//! Core error types for studyrank-core.
//!
//! One thiserror enum per concern, folded into a single `CoreError`
//! umbrella via `#[from]` conversions.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyrank-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tier ladder definition errors
    #[error("Ladder error: {0}")]
    Ladder(#[from] LadderError),

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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Row lookup returned nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Static tier ladder invariant violations.
///
/// These are configuration errors in the sense of the progression contract:
/// a ladder that fails any of these must reject startup, never reach
/// `advance`.
#[derive(Error, Debug)]
pub enum LadderError {
    /// Ladder has no tiers
    #[error("Tier ladder is empty")]
    Empty,

    /// First tier must start at zero points
    #[error("First tier '{name}' must have floor 0, got {floor}")]
    NonZeroBase { name: String, floor: i64 },

    /// Each tier's point band must be non-empty
    #[error("Tier '{name}' has floor {floor} >= ceiling {ceiling}")]
    EmptyBand {
        name: String,
        floor: i64,
        ceiling: i64,
    },

    /// Adjacent tiers must share a cutline
    #[error("Tier '{name}' floor {floor} does not match previous ceiling {previous_ceiling}")]
    CutlineGap {
        name: String,
        floor: i64,
        previous_ceiling: i64,
    },

    /// Loss clamp must not be positive
    #[error("Tier '{name}' has positive min_loss {min_loss}")]
    PositiveMinLoss { name: String, min_loss: i64 },

    /// Gain clamp must not be negative
    #[error("Tier '{name}' has negative max_gain {max_gain}")]
    NegativeMaxGain { name: String, max_gain: i64 },

    /// The bottom tier can never demote, so it must carry the floor flag
    #[error("First tier '{name}' must have avoid_fall set")]
    FallibleBase { name: String },
}

/// Caller contract violations on `advance` inputs.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Tier index outside the ladder
    #[error("Tier index {index} out of range for ladder of {len} tiers")]
    TierOutOfRange { index: usize, len: usize },

    /// Study minutes must be non-negative
    #[error("Study minutes must be >= 0, got {minutes}")]
    NegativeMinutes { minutes: i64 },

    /// Felt minutes must be non-negative
    #[error("Felt minutes must be >= 0, got {minutes}")]
    NegativeFeltMinutes { minutes: i64 },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
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

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
