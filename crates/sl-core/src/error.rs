//! Error types for sl-core

use thiserror::Error;

/// Core error type for sledger
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Config file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Migration root directory not found
    #[error("[E003] Migration directory not found: {path}")]
    LedgerRootNotFound { path: String },

    /// E004: Failed to decode a migration file
    #[error("[E004] Failed to parse migration file {path}: {details}")]
    MigrationParseError { path: String, details: String },

    /// E005: Migration id does not match its file name
    #[error("[E005] {name} has mismatching ID {id}")]
    MigrationIdMismatch { name: String, id: String },

    /// E006: Change has no statements for the active backend
    #[error("[E006] Change {position} of migration {migration} has no {backend} statements")]
    UnsupportedBackend {
        migration: String,
        position: usize,
        backend: String,
    },

    /// E007: `${` without a closing brace
    #[error("[E007] Found '${{' without a terminating '}}' in: {statement}")]
    UnterminatedVariable { statement: String },

    /// E008: Referenced environment variable is unset or empty
    #[error("[E008] Environment variable [{name}] is not set")]
    UndefinedVariable { name: String },

    /// E009: Invalid file name for a migration
    #[error("[E009] Invalid migration file name: {path}")]
    InvalidFileName { path: String },

    /// E010: A `DATABASE_*` variable cannot form a connection string
    #[error("[E010] Invalid {key}: {message}")]
    InvalidDatabaseEnv { key: &'static str, message: String },

    /// IO error with path context
    #[error("IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
