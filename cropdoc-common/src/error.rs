//! Common error types for CropDoc

use thiserror::Error;

/// Common result type for CropDoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CropDoc services
///
/// The first six variants are the caller-visible failure taxonomy: handlers
/// branch on them to pick an HTTP status, clients branch on the serialized
/// code. `Conflict` is the only kind a caller is expected to retry.
#[derive(Error, Debug)]
pub enum Error {
    /// Credential missing or invalid at the account directory boundary
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not permitted (wrong role, inactive account, or ownership mismatch)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record's current status does not permit the requested transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Required field missing or empty
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Concurrent-write race detected at the persistence boundary
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
