//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias used across stores, repositories and upgraders
pub type AppResult<T> = Result<T, AppError>;

/// Helper function to create a storage error
pub fn storage_error(msg: impl Into<String>) -> AppError {
    AppError::Storage(msg.into())
}

/// Helper function to create a precondition error
pub fn precondition_error(msg: impl Into<String>) -> AppError {
    AppError::Precondition(msg.into())
}
