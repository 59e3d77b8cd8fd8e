//! Common error types for cinecheck

use thiserror::Error;

/// Common result type for cinecheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across cinecheck crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed catalog input (unreadable CSV, bad row shape)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
