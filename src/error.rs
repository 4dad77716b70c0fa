//! Error types for the welding-technique evaluation engine.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session API called outside its valid lifecycle phase
    #[error("Session state error: {0}")]
    SessionState(String),

    /// Technique identifier not present in the registry
    #[error("Unknown technique: {0}")]
    UnknownTechnique(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
