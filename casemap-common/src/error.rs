//! Shared error type for casemap crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the shared layer: storage, files, configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable or invalid `casemap.toml`, bad log level
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invariant broken at runtime (e.g. store returned too few ids)
    #[error("Internal error: {0}")]
    Internal(String),
}
