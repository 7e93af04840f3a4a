//! Common error types for tagbox

use thiserror::Error;

/// Common result type for tagbox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the tagbox binaries
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identifier that is not exactly 16 ASCII digits
    #[error("Invalid tag id: {0}")]
    InvalidTagId(String),
}
