//! Error types for tagbox-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

use crate::remote::ServiceError;

/// Main error type for the tagbox-player crate
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog construction errors (duplicate identifiers)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Remote playback service errors
    #[error("Remote service error: {0}")]
    Service(#[from] ServiceError),

    /// Errors from the shared tagbox library
    #[error(transparent)]
    Common(#[from] tagbox_common::Error),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using tagbox-player Error
pub type Result<T> = std::result::Result<T, Error>;
