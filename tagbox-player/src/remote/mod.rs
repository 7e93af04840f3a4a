//! Remote playback service capability
//!
//! The streaming service itself is opaque to the jukebox. The controller
//! only needs the five operations below, all addressed to the one configured
//! output device, and all fallible with a categorized [`ServiceError`] so
//! recovery can differ per category.

mod http;

pub use http::HttpPlaybackService;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Remote playback service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure (connect, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials rejected by the service
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Target output device unknown or offline
    #[error("Device unavailable: {0}")]
    Device(String),

    /// Service answered with an unexpected status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not parse
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience Result type for service calls
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Snapshot of what the output device is doing
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackStatus {
    /// Device volume in percent
    pub volume_percent: u8,
    /// Whether the device reports active playback
    #[serde(default)]
    pub is_playing: bool,
}

/// Control surface of the remote playback service
///
/// Implementations are scoped to one output device; the controller never
/// names a device explicitly.
#[async_trait]
pub trait PlaybackService: Send + Sync {
    /// Route playback to the output device; `resume` starts it immediately
    async fn transfer_playback(&self, resume: bool) -> ServiceResult<()>;

    /// Start playing the given context URI on the output device
    async fn start_playback(&self, context_uri: &str) -> ServiceResult<()>;

    /// Pause playback on the output device
    async fn pause_playback(&self) -> ServiceResult<()>;

    /// Set device volume in percent, 0-100
    async fn set_volume(&self, percent: u8) -> ServiceResult<()>;

    /// Query the current playback state of the output device
    async fn current_playback(&self) -> ServiceResult<PlaybackStatus>;
}
