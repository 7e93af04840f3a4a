//! Event types for the tagbox event system
//!
//! Provides the shared event enum and EventBus for the jukebox daemon.
//! Components emit [`PlayerEvent`]s on the bus; consumers (currently the
//! operator diagnostics logger) subscribe independently and see the same
//! stream. Events can be serialized for any future remote-monitoring
//! surface.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Playback phase enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// Playback is running on the output device
    Playing,
    /// No playback, or playback suspended
    Paused,
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::Playing => write!(f, "Playing"),
            PlaybackPhase::Paused => write!(f, "Paused"),
        }
    }
}

/// Jukebox event types
///
/// Events are broadcast via EventBus and carry their emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback phase changed (Playing ↔ Paused)
    PlaybackStateChanged {
        /// Phase before the change
        old_phase: PlaybackPhase,
        /// Phase after the change
        new_phase: PlaybackPhase,
        /// When the phase changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A tag read selected an album and playback was started
    AlbumStarted {
        /// Catalog index of the album
        index: u32,
        /// Album artist
        artist: String,
        /// Album title
        title: String,
        /// When playback started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Device volume changed through the volume buttons
    VolumeChanged {
        /// New volume in percent
        volume: u8,
        /// When the volume changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A well-formed tag was read that maps to no catalog entry
    UnknownTag {
        /// The identifier as read from the card
        raw: String,
        /// When the tag was read
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A remote service call failed; the controller reverted to a safe state
    RemoteCallFailed {
        /// Which capability failed (e.g. "start_playback")
        operation: String,
        /// Failure description from the service layer
        reason: String,
        /// When the failure was observed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast bus for [`PlayerEvent`]
///
/// Thin wrapper over `tokio::sync::broadcast`: every subscriber receives
/// every event emitted after its subscription. Slow subscribers lag and
/// lose the oldest buffered events rather than blocking emitters.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscriber is
    /// listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
