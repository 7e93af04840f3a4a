//! Hardware capability traits
//!
//! The RFID HAT, the buttons, and the LED/buzzer pair are external
//! peripherals; the daemon only depends on the traits below. The shipped
//! implementations simulate the peripherals on a console (see [`console`]),
//! which is also how the daemon runs on a development machine. A deployment
//! with real hardware supplies its own implementations.

pub mod console;

pub use console::{ConsoleReader, LogIndicator};

use async_trait::async_trait;

use crate::Result;

/// RFID tag reader capability
#[async_trait]
pub trait TagReader: Send {
    /// Poll for a present tag, returning its raw identifier when a card is
    /// in front of the reader
    async fn poll(&mut self) -> Result<Option<String>>;

    /// Write an identifier to a present tag. Returns false when no tag was
    /// within range to accept the write.
    async fn write_id(&mut self, id: &str) -> Result<bool>;
}

/// Confirmation light + buzzer capability
#[async_trait]
pub trait FeedbackIndicator: Send + Sync {
    /// Fire the confirmation cycle. Returns promptly; the cycle itself runs
    /// in the background.
    async fn signal(&self);
}
