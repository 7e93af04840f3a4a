//! Console peripheral simulation
//!
//! Stands in for the RFID HAT and the GPIO buttons during development: each
//! stdin line is one input edge. A line holding a tag identifier simulates
//! presenting a card; `toggle`, `up` and `down` simulate the buttons.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatch::InputEvent;
use crate::Result;

use super::{FeedbackIndicator, TagReader};

/// Duration the confirmation light stays on
const SIGNAL_ON: Duration = Duration::from_millis(200);
/// Cooldown after the light before the next signal may fire
const SIGNAL_COOLDOWN: Duration = Duration::from_millis(300);

/// Reads simulated input edges from stdin and posts them on the input
/// channel. Returns when stdin closes or the channel is dropped.
pub async fn run_console_input(tx: mpsc::Sender<InputEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let event = match line {
            "" => continue,
            "toggle" => InputEvent::ToggleTransport,
            "up" => InputEvent::VolumeUp,
            "down" => InputEvent::VolumeDown,
            raw => InputEvent::TagRead {
                raw: raw.to_string(),
            },
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
    debug!("console input ended");
}

/// Console stand-in for the RFID HAT: polls read one stdin line, writes are
/// acknowledged immediately. Used by the provisioning utility.
pub struct ConsoleReader {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagReader for ConsoleReader {
    async fn poll(&mut self) -> Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()))
    }

    async fn write_id(&mut self, id: &str) -> Result<bool> {
        info!(id, "simulated tag write");
        Ok(true)
    }
}

/// Logs the confirmation signal instead of driving the LED and buzzer pins
#[derive(Debug, Clone, Copy, Default)]
pub struct LogIndicator;

#[async_trait]
impl FeedbackIndicator for LogIndicator {
    async fn signal(&self) {
        info!("confirmation signal");
        // Model the fixed light + cooldown cycle without holding up the
        // dispatch loop.
        tokio::spawn(async {
            tokio::time::sleep(SIGNAL_ON).await;
            debug!("confirmation signal off");
            tokio::time::sleep(SIGNAL_COOLDOWN).await;
        });
    }
}
