//! Input dispatch
//!
//! Hardware edges and tag reads are posted onto one mpsc channel; a single
//! consumer task applies them to the controller. The consumer owns the
//! controller outright, so controller state and remote calls never race and
//! inputs are serialized in arrival order.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use tagbox_common::events::{EventBus, PlayerEvent};
use tagbox_common::TagId;

use crate::catalog::Catalog;
use crate::controller::Controller;
use crate::hardware::{FeedbackIndicator, TagReader};
use crate::remote::PlaybackService;

/// Capacity of the input-event channel. Inputs are human-paced; a small
/// buffer absorbs bursts without unbounded growth.
pub const INPUT_CHANNEL_CAPACITY: usize = 16;

/// One hardware input, as posted by the input sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Raw identifier read from a presented tag
    TagRead { raw: String },
    /// Transport (pause/resume) button edge
    ToggleTransport,
    /// Volume up button edge
    VolumeUp,
    /// Volume down button edge
    VolumeDown,
}

/// Create the input channel shared by all input sources
pub fn input_channel() -> (mpsc::Sender<InputEvent>, mpsc::Receiver<InputEvent>) {
    mpsc::channel(INPUT_CHANNEL_CAPACITY)
}

/// Dispatch loop: single consumer of input events and exclusive owner of
/// the controller. Returns the controller once every sender is gone.
pub async fn run_dispatch<S, F>(
    mut rx: mpsc::Receiver<InputEvent>,
    mut controller: Controller<S>,
    catalog: Catalog,
    indicator: F,
    events: EventBus,
) -> Controller<S>
where
    S: PlaybackService,
    F: FeedbackIndicator,
{
    while let Some(event) = rx.recv().await {
        match event {
            InputEvent::TagRead { raw } => {
                handle_tag_read(&raw, &mut controller, &catalog, &indicator, &events).await;
            }
            InputEvent::ToggleTransport => controller.toggle_transport().await,
            InputEvent::VolumeUp => controller.volume_up().await,
            InputEvent::VolumeDown => controller.volume_down().await,
        }
    }
    debug!("input channel closed, dispatch loop ending");
    controller
}

async fn handle_tag_read<S, F>(
    raw: &str,
    controller: &mut Controller<S>,
    catalog: &Catalog,
    indicator: &F,
    events: &EventBus,
) where
    S: PlaybackService,
    F: FeedbackIndicator,
{
    let tag_id = match TagId::parse(raw) {
        Ok(id) => id,
        Err(err) => {
            warn!(%err, "dropping malformed tag read");
            return;
        }
    };
    debug!(%tag_id, "read card");

    match catalog.lookup(&tag_id) {
        Some(entry) => {
            // Confirmation fires before the remote call so operator feedback
            // is not delayed by network latency.
            indicator.signal().await;
            let entry = entry.clone();
            controller.play(&entry, false).await;
        }
        None => {
            warn!(%tag_id, "unknown id");
            events.emit_lossy(PlayerEvent::UnknownTag {
                raw: tag_id.to_string(),
                timestamp: Utc::now(),
            });
        }
    }
}

/// Poll the tag reader and post reads onto the input channel.
///
/// Runs until the channel closes. Reader errors are logged and polling
/// continues on the next tick.
pub async fn run_tag_poll<R: TagReader>(
    mut reader: R,
    tx: mpsc::Sender<InputEvent>,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        match reader.poll().await {
            Ok(Some(raw)) => {
                if tx.send(InputEvent::TagRead { raw }).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "tag reader poll failed"),
        }
    }
    debug!("input channel closed, tag poll ending");
}
