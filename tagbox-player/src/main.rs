//! Jukebox daemon - main entry point
//!
//! Wires the catalog, the playback controller, the input sources, and the
//! remote playback bridge together and runs until interrupted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagbox_common::config::{self, JukeboxConfig};
use tagbox_common::events::EventBus;
use tagbox_player::catalog::Catalog;
use tagbox_player::controller::{Controller, ControllerSettings};
use tagbox_player::dispatch;
use tagbox_player::hardware::{console, LogIndicator};
use tagbox_player::remote::HttpPlaybackService;

/// Command-line arguments for tagbox-player
#[derive(Parser, Debug)]
#[command(name = "tagbox-player")]
#[command(about = "RFID jukebox daemon")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TAGBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Bearer token for the playback bridge (overrides the config file)
    #[arg(long, env = "TAGBOX_TOKEN")]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagbox_player=debug,tagbox_common=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = config::resolve_config_file(args.config.as_deref())
        .context("Failed to locate configuration file")?;
    info!("Loading configuration from {}", config_path.display());

    let mut config = JukeboxConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(token) = args.token {
        config.remote.token = Some(token);
    }

    let catalog =
        Catalog::from_config(&config.albums).context("Failed to build album catalog")?;
    info!("Loaded catalog: {} albums", catalog.len());

    let service = HttpPlaybackService::new(
        &config.remote.base_url,
        &config.device,
        config.remote.token.clone(),
        Duration::from_millis(config.remote.timeout_ms),
    )
    .context("Failed to build playback bridge client")?;
    info!(
        "Playback bridge: {} (device {})",
        config.remote.base_url, config.device
    );

    let events = EventBus::new(100);
    spawn_event_logger(&events);

    let settings = ControllerSettings {
        debounce: Duration::from_millis(config.input.debounce_ms),
        call_timeout: Duration::from_millis(config.remote.timeout_ms),
    };
    let controller = Controller::new(service, events.clone(), settings);

    let (input_tx, input_rx) = dispatch::input_channel();
    tokio::spawn(console::run_console_input(input_tx));
    let dispatch_task = tokio::spawn(dispatch::run_dispatch(
        input_rx,
        controller,
        catalog,
        LogIndicator,
        events.clone(),
    ));

    info!("Jukebox ready; present a tag, or type an id / toggle / up / down");

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutting down");
        }
        _ = dispatch_task => {
            info!("Input sources ended, shutting down");
        }
    }

    Ok(())
}

/// Mirror the event stream into the log for diagnostics
fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            debug!(?event, "player event");
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
