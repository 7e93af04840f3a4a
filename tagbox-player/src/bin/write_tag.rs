//! Tag provisioning utility
//!
//! Writes an album identifier to an RFID card so it can trigger playback.
//!
//! **Usage:**
//! ```bash
//! tagbox-write <ID>
//! ```
//!
//! The id must be exactly 16 digits. The utility keeps attempting the write
//! until a card is in range, then confirms with the feedback indicator.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagbox_common::TagId;
use tagbox_player::hardware::{ConsoleReader, FeedbackIndicator, LogIndicator, TagReader};

/// Tag provisioning utility
#[derive(Parser, Debug)]
#[command(name = "tagbox-write")]
#[command(about = "Write a tag identifier to an RFID card")]
#[command(version)]
struct Args {
    /// 16-digit numeric identifier to write
    id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagbox_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let id = match TagId::parse(&args.id) {
        Ok(id) => id,
        Err(_) => {
            eprintln!("Error: ID must be numerical and exactly 16 characters in length!");
            std::process::exit(1);
        }
    };

    let mut reader = ConsoleReader::new();
    let indicator = LogIndicator;

    println!("Ready to write to RFID card...");
    loop {
        if reader.write_id(id.as_str()).await? {
            indicator.signal().await;
            println!("Success: {id} saved to card");
            break;
        }
    }

    Ok(())
}
