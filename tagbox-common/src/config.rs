//! Configuration loading and config file resolution

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, TagId};

/// Remote playback bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the playback bridge, e.g. `http://localhost:9090`
    pub base_url: String,

    /// Bearer token presented to the bridge. May be overridden by the
    /// `TAGBOX_TOKEN` environment variable or the `--token` flag.
    #[serde(default)]
    pub token: Option<String>,

    /// Bound on any single remote call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Input handling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Rejection window shared by the transport and volume buttons,
    /// in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Tag reader poll interval, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// One album row from the `[[albums]]` tables of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumConfig {
    /// Catalog index, unique across all albums
    pub index: u32,
    /// Tag provisioned for this album, unique across all albums
    pub tag_id: TagId,
    /// Context URI handed to the playback service
    pub uri: String,
    /// Album artist
    pub artist: String,
    /// Album title
    pub title: String,
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JukeboxConfig {
    /// Output device the playback bridge drives
    pub device: String,

    /// Remote playback bridge settings
    pub remote: RemoteConfig,

    /// Input handling settings
    #[serde(default)]
    pub input: InputConfig,

    /// Album catalog entries
    #[serde(default)]
    pub albums: Vec<AlbumConfig>,
}

impl JukeboxConfig {
    /// Load and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

/// Config file resolution following priority order:
/// 1. Command-line argument / `TAGBOX_CONFIG` environment variable
///    (both arrive through clap, highest priority)
/// 2. `~/.config/tagbox/config.toml`
/// 3. `/etc/tagbox/config.toml` (fallback)
pub fn resolve_config_file(cli_arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = dirs::config_dir().map(|d| d.join("tagbox").join("config.toml")) {
        if path.exists() {
            tracing::debug!("using user config {}", path.display());
            return Ok(path);
        }
    }

    let system_config = PathBuf::from("/etc/tagbox/config.toml");
    if system_config.exists() {
        tracing::debug!("using system config {}", system_config.display());
        return Ok(system_config);
    }

    Err(Error::Config(
        "no config file found; pass --config or set TAGBOX_CONFIG".to_string(),
    ))
}
