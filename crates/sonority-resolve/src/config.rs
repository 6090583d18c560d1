use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ResolveError, ResolveResult};
use crate::recommender::DEFAULT_SAMPLE_SIZE;
use crate::selection::SelectionPolicy;

/// Configuration for sonority.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (SONO_* prefix)
/// 3. Config file (~/.config/sonority/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Spotify app client ID.
    ///
    /// Can be set via:
    /// - ENV: SONO_SPOTIFY_CLIENT_ID
    /// - Config: spotify_client_id = "..."
    #[serde(default)]
    pub spotify_client_id: Option<String>,

    /// Spotify app client secret.
    ///
    /// Can be set via:
    /// - ENV: SONO_SPOTIFY_CLIENT_SECRET
    /// - Config: spotify_client_secret = "..."
    #[serde(default)]
    pub spotify_client_secret: Option<String>,

    /// Path to the SQLite catalog.
    ///
    /// Can be set via:
    /// - CLI: --catalog /path/to/catalog.db
    /// - ENV: SONO_CATALOG_PATH
    /// - Config: catalog_path = "/path/to/catalog.db"
    /// - Default: ~/.local/share/sonority/catalog.db
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// How a name search picks its track: "best_match", "first", or "nth:N".
    #[serde(default)]
    pub selection: SelectionPolicy,

    /// Number of recommendations shown per query.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging settings handed to the CLI's logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_coloured")]
    pub coloured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            coloured: default_coloured(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify_client_id: None,
            spotify_client_secret: None,
            catalog_path: default_catalog_path(),
            selection: SelectionPolicy::default(),
            sample_size: default_sample_size(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/sonority/config.toml
    /// Reads environment variables with SONO_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new()
            .context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path.to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder.add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("sono");
        builder.add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom catalog path.
    ///
    /// This is used when the --catalog CLI flag is provided.
    pub fn load_with_catalog_path(catalog_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.catalog_path = catalog_path;
        Ok(config)
    }

    /// Spotify `(client_id, client_secret)`, if both are set and non-empty.
    pub fn spotify_credentials(&self) -> ResolveResult<(&str, &str)> {
        match (self.spotify_client_id.as_deref(), self.spotify_client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(ResolveError::MissingCredentials),
        }
    }
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_coloured() -> bool {
    true
}

/// Get the default catalog path.
///
/// Returns: ~/.local/share/sonority/catalog.db (or platform equivalent)
fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sonority")
        .join("catalog.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/sonority/config.toml
/// - macOS: ~/Library/Application Support/sonority/config.toml
/// - Windows: %APPDATA%\sonority\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sonority")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Sonority Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (SONO_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Spotify app credentials (client-credentials flow)
# Required to resolve seed songs to audio features
#
# Create an app at: https://developer.spotify.com/dashboard
#
# Can also be set via:
# - Environment: SONO_SPOTIFY_CLIENT_ID / SONO_SPOTIFY_CLIENT_SECRET
spotify_client_id = "your-client-id-here"
spotify_client_secret = "your-client-secret-here"

# Path to the SQLite catalog
#
# Populate it with: sonority catalog import tracks.csv
#
# Can also be set via:
# - CLI: sonority --catalog /custom/path.db recommend "..."
# - Environment: SONO_CATALOG_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#catalog_path = "/path/to/custom/catalog.db"

# How a song name picks one search result:
# "best_match" (closest title/artist), "first", or "nth:N" (1-based)
selection = "best_match"

# Number of recommendations shown per query (sampled from the top 50)
sample_size = 10

[logging]
# trace, debug, info, warn, error
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config())
        .context("Failed to write config file")?;

    Ok(true)
}
