//! Configuration loading and data folder resolution
//!
//! Both binaries read the same optional TOML file. Every field has a default,
//! so a missing file (or a missing section) is not an error.
//!
//! Data folder resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `VERSE_DATA_DIR` environment variable
//! 3. `data_dir` in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable overriding the data folder
pub const DATA_DIR_ENV: &str = "VERSE_DATA_DIR";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "VERSE_CONFIG";

/// Directory name used under the platform config/data folders
pub const APP_DIR_NAME: &str = "verse";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding `poems.json` and `progress.json`
    pub data_dir: Option<PathBuf>,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix
    pub api_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Retries after the first attempt, network failures only
    pub max_retries: u32,
    /// Backoff unit; the n-th retry waits n times this
    pub retry_delay_ms: u64,
    pub case_sensitive: bool,
    pub require_punctuation: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api".to_string(),
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            case_sensitive: false,
            require_punctuation: false,
        }
    }
}

impl TomlConfig {
    /// Load a config file
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from an explicit path, or the default location
    ///
    /// Problems are logged and replaced by defaults so a bad config file
    /// never prevents startup.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };
        let Some(path) = path else {
            warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring config file");
                Self::default()
            }
        }
    }
}

/// `$VERSE_CONFIG`, or `<config dir>/verse/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Platform folder for client-side state such as the identity file
pub fn client_state_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Resolve the data folder following the documented priority order
pub fn resolve_data_dir(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.data_dir {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_data_dir()
}

/// Get OS-dependent default data folder path
pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/verse
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib/verse"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/verse
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/verse"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\verse
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\verse"))
    } else {
        PathBuf::from("./verse_data")
    }
}
