//! # Link Configuration
//!
//! How the companion reaches the desktop peer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SENNADA_PEER_PORT=9000                                             │
//! │     SENNADA_CONNECT_TIMEOUT_SECS=10                                    │
//! │     SENNADA_SETTINGS_PATH=/data/settings.toml                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sennada/link.toml (Linux)                                │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # link.toml
//! [peer]
//! default_port = 9000
//! connect_timeout_secs = 10
//!
//! [settings]
//! path = "/data/sennada/settings.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SessionError, SessionResult};

/// Port the desktop POS listens on.
pub const DEFAULT_PEER_PORT: u16 = 9000;

const PEER_SCHEME: &str = "ws";

// =============================================================================
// Peer Settings
// =============================================================================

/// Where and how to reach the desktop peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSettings {
    /// Port applied when the operator enters a bare host.
    #[serde(default = "default_port")]
    pub default_port: u16,

    /// WebSocket handshake timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PEER_PORT
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for PeerSettings {
    fn default() -> Self {
        PeerSettings {
            default_port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl PeerSettings {
    /// Handshake timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Turns what the operator typed or scanned into a WebSocket URL.
    ///
    /// ## Resolution
    /// ```text
    /// "192.168.1.20"             → ws://192.168.1.20:9000/
    /// "192.168.1.20:9100"        → ws://192.168.1.20:9100/
    /// "ws://127.0.0.1:9000"      → ws://127.0.0.1:9000/
    /// "http://192.168.1.20"      → InvalidAddress (scheme)
    /// ""                         → InvalidAddress
    /// ```
    pub fn resolve(&self, address: &str) -> SessionResult<Url> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SessionError::InvalidAddress("address is empty".into()));
        }

        let candidate = if address.contains("://") {
            address.to_string()
        } else {
            format!("{}://{}", PEER_SCHEME, address)
        };

        let mut url = Url::parse(&candidate)?;

        if url.scheme() != PEER_SCHEME {
            return Err(SessionError::InvalidAddress(format!(
                "peer address must use {}://, got {}://",
                PEER_SCHEME,
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(SessionError::InvalidAddress(format!(
                "no host in '{}'",
                address
            )));
        }
        if url.port().is_none() {
            url.set_port(Some(self.default_port)).map_err(|_| {
                SessionError::InvalidAddress(format!("cannot set port on '{}'", address))
            })?;
        }

        Ok(url)
    }
}

// =============================================================================
// Settings Location
// =============================================================================

/// Where the remembered address is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsLocation {
    /// Explicit settings file; defaults to the platform config dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Link Configuration
// =============================================================================

/// Complete link configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default)]
    pub peer: PeerSettings,

    #[serde(default)]
    pub settings: SettingsLocation,
}

impl LinkConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (link.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading link config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
                config = toml::from_str(&contents)
                    .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load link config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        if self.peer.default_port == 0 {
            return Err(SessionError::InvalidConfig(
                "default_port must be greater than 0".into(),
            ));
        }

        if self.peer.connect_timeout_secs == 0 {
            return Err(SessionError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("SENNADA_PEER_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding peer port from environment");
                    self.peer.default_port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid SENNADA_PEER_PORT"),
            }
        }

        if let Ok(secs) = std::env::var("SENNADA_CONNECT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.peer.connect_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid SENNADA_CONNECT_TIMEOUT_SECS"),
            }
        }

        if let Ok(path) = std::env::var("SENNADA_SETTINGS_PATH") {
            debug!(path = %path, "Overriding settings path from environment");
            self.settings.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dz", "sennada", "sennada")
            .map(|dirs| dirs.config_dir().join("link.toml"))
    }

    /// File holding the remembered peer address.
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings.path.clone().or_else(|| {
            directories::ProjectDirs::from("dz", "sennada", "sennada")
                .map(|dirs| dirs.config_dir().join("settings.toml"))
        })
    }
}
