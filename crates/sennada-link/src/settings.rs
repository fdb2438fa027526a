//! # Persisted Settings
//!
//! The last peer address that connected successfully, kept across app
//! restarts so the connect screen can pre-fill it. It is never used to
//! connect automatically.
//!
//! ## File Format
//! ```toml
//! # settings.toml
//! [peer]
//! remote_address = "192.168.1.20"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Settings Store Trait
// =============================================================================

/// Key-value storage for the remembered peer address.
///
/// ## Implementations
/// - [`FileSettings`] - TOML file in the app config dir
/// - [`MemorySettings`] - process-local, for tests and shells without storage
pub trait SettingsStore: Send + Sync {
    /// Returns the remembered address, if any.
    fn load_remote_address(&self) -> SessionResult<Option<String>>;

    /// Remembers `address` verbatim.
    fn save_remote_address(&self, address: &str) -> SessionResult<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(default)]
    peer: PersistedPeer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedPeer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_address: Option<String>,
}

// =============================================================================
// File Settings
// =============================================================================

/// Settings persisted to a TOML file.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSettings { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> SessionResult<PersistedSettings> {
        if !self.path.exists() {
            debug!(path = ?self.path, "Settings file not found");
            return Ok(PersistedSettings::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }
}

impl SettingsStore for FileSettings {
    fn load_remote_address(&self) -> SessionResult<Option<String>> {
        Ok(self.read()?.peer.remote_address)
    }

    fn save_remote_address(&self, address: &str) -> SessionResult<()> {
        // Keep whatever else a newer build may have written
        let mut settings = self.read().unwrap_or_default();
        settings.peer.remote_address = Some(address.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(&settings)?;
        std::fs::write(&self.path, contents)?;

        info!(path = ?self.path, "Remembered peer address");
        Ok(())
    }
}

// =============================================================================
// Memory Settings
// =============================================================================

/// Settings that live only as long as the process.
///
/// Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    remote_address: Arc<Mutex<Option<String>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an address already remembered.
    pub fn with_address(address: impl Into<String>) -> Self {
        MemorySettings {
            remote_address: Arc::new(Mutex::new(Some(address.into()))),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn load_remote_address(&self) -> SessionResult<Option<String>> {
        let guard = self
            .remote_address
            .lock()
            .map_err(|_| SessionError::Settings("settings lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_remote_address(&self, address: &str) -> SessionResult<()> {
        let mut guard = self
            .remote_address
            .lock()
            .map_err(|_| SessionError::Settings("settings lock poisoned".into()))?;
        *guard = Some(address.to_string());
        Ok(())
    }
}
