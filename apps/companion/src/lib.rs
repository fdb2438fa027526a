//! # sennada-companion: App Core for the Mobile Companion
//!
//! Everything the mobile shell needs behind its screens: the local product
//! catalog and the remote control of the desktop POS.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sennada Companion                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Mobile Shell (UI)                           │  │
//! │  │  • Product list / add / edit     • Connect screen + QR scan      │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 │ commands::*                          │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust Core (this crate)                        │  │
//! │  │                                                                  │  │
//! │  │  lib.rs ─────► Companion::start, logging, paths                 │  │
//! │  │  commands/ ──► list_products, create_product, connect, new_sale │  │
//! │  │  state/ ─────► CatalogState, LinkState                          │  │
//! │  │  notice.rs ──► NoticeBoard (toasts and alerts)                  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                 │                                   │                   │
//! │                 ▼                                   ▼                   │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │  SQLite: sennada.db          │   │  ws://<desktop>:9000         │   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Resolve paths (`SENNADA_DB_PATH` or the platform data directory)
//! 3. Open the database and run migrations
//! 4. Load link configuration and the remembered peer address
//! 5. Load the catalog and wire session events to notices

pub mod commands;
pub mod error;
pub mod notice;
pub mod state;

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sennada_db::{Database, DbConfig};
use sennada_link::{FileSettings, LinkConfig, MemorySettings, Session, SettingsStore};

pub use error::{ApiError, ErrorCode, StartupError};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use state::{CatalogState, LinkState};

/// Name of the catalog database file.
pub const DATABASE_FILE: &str = "sennada.db";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sennada_link=trace` - Trace the peer link only
/// - Default: `info,sennada=debug,sqlx=warn`
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sennada=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

// =============================================================================
// Paths
// =============================================================================

/// Where the app keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub database_path: PathBuf,
    /// Explicit `link.toml`; `None` uses the platform config dir.
    pub link_config: Option<PathBuf>,
    /// Explicit settings file; `None` defers to the link configuration.
    pub settings_path: Option<PathBuf>,
}

impl AppPaths {
    /// Determines the database file path based on the platform.
    ///
    /// ## Platform-Specific Paths
    /// - **Android**: app-private files dir (set by the shell via `SENNADA_DB_PATH`)
    /// - **Linux**: `~/.local/share/sennada/sennada.db`
    /// - **macOS**: `~/Library/Application Support/dz.sennada.sennada/sennada.db`
    ///
    /// ## Development Override
    /// Set `SENNADA_DB_PATH` to use a custom path.
    pub fn resolve() -> Result<Self, StartupError> {
        let database_path = match std::env::var("SENNADA_DB_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => ProjectDirs::from("dz", "sennada", "sennada")
                .ok_or(StartupError::NoDataDir)?
                .data_dir()
                .join(DATABASE_FILE),
        };

        Ok(AppPaths {
            database_path,
            link_config: None,
            settings_path: None,
        })
    }

    /// Keeps every file inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        AppPaths {
            database_path: dir.join(DATABASE_FILE),
            link_config: Some(dir.join("link.toml")),
            settings_path: Some(dir.join("settings.toml")),
        }
    }
}

// =============================================================================
// Companion
// =============================================================================

/// The running app core. The shell keeps one and passes its parts to
/// [`commands`].
#[derive(Debug)]
pub struct Companion {
    pub catalog: CatalogState,
    pub link: LinkState,
    pub notices: NoticeBoard,
    db: Database,
}

impl Companion {
    /// Opens everything under `paths`.
    pub async fn start(paths: AppPaths) -> Result<Self, StartupError> {
        info!(db = ?paths.database_path, "Starting Sennada companion");

        if let Some(parent) = paths.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::new(DbConfig::new(&paths.database_path)).await?;

        let mut config = LinkConfig::load_or_default(paths.link_config.clone());
        if let Some(path) = paths.settings_path.clone() {
            config.settings.path = Some(path);
        }

        let settings: Arc<dyn SettingsStore> = match config.settings_path() {
            Some(path) => Arc::new(FileSettings::new(path)),
            None => {
                warn!("No settings location; the peer address will not be remembered");
                Arc::new(MemorySettings::new())
            }
        };

        Self::assemble(db, Session::new(config, settings)).await
    }

    /// Wires an already opened database and session together.
    pub async fn assemble(db: Database, session: Session) -> Result<Self, StartupError> {
        let notices = NoticeBoard::new();
        let catalog = CatalogState::new(db.clone());
        catalog.init().await?;
        let link = LinkState::new(session, notices.clone());

        info!("Companion ready");
        Ok(Companion {
            catalog,
            link,
            notices,
            db,
        })
    }

    /// Closes the peer connection and the database.
    pub async fn shutdown(&self) {
        info!("Shutting down companion");
        self.link.session().close().await;
        self.db.close().await;
    }
}
