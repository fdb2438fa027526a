//! # sennada-link: Session with the Desktop POS
//!
//! The phone acts as a remote control for the desktop POS: it starts and
//! cancels sales, locks the desktop, and forwards scanned barcodes. This
//! crate owns that link.
//!
//! ## Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Screens ──► Session::connect / send / cancel_sale / close            │
//! │                   │                                                     │
//! │                   │ Command (JSON text frame)                           │
//! │                   ▼                                                     │
//! │              ┌──────────┐        ws://<host>:9000        ┌──────────┐  │
//! │              │Transport │ ◄────────────────────────────► │ Desktop  │  │
//! │              └──────────┘                                │   POS    │  │
//! │                   │ PeerMessage                          └──────────┘  │
//! │                   ▼                                                     │
//! │   Observers ◄── SessionEvent (connected, saleStarted, error, ...)      │
//! │                                                                         │
//! │   SettingsStore remembers the last address that connected.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Peer port, timeouts, settings location
//! - [`error`] - Session error types
//! - [`protocol`] - Outbound commands and inbound messages
//! - [`session`] - Connection state machine and event dispatch
//! - [`settings`] - Remembered peer address
//! - [`transport`] - WebSocket open, write, read loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sennada_link::{Command, FileSettings, LinkConfig, Session};
//! use std::sync::Arc;
//!
//! let config = LinkConfig::load_or_default(None);
//! let settings = Arc::new(FileSettings::new(config.settings_path().unwrap()));
//! let session = Session::new(config, settings);
//!
//! session.subscribe(|event: &sennada_link::SessionEvent| println!("{:?}", event));
//! session.connect("192.168.1.20").await?;
//! session.send(Command::NewSale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{LinkConfig, PeerSettings, DEFAULT_PEER_PORT};
pub use error::{SessionError, SessionResult};
pub use protocol::{Command, PeerMessage};
pub use session::{
    FailureKind, Session, SessionEvent, SessionObserver, SessionState, SessionStatus,
    SubscriptionId,
};
pub use settings::{FileSettings, MemorySettings, SettingsStore};
