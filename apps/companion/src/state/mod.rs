//! # State Module
//!
//! Screen state for the companion app, one type per concern.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │   CatalogState   │  │    LinkState     │  │     NoticeBoard      │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  Database        │  │  Session         │  │  broadcast::Sender   │  │
//! │  │  Arc<Mutex<      │  │  address input   │  │  <Notice>            │  │
//! │  │    CatalogView>> │  │  event → notice ─┼──┼─►                    │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CatalogState: pool is thread-safe; the view sits behind a Mutex     │
//! │  • LinkState: Session is Clone + Sync; input behind a Mutex            │
//! │  • NoticeBoard: broadcast channel, cheap to clone                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod catalog;
mod session;

pub use catalog::{CatalogError, CatalogResult, CatalogState};
pub use session::{notice_for, LinkState};
