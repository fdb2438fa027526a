//! # Notices
//!
//! Short messages for the operator: toasts for confirmations, alerts for
//! problems. The shell subscribes once and renders whatever arrives.
//!
//! ```text
//! CatalogState ─┐
//!               ├──► NoticeBoard (broadcast) ──► shell subscriber(s)
//! LinkState ────┘
//! ```
//!
//! Publishing never fails: with no subscriber the notice is only logged.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Notices kept for a slow subscriber before the oldest are dropped.
const NOTICE_CAPACITY: usize = 64;

pub const TITLE_REQUIRED: &str = "Le produit doit avoir une désignation";
pub const PRODUCT_CREATED: &str = "Produit créé avec succès";
pub const PRODUCT_UPDATED: &str = "Produit mis à jour avec succès";
pub const SALE_CANCELLED: &str = "Vente annulée";
pub const NOT_CONNECTED: &str = "L'application n'est pas connectée";
pub const CONNECTED: &str = "Application connectée au succès";
pub const DISCONNECTED: &str = "Déconnectée";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Notice {
            level,
            title: title.into(),
            text: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Fan-out of notices to the shell.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    sender: broadcast::Sender<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTICE_CAPACITY);
        NoticeBoard { sender }
    }

    pub fn publish(&self, notice: Notice) {
        debug!(level = ?notice.level, title = %notice.title, "Notice");
        // Err only means nobody is listening
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let board = NoticeBoard::new();
        let mut rx = board.subscribe();

        board.publish(Notice::success(PRODUCT_CREATED));
        board.publish(Notice::warning(NOT_CONNECTED).with_text("newSale"));

        assert_eq!(rx.recv().await.unwrap(), Notice::success(PRODUCT_CREATED));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NoticeLevel::Warning);
        assert_eq!(second.text.as_deref(), Some("newSale"));
    }

    #[test]
    fn test_publish_without_subscriber() {
        NoticeBoard::new().publish(Notice::info(SALE_CANCELLED));
    }
}
