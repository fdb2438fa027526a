//! # Link State
//!
//! Connect-screen state: the peer session, the address field, and the
//! translation of session events into operator notices.
//!
//! ## Event Flow
//! ```text
//! Session ──SessionEvent──► LinkState observer ──Notice──► NoticeBoard
//!
//!   connected        → success  "Application connectée au succès"
//!   disconnected     → info     "Déconnectée"
//!   error            → error    message
//!   saleStarted      → success  "Nouvelle vente" (sale id)
//!   saleCancelled    → info     "Vente annulée"
//!   peerMessage      → info     "Message reçu" (raw text)
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use sennada_link::{Session, SessionEvent, SubscriptionId};

use crate::notice::{self, Notice, NoticeBoard};

/// Maps a session event to what the operator sees.
pub fn notice_for(event: &SessionEvent) -> Notice {
    match event {
        SessionEvent::Connected { address } => Notice::success(notice::CONNECTED).with_text(address),
        SessionEvent::Disconnected { reason } => {
            let notice = Notice::info(notice::DISCONNECTED);
            match reason {
                Some(reason) => notice.with_text(reason),
                None => notice,
            }
        }
        SessionEvent::Error { message, .. } => Notice::error("Erreur").with_text(message),
        SessionEvent::SaleStarted { sale_id } => {
            Notice::success("Nouvelle vente").with_text(format!("N° {}", sale_id))
        }
        SessionEvent::SaleCancelled { .. } => Notice::info(notice::SALE_CANCELLED),
        SessionEvent::PeerMessage { raw, .. } => Notice::info("Message reçu").with_text(raw),
    }
}

/// Session plus the connect screen's address field.
#[derive(Debug)]
pub struct LinkState {
    session: Session,
    address_input: Arc<Mutex<String>>,
    subscription: SubscriptionId,
}

impl LinkState {
    /// Wraps `session` and starts forwarding its events to `notices`.
    ///
    /// The address field starts with the remembered address, if any.
    pub fn new(session: Session, notices: NoticeBoard) -> Self {
        let address_input = session.remote_address().unwrap_or_default();
        if !address_input.is_empty() {
            debug!(address = %address_input, "Pre-filled peer address");
        }

        let subscription = session.subscribe(move |event: &SessionEvent| {
            notices.publish(notice_for(event));
        });

        LinkState {
            session,
            address_input: Arc::new(Mutex::new(address_input)),
            subscription,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn address_input(&self) -> String {
        self.address_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_address_input(&self, address: impl Into<String>) {
        *self
            .address_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = address.into();
    }

    /// Replaces the address field with a QR-scanned value.
    pub fn use_scanned_address(&self, data: &str) -> String {
        let address = data.trim().to_string();
        debug!(%address, "Using scanned peer address");
        self.set_address_input(address.clone());
        address
    }
}

impl Drop for LinkState {
    fn drop(&mut self) {
        self.session.unsubscribe(self.subscription);
    }
}
