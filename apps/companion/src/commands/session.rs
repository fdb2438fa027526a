//! # Session Commands
//!
//! Connect-screen commands: connect to the desktop, then drive sales.
//!
//! ## Remote Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  scan QR ──► use_scanned_address ──► address field                     │
//! │                                          │                              │
//! │  "Connecter" ──► connect ────────────────┘──► Session::connect         │
//! │                                                                         │
//! │  "Nouvelle vente" ──► new_sale ──► {"type":"newSale"}                  │
//! │  scan product ──► send_scanned_barcode ──► {"type":"addProduct",..}    │
//! │  "Annuler" ──► cancel_sale ──► {"type":"cancelSale"}                   │
//! │  "Verrouiller" ──► lock_app ──► {"type":"lockApp"}                     │
//! │                                                                         │
//! │  Not connected? ──► Notice::warning("L'application n'est pas           │
//! │                     connectée") + Err(NOT_CONNECTED)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport failures already reach the operator through the session's
//! `Error` event, so only `NotConnected` is announced here.

use tracing::debug;

use sennada_link::{Command, SessionError, SessionStatus};

use crate::error::ApiError;
use crate::notice::{self, Notice, NoticeBoard};
use crate::state::LinkState;

async fn send(link: &LinkState, notices: &NoticeBoard, command: Command) -> Result<(), ApiError> {
    match link.session().send(command).await {
        Ok(()) => Ok(()),
        Err(SessionError::NotConnected) => {
            notices.publish(Notice::warning(notice::NOT_CONNECTED));
            Err(SessionError::NotConnected.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Connects to `address`, or to the address field when `None`.
pub async fn connect(link: &LinkState, address: Option<String>) -> Result<SessionStatus, ApiError> {
    let address = match address {
        Some(address) => {
            link.set_address_input(address.clone());
            address
        }
        None => link.address_input(),
    };
    debug!(%address, "connect command");

    link.session().connect(&address).await?;
    Ok(link.session().status())
}

/// Fills the address field from a scanned QR code.
pub fn use_scanned_address(link: &LinkState, data: String) -> String {
    link.use_scanned_address(&data)
}

pub async fn disconnect(link: &LinkState) -> SessionStatus {
    debug!("disconnect command");
    link.session().close().await;
    link.session().status()
}

pub async fn new_sale(link: &LinkState, notices: &NoticeBoard) -> Result<(), ApiError> {
    debug!("new_sale command");
    send(link, notices, Command::NewSale).await
}

pub async fn lock_app(link: &LinkState, notices: &NoticeBoard) -> Result<(), ApiError> {
    debug!("lock_app command");
    send(link, notices, Command::LockApp).await
}

/// Forwards a scanned product barcode to the desktop's current sale.
pub async fn send_scanned_barcode(
    link: &LinkState,
    notices: &NoticeBoard,
    barcode: String,
) -> Result<(), ApiError> {
    let barcode = barcode.trim().to_string();
    if barcode.is_empty() {
        return Err(ApiError::validation("barcode is required"));
    }
    debug!(%barcode, "send_scanned_barcode command");
    send(link, notices, Command::AddProduct(barcode)).await
}

/// Cancels the sale. Always clears it locally; the session announces it.
pub async fn cancel_sale(link: &LinkState) -> SessionStatus {
    debug!("cancel_sale command");
    link.session().cancel_sale().await;
    link.session().status()
}

pub fn session_status(link: &LinkState) -> SessionStatus {
    link.session().status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::notice::NoticeLevel;
    use sennada_link::{LinkConfig, MemorySettings, Session, SessionState};
    use std::sync::Arc;

    fn setup() -> (LinkState, NoticeBoard) {
        let notices = NoticeBoard::new();
        let session = Session::new(LinkConfig::default(), Arc::new(MemorySettings::new()));
        (LinkState::new(session, notices.clone()), notices)
    }

    #[tokio::test]
    async fn test_commands_warn_when_not_connected() {
        let (link, notices) = setup();
        let mut rx = notices.subscribe();

        let err = new_sale(&link, &notices).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotConnected);

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.title, notice::NOT_CONNECTED);

        assert_eq!(
            lock_app(&link, &notices).await.unwrap_err().code,
            ErrorCode::NotConnected
        );
    }

    #[tokio::test]
    async fn test_blank_barcode_rejected() {
        let (link, notices) = setup();
        let err = send_scanned_barcode(&link, &notices, "  ".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_connect_bad_address() {
        let (link, notices) = setup();
        let mut rx = notices.subscribe();

        let err = connect(&link, Some("http://pos.local".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
        assert_eq!(link.address_input(), "http://pos.local");
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_cancel_offline() {
        let (link, _) = setup();
        let status = cancel_sale(&link).await;
        assert_eq!(status.state, SessionState::Idle);
        assert_eq!(status.active_sale_id, None);
        assert_eq!(session_status(&link).state, SessionState::Idle);
    }

    #[test]
    fn test_scanned_address() {
        let (link, _) = setup();
        assert_eq!(use_scanned_address(&link, "192.168.1.7".into()), "192.168.1.7");
        assert_eq!(session_status(&link).remote_address, None);
    }
}
