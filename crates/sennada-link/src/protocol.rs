//! # Peer Protocol Messages
//!
//! The JSON messages exchanged with the desktop POS, one per text frame.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Phone ⇄ Desktop Messages                           │
//! │                                                                         │
//! │  PHONE ───► DESKTOP (Command)                                          │
//! │  ────────────────────────────                                          │
//! │  { "type": "newSale" }                      start a sale               │
//! │  { "type": "lockApp" }                      lock the desktop UI        │
//! │  { "type": "addProduct", "data": "613…" }   scanned barcode            │
//! │  { "type": "cancelSale" }                   cancel the current sale    │
//! │                                                                         │
//! │  DESKTOP ───► PHONE (PeerMessage)                                      │
//! │  ────────────────────────────────                                      │
//! │  { "type": "saleCreated", "data": "42" }    sale id announced          │
//! │  { "type": <anything else>, ... }           shown to the operator      │
//! │                                                                         │
//! │  No versioning, no acknowledgements, no sequence numbers.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SessionError, SessionResult};

/// Inbound `type` announcing a new sale.
pub const SALE_CREATED: &str = "saleCreated";

// =============================================================================
// Outbound Commands
// =============================================================================

/// Commands the phone sends to the desktop peer.
///
/// Adjacently tagged: `{ "type": "addProduct", "data": "..." }`.
/// Unit variants serialize without a `data` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Command {
    /// Ask the peer to start a sale.
    NewSale,

    /// Ask the peer to lock its UI.
    LockApp,

    /// Forward a scanned barcode to the current sale.
    AddProduct(String),

    /// Ask the peer to cancel the current sale.
    CancelSale,
}

impl Command {
    /// The wire `type` of this command, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::NewSale => "newSale",
            Command::LockApp => "lockApp",
            Command::AddProduct(_) => "addProduct",
            Command::CancelSale => "cancelSale",
        }
    }

    /// Serializes to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Inbound Messages
// =============================================================================

/// A message received from the desktop peer.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerMessage {
    /// The peer opened a sale and tells us its id.
    SaleCreated { sale_id: String },

    /// Any other `type`; passed through for display.
    Other { kind: String, payload: Value },
}

impl PeerMessage {
    /// Parses one inbound text frame.
    ///
    /// ## Rules
    /// - Must be a JSON object with a string `type`
    /// - `saleCreated` needs a string `data` (an integer is accepted and
    ///   stringified, some desktop builds send one)
    /// - Every other `type` is kept whole in `Other`
    ///
    /// Anything else is `SessionError::MalformedMessage`.
    pub fn parse(text: &str) -> SessionResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::MalformedMessage(format!("not JSON: {}", e)))?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::MalformedMessage("missing string \"type\"".into()))?
            .to_string();

        if kind != SALE_CREATED {
            return Ok(PeerMessage::Other {
                kind,
                payload: value,
            });
        }

        let sale_id = match value.get("data") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => {
                return Err(SessionError::MalformedMessage(
                    "saleCreated without a sale id".into(),
                ))
            }
        };

        Ok(PeerMessage::SaleCreated { sale_id })
    }

    /// The wire `type` of this message.
    pub fn type_name(&self) -> &str {
        match self {
            PeerMessage::SaleCreated { .. } => SALE_CREATED,
            PeerMessage::Other { kind, .. } => kind,
        }
    }
}
