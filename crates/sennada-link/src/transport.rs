//! # WebSocket Transport
//!
//! One WebSocket connection to the desktop peer: open it, write text
//! frames, and read frames until it ends. There is no reconnection and no
//! keepalive of our own. Pongs to the peer's pings are queued by
//! tungstenite and flushed on the next read.
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open(url, timeout) ──► handshake ──► (SharedSink, PeerSource)         │
//! │        │                                   │            │               │
//! │        │ timeout / refused                 │            ▼               │
//! │        ▼                                   │      read_loop(...)        │
//! │  Err(Timeout | ConnectionFailed)           │        │                   │
//! │                                            │        ├─► Text(..)        │
//! │                      send_text(...) ◄──────┘        ├─► Closed{..} ─┐   │
//! │                      close(...)                     └─► Failed(..) ─┤   │
//! │                                                                      ▼   │
//! │                                                          loop returns    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sink sits behind a mutex so the session can write commands and
//! close the connection from any task.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Types
// =============================================================================

pub type PeerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half, shared between the session and the read loop.
pub type SharedSink = Arc<Mutex<SplitSink<PeerStream, WsMessage>>>;

/// Read half, owned by the read loop.
pub type PeerSource = SplitStream<PeerStream>;

/// What the read loop reports, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text frame.
    Text(String),

    /// The peer closed the connection (close frame or end of stream).
    Closed { reason: Option<String> },

    /// The connection broke.
    Failed(SessionError),
}

// =============================================================================
// Operations
// =============================================================================

/// Opens a connection and completes the WebSocket handshake.
pub async fn open(url: &Url, connect_timeout: Duration) -> SessionResult<(SharedSink, PeerSource)> {
    debug!(%url, "Opening WebSocket");

    match timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, response))) => {
            debug!(status = ?response.status(), "WebSocket handshake complete");
            let (sink, source) = stream.split();
            Ok((Arc::new(Mutex::new(sink)), source))
        }
        Ok(Err(e)) => Err(SessionError::from(e)),
        Err(_) => Err(SessionError::Timeout(connect_timeout.as_secs())),
    }
}

/// Writes one text frame.
pub async fn send_text(sink: &SharedSink, text: String) -> SessionResult<()> {
    let mut writer = sink.lock().await;
    writer.send(WsMessage::Text(text.into())).await?;
    Ok(())
}

/// Sends a close frame. Errors are ignored: the connection is going away
/// either way.
pub async fn close(sink: &SharedSink) {
    let mut writer = sink.lock().await;
    if let Err(e) = writer.close().await {
        debug!(?e, "Close frame not delivered");
    }
}

/// Reads frames until the connection ends, handing each to `deliver`.
///
/// Exactly one `Closed` or `Failed` is delivered, last.
pub async fn read_loop<F>(mut source: PeerSource, mut deliver: F)
where
    F: FnMut(TransportEvent),
{
    loop {
        match source.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                debug!(len = text.len(), "Received text frame");
                deliver(TransportEvent::Text(text.as_str().to_owned()));
            }
            Some(Ok(WsMessage::Ping(_))) => {
                debug!("Received ping");
            }
            Some(Ok(WsMessage::Pong(_))) => {
                debug!("Received pong");
            }
            Some(Ok(WsMessage::Close(frame))) => {
                info!(?frame, "Received close frame");
                let reason = frame
                    .map(|f| f.reason.as_str().to_owned())
                    .filter(|r| !r.is_empty());
                deliver(TransportEvent::Closed { reason });
                return;
            }
            Some(Ok(WsMessage::Binary(_))) => {
                warn!("Ignoring unexpected binary frame");
            }
            Some(Ok(WsMessage::Frame(_))) => {
                // Raw frame, ignore
            }
            Some(Err(e)) => {
                let err = SessionError::from(e);
                if err == SessionError::Disconnected {
                    deliver(TransportEvent::Closed { reason: None });
                } else {
                    warn!(%err, "WebSocket error");
                    deliver(TransportEvent::Failed(err));
                }
                return;
            }
            None => {
                debug!("WebSocket stream ended");
                deliver(TransportEvent::Closed { reason: None });
                return;
            }
        }
    }
}
