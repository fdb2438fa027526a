//! # Session Error Types
//!
//! Error types for the link with the desktop peer.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  NotConnected   │  │  MalformedMessage       │ │
//! │  │  InvalidAddress │  │  ConnectionFail │  │  Serialization          │ │
//! │  │  Settings       │  │  Timeout        │  │                         │ │
//! │  │                 │  │  WebSocket      │  │                         │ │
//! │  │                 │  │  Disconnected   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  None of these are fatal: the operator can always connect again.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Everything that can go wrong between the phone and the desktop peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid link configuration.
    #[error("Invalid link configuration: {0}")]
    InvalidConfig(String),

    /// The address typed or scanned by the operator is unusable.
    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),

    /// Persisted settings could not be read or written.
    #[error("Settings error: {0}")]
    Settings(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// `send` was called without an open connection.
    ///
    /// ## When This Occurs
    /// - Before the first `connect`
    /// - After the peer closed the connection or the network dropped
    /// - While a `connect` is still in progress
    #[error("Not connected to the desktop peer")]
    NotConnected,

    /// Failed to establish the WebSocket connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer did not complete the handshake in time.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// WebSocket protocol error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The connection went away.
    #[error("Disconnected from the desktop peer")]
    Disconnected,

    /// A newer `connect` replaced this one before it finished.
    #[error("Connection attempt superseded by a newer one")]
    Superseded,

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Inbound text that is not a message we understand.
    #[error("Malformed message from peer: {0}")]
    MalformedMessage(String),

    /// Failed to serialize an outbound command.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for SessionError {
    fn from(err: url::ParseError) -> Self {
        SessionError::InvalidAddress(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SessionError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => SessionError::Disconnected,
            WsError::Io(io) => SessionError::ConnectionFailed(io.to_string()),
            WsError::Url(url) => SessionError::InvalidAddress(url.to_string()),
            WsError::Protocol(p) => SessionError::WebSocket(p.to_string()),
            other => SessionError::WebSocket(other.to_string()),
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Settings(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::Settings(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::Settings(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SessionError {
    /// True for failures of the connection itself.
    ///
    /// These are the ones the operator fixes by checking the network and
    /// pressing connect again.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            SessionError::NotConnected
                | SessionError::ConnectionFailed(_)
                | SessionError::Timeout(_)
                | SessionError::WebSocket(_)
                | SessionError::Disconnected
        )
    }

    /// True for configuration and address problems.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidConfig(_)
                | SessionError::InvalidAddress(_)
                | SessionError::Settings(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors() {
        assert!(SessionError::NotConnected.is_transport_error());
        assert!(SessionError::Timeout(10).is_transport_error());
        assert!(SessionError::Disconnected.is_transport_error());

        assert!(!SessionError::MalformedMessage("x".into()).is_transport_error());
        assert!(!SessionError::InvalidAddress("x".into()).is_transport_error());
    }

    #[test]
    fn test_config_errors() {
        assert!(SessionError::InvalidAddress("".into()).is_config_error());
        assert!(SessionError::Settings("disk".into()).is_config_error());
        assert!(!SessionError::NotConnected.is_config_error());
    }

    #[test]
    fn test_tungstenite_mapping() {
        use tokio_tungstenite::tungstenite::Error as WsError;

        assert_eq!(
            SessionError::from(WsError::ConnectionClosed),
            SessionError::Disconnected
        );
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            SessionError::from(WsError::Io(refused)),
            SessionError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SessionError::NotConnected.to_string(),
            "Not connected to the desktop peer"
        );
        assert_eq!(
            SessionError::Timeout(10).to_string(),
            "Connection timeout after 10 seconds"
        );
    }
}
