//! # API Error Type
//!
//! Unified error type for the command functions the mobile shell calls.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Sennada                                │
//! │                                                                         │
//! │  Mobile shell                 Rust core                                 │
//! │  ────────────                 ─────────                                 │
//! │                                                                         │
//! │  create_product(form)  ──►  commands::product::create_product          │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                             CatalogState::add                           │
//! │                                   │                                     │
//! │                             ValidationError / DbError                   │
//! │                                   │  From                               │
//! │                                   ▼                                     │
//! │  { code, message }   ◄──── ApiError  (+ Notice on the NoticeBoard)     │
//! │                                                                         │
//! │  switch (e.code) {                                                      │
//! │    case 'VALIDATION_ERROR': highlight the field                         │
//! │    case 'NOT_CONNECTED':    show the connect screen                     │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use sennada_core::{CoreError, ValidationError};
use sennada_db::DbError;
use sennada_link::SessionError;

/// API error returned from command functions.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_CONNECTED",
///   "message": "Not connected to the desktop peer"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product not found
    NotFound,

    /// Form validation failed
    ValidationError,

    /// Catalog store failure
    DatabaseError,

    /// A command needs an open session
    NotConnected,

    /// Connecting to or talking with the desktop peer failed
    ConnectionError,

    /// Address typed or scanned by the operator is unusable
    InvalidAddress,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::InvalidMoney(input) => {
                ApiError::validation(format!("Invalid amount: {}", input))
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let code = match &err {
            SessionError::NotConnected => ErrorCode::NotConnected,
            SessionError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            SessionError::InvalidConfig(_) | SessionError::Serialization(_) => ErrorCode::Internal,
            _ => ErrorCode::ConnectionError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Startup Errors
// =============================================================================

/// Failures while wiring the app together. Unlike [`ApiError`], these stop
/// the app from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open the catalog: {0}")]
    Database(#[from] DbError),

    #[error("Failed to prepare the data directory: {0}")]
    Io(#[from] std::io::Error),

    /// No platform data directory and no `SENNADA_DB_PATH`.
    #[error("Could not determine a data directory")]
    NoDataDir,
}
