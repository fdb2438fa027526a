//! # Error Types
//!
//! Domain-specific error types for sennada-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sennada-core errors (this file)                                       │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Form validation failures                       │
//! │                                                                         │
//! │  sennada-db errors                                                     │
//! │  └── DbError          - Catalog store failures                         │
//! │                                                                         │
//! │  sennada-link errors                                                   │
//! │  └── SessionError     - Connection to the desktop peer                 │
//! │                                                                         │
//! │  companion errors                                                      │
//! │  └── ApiError         - What the mobile shell sees (serialized)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Opening the edit screen for an id that no longer exists
    /// - Updating a record that was never created
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// A price typed in a form could not be read.
    ///
    /// ## When This Occurs
    /// - Letters in a price field
    /// - More than two decimals ("1,234" is not a thousands separator here)
    #[error("Invalid amount: '{0}'")]
    InvalidMoney(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is written to the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Amounts and quantities that cannot be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// NaN or infinite numbers.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
}

impl ValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::NotFinite { field } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
