//! # sennada-core: Domain Logic for the Sennada Companion
//!
//! Product catalog types and the rules that apply to them, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sennada Companion Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile shell (screens)                       │   │
//! │  │    Product list ──► Add/Edit form ──► Scan ──► Connect screen   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    companion commands                           │   │
//! │  └──────────────┬───────────────────────────────┬──────────────────┘   │
//! │                 │                               │                       │
//! │  ┌──────────────▼──────────────┐   ┌────────────▼────────────────┐     │
//! │  │ sennada-db (catalog store)  │   │ sennada-link (desktop peer) │     │
//! │  └──────────────┬──────────────┘   └─────────────────────────────┘     │
//! │                 │                                                       │
//! │  ┌──────────────▼──────────────────────────────────────────────────┐   │
//! │  │               ★ sennada-core (THIS CRATE) ★                     │   │
//! │  │   types: Product, NewProduct    money: Money (DZD)              │   │
//! │  │   validation: form rules        image: base64 + MIME            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Product` and the `NewProduct` form input
//! - [`money`] - Money in centimes with DZD formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Form validation rules
//! - [`image`] - Inline image encoding
//!
//! ## Example Usage
//!
//! ```rust
//! use sennada_core::money::Money;
//!
//! let price = Money::parse("1234,5").unwrap();
//! assert_eq!(price.cents(), 123_450);
//! assert_eq!(price.format_dzd(), "1\u{202f}234,50 D.A");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod image;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a reference or barcode.
pub const MAX_CODE_LEN: usize = 100;

/// Maximum length of a catalog search query.
pub const MAX_SEARCH_LEN: usize = 100;

/// Suffix appended to formatted prices (Algerian dinar).
pub const CURRENCY_SUFFIX: &str = "D.A";
