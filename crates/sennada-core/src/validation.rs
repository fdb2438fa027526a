//! # Validation Module
//!
//! Form rules applied before a product reaches the catalog store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Mobile form                                                  │
//! │  └── Numeric keyboards, immediate feedback                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: companion command (Rust)                                     │
//! │  └── THIS MODULE: required title, lengths, non-negative prices         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── NOT NULL constraints on prices, stock and flags                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed rule means the operation is not attempted at all.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewProduct;
use crate::{MAX_CODE_LEN, MAX_SEARCH_LEN, MAX_TITLE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product title.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use sennada_core::validation::validate_title;
///
/// assert!(validate_title("Lait 1L").is_ok());
/// assert!(validate_title("   ").is_err());
/// ```
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Validates an optional short code (reference, barcode).
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.trim().chars().count() > MAX_CODE_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query. Empty is allowed and means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices are independent of each other but none may be negative.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Stock may be fractional or negative (oversold), but must be a real number.
pub fn validate_stock(stock: f64) -> ValidationResult<()> {
    if !stock.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Form Validator
// =============================================================================

/// Runs every rule against a create or edit form.
///
/// The first failing rule wins; the title is checked first because it is
/// the one the operator most often forgets.
pub fn validate_new_product(form: &NewProduct) -> ValidationResult<()> {
    validate_title(&form.title)?;
    validate_optional_text("reference", form.reference.as_deref())?;
    validate_optional_text("barcode", form.barcode.as_deref())?;
    validate_price("detail_price", form.detail_price)?;
    validate_price("wholesale_price", form.wholesale_price)?;
    validate_price("semi_wholesale_price", form.semi_wholesale_price)?;
    validate_stock(form.stock)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Couscous 1kg").is_ok());
        assert!(matches!(
            validate_title(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_title(&"é".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
        assert!(validate_title(&"é".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text("barcode", None).is_ok());
        assert!(validate_optional_text("barcode", Some("6130000000017")).is_ok());
        assert!(validate_optional_text("barcode", Some(&"1".repeat(101))).is_err());
    }

    #[test]
    fn test_validate_search_query_trims() {
        assert_eq!(validate_search_query("  lait ").unwrap(), "lait");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("detail_price", Money::zero()).is_ok());
        assert!(validate_price("detail_price", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(2.5).is_ok());
        assert!(validate_stock(-3.0).is_ok());
        assert!(validate_stock(f64::NAN).is_err());
        assert!(validate_stock(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        assert!(validate_new_product(&NewProduct::titled("Thé vert")).is_ok());

        let untitled = NewProduct::default();
        let err = validate_new_product(&untitled).unwrap_err();
        assert_eq!(err.field(), "title");

        let negative = NewProduct {
            wholesale_price: Money::from_cents(-100),
            ..NewProduct::titled("Thé vert")
        };
        let err = validate_new_product(&negative).unwrap_err();
        assert_eq!(err.field(), "wholesale_price");
    }
}
