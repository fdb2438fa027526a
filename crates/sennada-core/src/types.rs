//! # Domain Types
//!
//! The catalog has exactly one persisted entity: [`Product`].
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────────┐        ┌──────────────────────────┐      │
//! │  │       NewProduct         │ create │         Product          │      │
//! │  │  ──────────────────────  │ ─────► │  ──────────────────────  │      │
//! │  │  form input              │        │  id (assigned by store)  │      │
//! │  │  title, reference,       │ ◄───── │  same fields             │      │
//! │  │  barcode, 3 prices,      │  edit  │  created_at (set once)   │      │
//! │  │  stock, image            │        │                          │      │
//! │  └──────────────────────────┘        └──────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - `id`: integer assigned by the store, never reused
//! - `barcode`: natural key used when a scan looks a product up

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::image;
use crate::money::Money;

/// Store-assigned product identifier.
pub type ProductId = i64;

// =============================================================================
// Product
// =============================================================================

/// A product in the local catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Assigned by the store on creation, immutable afterwards.
    pub id: ProductId,

    /// Shop-internal reference code.
    pub reference: Option<String>,

    /// Barcode (EAN-13, UPC-A, ...), matched exactly by search.
    pub barcode: Option<String>,

    /// Display name ("désignation").
    pub title: Option<String>,

    /// Retail price.
    pub detail_price: Money,

    /// Wholesale price.
    pub wholesale_price: Money,

    /// Semi-wholesale price.
    pub semi_wholesale_price: Money,

    /// Quantity on hand. Fractional for goods sold by weight.
    pub stock: f64,

    /// Whether the desktop peer should decrement stock on sale.
    pub is_follow_stock: bool,

    /// Base64-encoded photo.
    pub image_data: Option<String>,

    /// MIME type of `image_data`.
    pub mime_type: Option<String>,

    /// Reserved.
    pub size: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// `data:` URI for the product photo, ready for an image component.
    pub fn image_uri(&self) -> Option<String> {
        let data = self.image_data.as_deref()?;
        let mime = self.mime_type.as_deref().unwrap_or(image::DEFAULT_MIME_TYPE);
        Some(image::data_uri(data, mime))
    }

    /// Overwrites every editable field with the form values.
    ///
    /// `id` and `created_at` are untouched.
    pub fn apply(&mut self, form: NewProduct) {
        self.reference = form.reference;
        self.barcode = form.barcode;
        self.title = Some(form.title);
        self.detail_price = form.detail_price;
        self.wholesale_price = form.wholesale_price;
        self.semi_wholesale_price = form.semi_wholesale_price;
        self.stock = form.stock;
        self.is_follow_stock = form.is_follow_stock;
        self.image_data = form.image_data;
        self.mime_type = form.mime_type;
        self.size = form.size;
    }
}

// =============================================================================
// NewProduct
// =============================================================================

/// Input for creating a product (or the edited state of an existing one).
///
/// ## Form Defaults
/// ```text
/// title: ""   prices: 0   stock: 0   is_follow_stock: true   image: none
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct NewProduct {
    pub reference: Option<String>,
    pub barcode: Option<String>,
    pub title: String,
    pub detail_price: Money,
    pub wholesale_price: Money,
    pub semi_wholesale_price: Money,
    pub stock: f64,
    pub is_follow_stock: bool,
    pub image_data: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
}

impl Default for NewProduct {
    fn default() -> Self {
        Self {
            reference: None,
            barcode: None,
            title: String::new(),
            detail_price: Money::zero(),
            wholesale_price: Money::zero(),
            semi_wholesale_price: Money::zero(),
            stock: 0.0,
            is_follow_stock: true,
            image_data: None,
            mime_type: None,
            size: None,
        }
    }
}

impl NewProduct {
    /// Starts a form with only the title filled in.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Trims text fields and turns blank optional codes into `None`.
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        self.title = self.title.trim().to_string();
        self.reference = blank_to_none(self.reference);
        self.barcode = blank_to_none(self.barcode);
        self
    }

    /// Attaches an encoded photo.
    pub fn with_image(mut self, encoded: image::EncodedImage) -> Self {
        self.image_data = Some(encoded.data);
        self.mime_type = Some(encoded.mime_type);
        self
    }
}

impl From<&Product> for NewProduct {
    /// Pre-fills the edit form from a stored product.
    fn from(product: &Product) -> Self {
        Self {
            reference: product.reference.clone(),
            barcode: product.barcode.clone(),
            title: product.title.clone().unwrap_or_default(),
            detail_price: product.detail_price,
            wholesale_price: product.wholesale_price,
            semi_wholesale_price: product.semi_wholesale_price,
            stock: product.stock,
            is_follow_stock: product.is_follow_stock,
            image_data: product.image_data.clone(),
            mime_type: product.mime_type.clone(),
            size: product.size,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
