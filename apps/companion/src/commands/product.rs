//! # Product Commands
//!
//! Catalog commands for the list, add, edit and search screens.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Save Flow                                    │
//! │                                                                         │
//! │  Operator taps "Enregistrer"                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_product(form) / update_product(id, form)                       │
//! │       │                                                                 │
//! │       ├── no title ──► Notice::info("Le produit doit avoir ...")       │
//! │       │                 Err(VALIDATION_ERROR)                           │
//! │       │                                                                 │
//! │       ├── store error ─► Notice::error(..), Err(DATABASE_ERROR)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Notice::success("Produit créé avec succès")                           │
//! │  Ok(ProductDto)  (list already refreshed)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use sennada_core::image::encode_image;
use sennada_core::{Money, NewProduct, Product, ProductId};

use crate::error::ApiError;
use crate::notice::{self, Notice, NoticeBoard};
use crate::state::{CatalogError, CatalogState};

/// Product as the screens display it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    pub reference: Option<String>,
    pub barcode: Option<String>,
    pub title: Option<String>,
    pub detail_price: Money,
    pub wholesale_price: Money,
    pub semi_wholesale_price: Money,
    pub stock: f64,
    pub is_follow_stock: bool,
    /// `data:` URI of the photo, ready for an image component.
    pub image_uri: Option<String>,
    /// Retail price formatted in dinars, e.g. "1 250,00 D.A".
    pub detail_price_label: String,
    /// RFC 3339
    pub created_at: String,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            image_uri: p.image_uri(),
            detail_price_label: p.detail_price.format_dzd(),
            created_at: p.created_at.to_rfc3339(),
            id: p.id,
            reference: p.reference,
            barcode: p.barcode,
            title: p.title,
            detail_price: p.detail_price,
            wholesale_price: p.wholesale_price,
            semi_wholesale_price: p.semi_wholesale_price,
            stock: p.stock,
            is_follow_stock: p.is_follow_stock,
        }
    }
}

fn to_dtos(products: Vec<Product>) -> Vec<ProductDto> {
    products.into_iter().map(ProductDto::from).collect()
}

/// Publishes the notice for a failed save and converts the error.
fn report_save_failure(notices: &NoticeBoard, err: CatalogError) -> ApiError {
    if err.is_missing_title() {
        notices.publish(Notice::info(notice::TITLE_REQUIRED));
    } else {
        notices.publish(Notice::error("Erreur").with_text(err.to_string()));
    }
    err.into()
}

/// The list as currently shown (filtered when a search is active).
pub fn list_products(catalog: &CatalogState) -> Vec<ProductDto> {
    to_dtos(catalog.products())
}

/// Gets a single product, for the edit form.
pub async fn get_product(catalog: &CatalogState, id: ProductId) -> Result<ProductDto, ApiError> {
    debug!(id, "get_product command");
    Ok(catalog.get(id).await?.into())
}

/// Saves the add form.
pub async fn create_product(
    catalog: &CatalogState,
    notices: &NoticeBoard,
    form: NewProduct,
) -> Result<ProductDto, ApiError> {
    debug!("create_product command");
    match catalog.add(form).await {
        Ok(product) => {
            notices.publish(Notice::success(notice::PRODUCT_CREATED));
            Ok(product.into())
        }
        Err(e) => Err(report_save_failure(notices, e)),
    }
}

/// Saves the edit form. Every editable field is overwritten.
pub async fn update_product(
    catalog: &CatalogState,
    notices: &NoticeBoard,
    id: ProductId,
    form: NewProduct,
) -> Result<ProductDto, ApiError> {
    debug!(id, "update_product command");
    match catalog.update(id, form).await {
        Ok(product) => {
            notices.publish(Notice::success(notice::PRODUCT_UPDATED));
            Ok(product.into())
        }
        Err(e) => Err(report_save_failure(notices, e)),
    }
}

/// Typed or scanned search. Empty restores the full list.
pub async fn search_products(
    catalog: &CatalogState,
    query: String,
) -> Result<Vec<ProductDto>, ApiError> {
    debug!(query = %query, "search_products command");
    Ok(to_dtos(catalog.search(&query).await?))
}

/// Parses a price field as typed ("1250", "1 250,50").
pub fn parse_price(input: String) -> Result<Money, ApiError> {
    Ok(Money::parse(&input)?)
}

/// Attaches a picked photo to a form.
pub fn attach_image(form: NewProduct, bytes: &[u8], uri: &str) -> NewProduct {
    debug!(size = bytes.len(), uri, "Attaching product image");
    form.with_image(encode_image(bytes, uri))
}
