//! # Catalog State
//!
//! The product list the catalog screens show, mirrored from the store.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog State Operations                             │
//! │                                                                         │
//! │  Screen Action        Method            Store Call        List Change   │
//! │  ─────────────        ──────            ──────────        ───────────   │
//! │                                                                         │
//! │  App start ─────────► init() ─────────► list_all() ─────► all = rows   │
//! │                                                                         │
//! │  Save new form ─────► add(form) ──────► create() ───────► refresh      │
//! │                                                                         │
//! │  Save edit form ────► update(id,form) ► update() ───────► refresh      │
//! │                                                                         │
//! │  Type / scan ───────► search(q) ──────► search(q) ──────► visible = .. │
//! │                                                                         │
//! │  Clear search ──────► search("") ─────► (none) ─────────► visible = all│
//! │                                                                         │
//! │  NOTE: the list only changes after the store call succeeds.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use sennada_core::validation::{validate_new_product, validate_search_query};
use sennada_core::{NewProduct, Product, ProductId, ValidationError};
use sennada_db::{Database, DbError, DbResult};

use crate::error::ApiError;

/// Why a catalog write or lookup failed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error(transparent)]
    Store(#[from] DbError),
}

impl CatalogError {
    /// True when the form was saved without a title.
    pub fn is_missing_title(&self) -> bool {
        matches!(
            self,
            CatalogError::Validation(ValidationError::Required { field }) if field == "title"
        )
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(e) => e.into(),
            CatalogError::NotFound(id) => ApiError::not_found("Product", id),
            CatalogError::Store(e) => e.into(),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Default)]
struct CatalogView {
    all: Vec<Product>,
    /// Products matching `query`; mirrors `all` when the query is empty.
    visible: Vec<Product>,
    query: String,
    ready: bool,
}

/// Product list state shared by the catalog screens.
#[derive(Debug, Clone)]
pub struct CatalogState {
    db: Database,
    view: Arc<Mutex<CatalogView>>,
}

impl CatalogState {
    pub fn new(db: Database) -> Self {
        CatalogState {
            db,
            view: Arc::new(Mutex::new(CatalogView::default())),
        }
    }

    fn view(&self) -> MutexGuard<'_, CatalogView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the catalog for the first time.
    pub async fn init(&self) -> DbResult<()> {
        self.refresh().await?;
        self.view().ready = true;
        info!(count = self.view().all.len(), "Catalog loaded");
        Ok(())
    }

    /// Re-reads the catalog, re-running the current search if there is one.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> DbResult<()> {
        let query = self.view().query.clone();

        let all = self.db.products().list_all().await?;
        let visible = if query.is_empty() {
            all.clone()
        } else {
            self.db.products().search(&query).await?
        };

        let mut view = self.view();
        view.all = all;
        view.visible = visible;
        debug!(total = view.all.len(), visible = view.visible.len(), "Catalog refreshed");
        Ok(())
    }

    /// Validates and stores a new product.
    #[instrument(skip_all, fields(title = %form.title))]
    pub async fn add(&self, form: NewProduct) -> CatalogResult<Product> {
        let form = form.normalized();
        validate_new_product(&form)?;

        let product = self.db.products().create(&form).await?;
        info!(id = product.id, "Product created");

        self.refresh_after_write().await;
        Ok(product)
    }

    /// Replaces every editable field of product `id` with the form values.
    #[instrument(skip(self, form))]
    pub async fn update(&self, id: ProductId, form: NewProduct) -> CatalogResult<Product> {
        let form = form.normalized();
        validate_new_product(&form)?;

        let mut product = self.get(id).await?;
        product.apply(form);
        self.db.products().update(&product).await?;
        info!(id, "Product updated");

        self.refresh_after_write().await;
        Ok(product)
    }

    /// The write is done; a failed re-read only leaves the list stale.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            warn!(%e, "Catalog refresh after write failed");
        }
    }

    /// Fetches one product from the store.
    pub async fn get(&self, id: ProductId) -> CatalogResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Filters the visible list. An empty query shows everything.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        if query.is_empty() {
            let mut view = self.view();
            view.query.clear();
            view.visible = view.all.clone();
            return Ok(view.visible.clone());
        }

        let found = self.db.products().search(&query).await?;
        debug!(count = found.len(), "Search results");

        let mut view = self.view();
        view.query = query;
        view.visible = found.clone();
        Ok(found)
    }

    /// The list as currently shown.
    pub fn products(&self) -> Vec<Product> {
        self.view().visible.clone()
    }

    /// Current search text, empty when unfiltered.
    pub fn query(&self) -> String {
        self.view().query.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.view().ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sennada_core::Money;
    use sennada_db::DbConfig;

    async fn catalog() -> CatalogState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = CatalogState::new(db);
        catalog.init().await.unwrap();
        catalog
    }

    fn form(title: &str, barcode: &str) -> NewProduct {
        NewProduct {
            barcode: Some(barcode.to_string()),
            detail_price: Money::from_cents(12_000),
            ..NewProduct::titled(title)
        }
    }

    #[tokio::test]
    async fn test_init_marks_ready() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = CatalogState::new(db);
        assert!(!catalog.is_ready());

        catalog.init().await.unwrap();
        assert!(catalog.is_ready());
        assert!(catalog.products().is_empty());
    }

    #[tokio::test]
    async fn test_add_refreshes_list() {
        let catalog = catalog().await;

        let created = catalog
            .add(form("  Lait Candia 1L ", "6130000000017"))
            .await
            .unwrap();
        assert_eq!(created.title.as_deref(), Some("Lait Candia 1L"));

        let listed = catalog.products();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn test_add_without_title_leaves_list_unchanged() {
        let catalog = catalog().await;
        catalog.add(form("Semoule 1kg", "1")).await.unwrap();

        let err = catalog.add(form("   ", "2")).await.unwrap_err();
        assert!(err.is_missing_title());
        assert_eq!(catalog.products().len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let catalog = catalog().await;
        let created = catalog.add(form("Huile 5L", "611")).await.unwrap();

        let mut edit = NewProduct::from(&created);
        edit.title = "Huile Elio 5L".into();
        edit.stock = 12.0;
        let updated = catalog.update(created.id, edit).await.unwrap();

        assert_eq!(updated.created_at, created.created_at);
        let stored = catalog.get(created.id).await.unwrap();
        assert_eq!(stored.title.as_deref(), Some("Huile Elio 5L"));
        assert_eq!(stored.stock, 12.0);
        assert_eq!(catalog.products()[0].title.as_deref(), Some("Huile Elio 5L"));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let catalog = catalog().await;
        let err = catalog.update(404, form("Sucre", "9")).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(404)));
    }

    #[tokio::test]
    async fn test_search_then_clear() {
        let catalog = catalog().await;
        catalog.add(form("Café Bonal", "6131")).await.unwrap();
        catalog.add(form("Thé vert", "6132")).await.unwrap();

        let found = catalog.search("café").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(catalog.products().len(), 1);
        assert_eq!(catalog.query(), "café");

        // Scanned barcode
        let found = catalog.search("6132").await.unwrap();
        assert_eq!(found[0].title.as_deref(), Some("Thé vert"));

        let all = catalog.search("  ").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(catalog.query(), "");
    }

    #[tokio::test]
    async fn test_store_failure_leaves_list_unchanged() {
        let catalog = catalog().await;
        catalog.add(form("Farine", "1")).await.unwrap();

        catalog.db.close().await;

        assert!(matches!(
            catalog.add(form("Levure", "2")).await,
            Err(CatalogError::Store(_))
        ));
        assert!(catalog.refresh().await.is_err());
        assert_eq!(catalog.products().len(), 1);
    }
}
