//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - create / get / list / whole-record update
//! - Barcode-or-text search
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Catalog Search Works                             │
//! │                                                                         │
//! │  Operator types or scans: "613"                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  barcode   = '613'          exact (a scan never matches partially)     │
//! │  reference LIKE '%613%'     substring, ASCII case-insensitive          │
//! │  title     LIKE '%613%'     substring, ASCII case-insensitive          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Any of the three → row returned, ordered by id                        │
//! │                                                                         │
//! │  '%' and '_' typed by the operator are matched literally               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use crate::error::{DbError, DbResult};
use sennada_core::{NewProduct, Product, ProductId};

/// Column list shared by every SELECT so `Product`'s `FromRow` always lines up.
const PRODUCT_COLUMNS: &str = r#"
    id,
    reference,
    barcode,
    title,
    detail_price,
    wholesale_price,
    semi_wholesale_price,
    stock,
    is_follow_stock,
    image_data,
    mime_type,
    size,
    created_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let created = repo.create(&NewProduct::titled("Lait 1L")).await?;
/// let found = repo.search("lait").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns it as stored.
    ///
    /// The id comes from SQLite (`AUTOINCREMENT`, never reused) and
    /// `created_at` is stamped here, once.
    #[instrument(skip_all, fields(title = %form.title))]
    pub async fn create(&self, form: &NewProduct) -> DbResult<Product> {
        debug!("Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                reference, barcode, title,
                detail_price, wholesale_price, semi_wholesale_price,
                stock, is_follow_stock,
                image_data, mime_type, size,
                created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11,
                ?12
            )
            "#,
        )
        .bind(&form.reference)
        .bind(&form.barcode)
        .bind(&form.title)
        .bind(form.detail_price)
        .bind(form.wholesale_price)
        .bind(form.semi_wholesale_price)
        .bind(form.stock)
        .bind(form.is_follow_stock)
        .bind(&form.image_data)
        .bind(&form.mime_type)
        .bind(form.size)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "Product inserted");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("inserted product {} vanished", id)))
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets the first product carrying exactly this barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE barcode = ?1 ORDER BY id LIMIT 1",
            PRODUCT_COLUMNS
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists the whole catalog, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Replaces every field of an existing product.
    ///
    /// `id` selects the row; `created_at` is never written.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - No product with that id
    #[instrument(skip_all, fields(id = product.id))]
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!("Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                reference = ?2,
                barcode = ?3,
                title = ?4,
                detail_price = ?5,
                wholesale_price = ?6,
                semi_wholesale_price = ?7,
                stock = ?8,
                is_follow_stock = ?9,
                image_data = ?10,
                mime_type = ?11,
                size = ?12
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.reference)
        .bind(&product.barcode)
        .bind(&product.title)
        .bind(product.detail_price)
        .bind(product.wholesale_price)
        .bind(product.semi_wholesale_price)
        .bind(product.stock)
        .bind(product.is_follow_stock)
        .bind(&product.image_data)
        .bind(&product.mime_type)
        .bind(product.size)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Searches by exact barcode or by substring of reference/title.
    ///
    /// An empty (or blank) query returns the whole catalog.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = query.trim();

        if query.is_empty() {
            return self.list_all().await;
        }

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {} FROM products
            WHERE barcode = ?1
               OR reference LIKE ?2 ESCAPE '\'
               OR title LIKE ?2 ESCAPE '\'
            ORDER BY id
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(query)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Counts products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE wildcards so operator input is matched literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use sennada_core::Money;

    async fn repo() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn form(title: &str, reference: Option<&str>, barcode: Option<&str>) -> NewProduct {
        NewProduct {
            reference: reference.map(str::to_string),
            barcode: barcode.map(str::to_string),
            detail_price: Money::from_cents(12_000),
            wholesale_price: Money::from_cents(10_000),
            semi_wholesale_price: Money::from_cents(11_000),
            stock: 4.5,
            ..NewProduct::titled(title)
        }
    }

    #[tokio::test]
    async fn test_create_then_list_contains_exactly_one_new_record() {
        let repo = repo().await;
        let first = repo.create(&form("Lait 1L", None, None)).await.unwrap();

        let input = NewProduct {
            is_follow_stock: false,
            image_data: Some("aGVsbG8=".to_string()),
            mime_type: Some("image/png".to_string()),
            ..form("Café moulu 250g", Some("CAF-250"), Some("6130000000024"))
        };
        let created = repo.create(&input).await.unwrap();

        assert_ne!(created.id, first.id);
        assert_eq!(NewProduct::from(&created), input);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|p| p.id == created.id).count(), 1);
        assert_eq!(all[1], created);
    }

    #[tokio::test]
    async fn test_ids_are_increasing() {
        let repo = repo().await;
        let mut last = 0;
        for i in 0..5 {
            let product = repo
                .create(&NewProduct::titled(format!("Produit {}", i)))
                .await
                .unwrap();
            assert!(product.id > last);
            last = product.id;
        }
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_update_then_get_returns_record() {
        let repo = repo().await;
        let created = repo
            .create(&form("Sucre 1kg", Some("SUC-1"), Some("111")))
            .await
            .unwrap();

        let mut edited = created.clone();
        edited.title = Some("Sucre 2kg".to_string());
        edited.reference = None;
        edited.barcode = Some("222".to_string());
        edited.detail_price = Money::from_cents(24_000);
        edited.stock = -1.0;
        edited.is_follow_stock = false;
        repo.update(&edited).await.unwrap();

        let read = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(read, edited);
        assert_eq!(read.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_ignores_created_at_change() {
        let repo = repo().await;
        let created = repo.create(&NewProduct::titled("Sel")).await.unwrap();

        let mut edited = created.clone();
        edited.created_at = created.created_at - chrono::Duration::days(30);
        repo.update(&edited).await.unwrap();

        let read = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(read.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo().await;
        let mut ghost = repo.create(&NewProduct::titled("Ghost")).await.unwrap();
        ghost.id = 9_999;

        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let repo = repo().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_by_exact_barcode() {
        let repo = repo().await;
        let target = repo
            .create(&form("Eau minérale", None, Some("6130000000017")))
            .await
            .unwrap();
        repo.create(&form("Eau gazeuse", None, Some("6130000000018")))
            .await
            .unwrap();

        let results = repo.search("6130000000017").await.unwrap();
        assert_eq!(results, vec![target]);

        // Barcodes never match on a fragment
        assert!(repo.search("61300000000").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_partial_title_and_reference() {
        let repo = repo().await;
        let semoule = repo.create(&form("Semoule fine", None, None)).await.unwrap();
        let grosse = repo
            .create(&form("Semoule grosse", None, None))
            .await
            .unwrap();
        let huile = repo
            .create(&form("Huile", Some("SEM-OIL"), None))
            .await
            .unwrap();
        repo.create(&form("Pâtes", None, None)).await.unwrap();

        let by_title = repo.search("moule").await.unwrap();
        assert_eq!(by_title, vec![semoule.clone(), grosse.clone()]);

        let case_insensitive = repo.search("SEM").await.unwrap();
        assert_eq!(case_insensitive, vec![semoule, grosse, huile]);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = repo().await;
        let promo = repo.create(&form("Promo 50%", None, None)).await.unwrap();
        repo.create(&form("Promo 500", None, None)).await.unwrap();

        assert_eq!(repo.search("50%").await.unwrap(), vec![promo]);
        assert!(repo.search("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_lists_everything() {
        let repo = repo().await;
        repo.create(&NewProduct::titled("A")).await.unwrap();
        repo.create(&NewProduct::titled("B")).await.unwrap();

        assert_eq!(repo.search("   ").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_barcode() {
        let repo = repo().await;
        let created = repo
            .create(&form("Biscuits", None, Some("777")))
            .await
            .unwrap();

        assert_eq!(repo.get_by_barcode("777").await.unwrap(), Some(created));
        assert_eq!(repo.get_by_barcode("778").await.unwrap(), None);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
