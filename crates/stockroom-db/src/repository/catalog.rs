//! # Catalog Repository
//!
//! Database operations for one tenant's products.
//!
//! ## Key Operations
//! - Exact code lookup (barcode OR QR code) for sale preview
//! - Per-category listing with substring search
//! - CRUD operations
//! - Quantity updates
//!
//! ## Code Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scanner reads: "4006381333931"                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE owner = 'anna'                                                   │
//! │    AND (barcode = '4006381333931' OR qr_code = '4006381333931')         │
//! │  ORDER BY id LIMIT 1                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Codes are not unique per tenant: the oldest product wins, so the      │
//! │  same scan always previews the same product.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use stockroom_core::validation::validate_stock;
use stockroom_core::{NewProduct, Product, ProductUpdate, TenantId};

/// Repository for one tenant's product catalog.
///
/// ## Usage
/// ```rust,ignore
/// let catalog = db.catalog(&TenantId::new("anna"));
///
/// let drinks = catalog.list_by_category("drinks", Some("cola")).await?;
/// let product = catalog.find_by_code("4006381333931").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
    tenant: TenantId,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository for `tenant`.
    pub fn new(pool: SqlitePool, tenant: TenantId) -> Self {
        CatalogRepository { pool, tenant }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Finds a product whose barcode or QR code equals `code` exactly.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_by_code_in(&mut conn, &self.tenant, code).await?)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found in this tenant's catalog
    /// * `Ok(None)` - No such product for this tenant
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_by_id_in(&mut conn, &self.tenant, id).await?)
    }

    /// Sets the stock level of a product.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - Negative or out-of-range quantity
    /// * `Err(DbError::NotFound)` - No such product for this tenant
    pub async fn update_quantity(&self, id: i64, new_quantity: i64) -> DbResult<()> {
        validate_stock(new_quantity)?;

        debug!(tenant = %self.tenant, id, new_quantity, "Updating product quantity");

        let result = sqlx::query("UPDATE products SET quantity = ?3 WHERE id = ?1 AND owner = ?2")
            .bind(id)
            .bind(self.tenant.as_str())
            .bind(new_quantity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// The stored product with its generated id.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_stock(product.quantity)?;

        debug!(tenant = %self.tenant, name = %product.name, category = %product.category, "Inserting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                owner, name, description, barcode, qr_code,
                quantity, category, image
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, owner, name, description, barcode, qr_code, quantity, category, image
            "#,
        )
        .bind(self.tenant.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.barcode)
        .bind(&product.qr_code)
        .bind(product.quantity)
        .bind(&product.category)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates an existing product.
    ///
    /// `update.image == None` keeps the stored image.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the update
    /// * `Err(DbError::NotFound)` - No such product for this tenant
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        validate_stock(update.quantity)?;

        debug!(tenant = %self.tenant, id, "Updating product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?3,
                description = ?4,
                barcode = ?5,
                qr_code = ?6,
                quantity = ?7,
                image = COALESCE(?8, image)
            WHERE id = ?1 AND owner = ?2
            RETURNING id, owner, name, description, barcode, qr_code, quantity, category, image
            "#,
        )
        .bind(id)
        .bind(self.tenant.as_str())
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.barcode)
        .bind(&update.qr_code)
        .bind(update.quantity)
        .bind(&update.image)
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces the stored image name of a product.
    pub async fn set_image(&self, id: i64, image: &str) -> DbResult<Product> {
        debug!(tenant = %self.tenant, id, image, "Setting product image");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET image = ?3
            WHERE id = ?1 AND owner = ?2
            RETURNING id, owner, name, description, barcode, qr_code, quantity, category, image
            "#,
        )
        .bind(id)
        .bind(self.tenant.as_str())
        .bind(image)
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product and returns the removed row, so the caller can
    /// clean up its stored image.
    ///
    /// Sale records that reference it are kept: the ledger holds snapshots.
    pub async fn delete(&self, id: i64) -> DbResult<Product> {
        debug!(tenant = %self.tenant, id, "Deleting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products WHERE id = ?1 AND owner = ?2
            RETURNING id, owner, name, description, barcode, qr_code, quantity, category, image
            "#,
        )
        .bind(id)
        .bind(self.tenant.as_str())
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists products in a category, optionally filtered by a
    /// case-insensitive substring of name, barcode or QR code.
    pub async fn list_by_category(&self, category: &str, search: Option<&str>) -> DbResult<Vec<Product>> {
        debug!(tenant = %self.tenant, category, search = ?search, "Listing products");

        let products = match search {
            Some(search) => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, owner, name, description, barcode, qr_code, quantity, category, image
                    FROM products
                    WHERE owner = ?1 AND category = ?2
                      AND (name LIKE ?3 ESCAPE '\'
                           OR barcode LIKE ?3 ESCAPE '\'
                           OR qr_code LIKE ?3 ESCAPE '\')
                    ORDER BY id
                    "#,
                )
                .bind(self.tenant.as_str())
                .bind(category)
                .bind(like_pattern(search))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, owner, name, description, barcode, qr_code, quantity, category, image
                    FROM products
                    WHERE owner = ?1 AND category = ?2
                    ORDER BY id
                    "#,
                )
                .bind(self.tenant.as_str())
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = products.len(), "Listing returned products");
        Ok(products)
    }

    /// Counts this tenant's products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE owner = ?1")
            .bind(self.tenant.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (shared with the sale processor)
// =============================================================================

pub(crate) async fn find_by_id_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner, name, description, barcode, qr_code, quantity, category, image
        FROM products
        WHERE id = ?1 AND owner = ?2
        "#,
    )
    .bind(id)
    .bind(tenant.as_str())
    .fetch_optional(conn)
    .await
}

pub(crate) async fn find_by_code_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    code: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner, name, description, barcode, qr_code, quantity, category, image
        FROM products
        WHERE owner = ?1 AND (barcode = ?2 OR qr_code = ?2)
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(tenant.as_str())
    .bind(code)
    .fetch_optional(conn)
    .await
}

/// Takes `quantity` units out of stock only if that many are there.
///
/// ## Returns
/// `false` when the guard failed (product gone or not enough stock); nothing
/// was written in that case.
pub(crate) async fn take_stock_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    id: i64,
    quantity: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - ?3
        WHERE id = ?1 AND owner = ?2 AND quantity >= ?3
        "#,
    )
    .bind(id)
    .bind(tenant.as_str())
    .bind(quantity)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Puts `quantity` units back into stock.
///
/// ## Returns
/// `false` when the product no longer exists.
pub(crate) async fn restock_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    id: i64,
    quantity: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET quantity = quantity + ?3 WHERE id = ?1 AND owner = ?2")
        .bind(id)
        .bind(tenant.as_str())
        .bind(quantity)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_product(name: &str, category: &str, barcode: Option<&str>, qr: Option<&str>, quantity: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            barcode: barcode.map(str::to_string),
            qr_code: qr.map(str::to_string),
            quantity,
            category: category.to_string(),
            image: None,
        }
    }

    async fn setup() -> (Database, CatalogRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog(&TenantId::new("anna"));
        (db, catalog)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (_db, catalog) = setup().await;

        let product = catalog
            .insert(&new_product("Cola 0.5l", "drinks", Some("5449000000996"), None, 24))
            .await
            .unwrap();

        assert_eq!(product.owner, "anna");
        assert_eq!(product.quantity, 24);

        let found = catalog.find_by_id(product.id).await.unwrap();
        assert_eq!(found, Some(product));
    }

    #[tokio::test]
    async fn test_find_by_code_matches_barcode_or_qr() {
        let (_db, catalog) = setup().await;

        let cola = catalog
            .insert(&new_product("Cola", "drinks", Some("111"), Some("QR-COLA"), 5))
            .await
            .unwrap();

        assert_eq!(catalog.find_by_code("111").await.unwrap().map(|p| p.id), Some(cola.id));
        assert_eq!(catalog.find_by_code("QR-COLA").await.unwrap().map(|p| p.id), Some(cola.id));
        assert_eq!(catalog.find_by_code("11").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_code_prefers_oldest_duplicate() {
        let (_db, catalog) = setup().await;

        let first = catalog.insert(&new_product("A", "misc", Some("dup"), None, 1)).await.unwrap();
        catalog.insert(&new_product("B", "misc", Some("dup"), None, 1)).await.unwrap();

        assert_eq!(catalog.find_by_code("dup").await.unwrap().map(|p| p.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let (db, anna) = setup().await;
        let boris = db.catalog(&TenantId::new("boris"));

        let product = anna.insert(&new_product("Tea", "drinks", Some("222"), None, 3)).await.unwrap();

        assert_eq!(boris.find_by_id(product.id).await.unwrap(), None);
        assert_eq!(boris.find_by_code("222").await.unwrap(), None);
        assert!(boris.list_by_category("drinks", None).await.unwrap().is_empty());
        assert!(matches!(boris.delete(product.id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(
            boris.update_quantity(product.id, 0).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(anna.count().await.unwrap(), 1);
        assert_eq!(boris.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_by_category_with_search() {
        let (_db, catalog) = setup().await;

        catalog.insert(&new_product("Cola Zero", "drinks", Some("123"), None, 1)).await.unwrap();
        catalog.insert(&new_product("Orange juice", "drinks", Some("456"), Some("QR-OJ"), 1)).await.unwrap();
        catalog.insert(&new_product("Cola gummies", "sweets", None, None, 1)).await.unwrap();

        let drinks = catalog.list_by_category("drinks", None).await.unwrap();
        assert_eq!(drinks.len(), 2);

        let cola = catalog.list_by_category("drinks", Some("cola")).await.unwrap();
        assert_eq!(cola.len(), 1);
        assert_eq!(cola[0].name, "Cola Zero");

        let by_qr = catalog.list_by_category("drinks", Some("qr-o")).await.unwrap();
        assert_eq!(by_qr.len(), 1);
        assert_eq!(by_qr[0].name, "Orange juice");

        let wildcard = catalog.list_by_category("drinks", Some("%")).await.unwrap();
        assert!(wildcard.is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_image_when_none() {
        let (_db, catalog) = setup().await;

        let mut new = new_product("Mug", "kitchen", None, None, 2);
        new.image = Some("mug.png".to_string());
        let product = catalog.insert(&new).await.unwrap();

        let updated = catalog
            .update(
                product.id,
                &ProductUpdate {
                    name: "Big mug".to_string(),
                    description: Some("400ml".to_string()),
                    barcode: Some("777".to_string()),
                    qr_code: None,
                    quantity: 9,
                    image: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Big mug");
        assert_eq!(updated.quantity, 9);
        assert_eq!(updated.image.as_deref(), Some("mug.png"));
        assert_eq!(updated.category, "kitchen");

        let with_image = catalog.set_image(product.id, "big-mug.png").await.unwrap();
        assert_eq!(with_image.image.as_deref(), Some("big-mug.png"));
    }

    #[tokio::test]
    async fn test_update_quantity_rejects_negative() {
        let (_db, catalog) = setup().await;
        let product = catalog.insert(&new_product("Pen", "stationery", None, None, 2)).await.unwrap();

        assert!(matches!(
            catalog.update_quantity(product.id, -1).await,
            Err(DbError::InvalidInput(_))
        ));

        catalog.update_quantity(product.id, 0).await.unwrap();
        assert_eq!(catalog.find_by_id(product.id).await.unwrap().unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_db, catalog) = setup().await;
        let product = catalog.insert(&new_product("Pen", "stationery", None, None, 2)).await.unwrap();

        let removed = catalog.delete(product.id).await.unwrap();
        assert_eq!(removed, product);
        assert_eq!(catalog.find_by_id(product.id).await.unwrap(), None);
        assert!(matches!(catalog.delete(product.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_take_stock_guard() {
        let (db, catalog) = setup().await;
        let product = catalog.insert(&new_product("Pen", "stationery", None, None, 3)).await.unwrap();
        let tenant = TenantId::new("anna");

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!take_stock_in(&mut conn, &tenant, product.id, 4).await.unwrap());
        assert!(take_stock_in(&mut conn, &tenant, product.id, 3).await.unwrap());
        assert!(!take_stock_in(&mut conn, &tenant, product.id, 1).await.unwrap());
        assert!(restock_in(&mut conn, &tenant, product.id, 2).await.unwrap());
        assert!(!restock_in(&mut conn, &tenant, product.id + 100, 2).await.unwrap());
        drop(conn);

        assert_eq!(catalog.find_by_id(product.id).await.unwrap().unwrap().quantity, 2);
    }
}
