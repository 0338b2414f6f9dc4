//! # Ledger Repository
//!
//! Database operations for one tenant's sales history.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sell ──► append (quantity q)                                           │
//! │              │                                                          │
//! │              ├── partial return r ──► quantity = q - r (guarded)        │
//! │              │                                                          │
//! │              └── full return ──────► row deleted (guarded)              │
//! │                                                                         │
//! │  "Guarded" means the statement only applies if the row still holds     │
//! │  the quantity the caller read, so two concurrent returns can never     │
//! │  both succeed against the same units.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes normally go through [`crate::SaleProcessor`]; the repository
//! methods here are the read side plus direct maintenance operations.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::validation::validate_quantity;
use stockroom_core::{NewSaleRecord, SaleRecord, TenantId};

/// Repository for one tenant's sales ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
    tenant: TenantId,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository for `tenant`.
    pub fn new(pool: SqlitePool, tenant: TenantId) -> Self {
        LedgerRepository { pool, tenant }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Gets a sale record by its ID.
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_by_id_in(&mut conn, &self.tenant, id).await?)
    }

    /// Appends a sale record outside of a sale transaction.
    pub async fn append(&self, record: &NewSaleRecord) -> DbResult<SaleRecord> {
        validate_quantity(record.quantity)?;

        let mut conn = self.pool.acquire().await?;
        Ok(append_in(&mut conn, &self.tenant, record).await?)
    }

    /// Overwrites the quantity held by a record.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - Quantity is not positive
    /// * `Err(DbError::NotFound)` - No such record for this tenant
    pub async fn update_quantity(&self, id: i64, quantity: i64) -> DbResult<()> {
        validate_quantity(quantity)?;

        debug!(tenant = %self.tenant, id, quantity, "Updating sale record quantity");

        let result = sqlx::query("UPDATE sales_history SET quantity = ?3 WHERE id = ?1 AND owner = ?2")
            .bind(id)
            .bind(self.tenant.as_str())
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SaleRecord", id));
        }

        Ok(())
    }

    /// Deletes a record.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(tenant = %self.tenant, id, "Deleting sale record");

        let result = sqlx::query("DELETE FROM sales_history WHERE id = ?1 AND owner = ?2")
            .bind(id)
            .bind(self.tenant.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SaleRecord", id));
        }

        Ok(())
    }

    /// Lists the whole ledger, newest first.
    pub async fn history(&self) -> DbResult<Vec<SaleRecord>> {
        let records = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT id, owner, product_id, name, barcode, quantity, sold_at
            FROM sales_history
            WHERE owner = ?1
            ORDER BY id DESC
            "#,
        )
        .bind(self.tenant.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!(tenant = %self.tenant, count = records.len(), "Loaded sales history");
        Ok(records)
    }

    /// Counts this tenant's sale records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_history WHERE owner = ?1")
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
) -> Result<Option<SaleRecord>, sqlx::Error> {
    sqlx::query_as::<_, SaleRecord>(
        r#"
        SELECT id, owner, product_id, name, barcode, quantity, sold_at
        FROM sales_history
        WHERE id = ?1 AND owner = ?2
        "#,
    )
    .bind(id)
    .bind(tenant.as_str())
    .fetch_optional(conn)
    .await
}

pub(crate) async fn append_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    record: &NewSaleRecord,
) -> Result<SaleRecord, sqlx::Error> {
    sqlx::query_as::<_, SaleRecord>(
        r#"
        INSERT INTO sales_history (owner, product_id, name, barcode, quantity, sold_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id, owner, product_id, name, barcode, quantity, sold_at
        "#,
    )
    .bind(tenant.as_str())
    .bind(record.product_id)
    .bind(&record.name)
    .bind(&record.barcode)
    .bind(record.quantity)
    .bind(record.sold_at)
    .fetch_one(conn)
    .await
}

/// Shrinks a record to `remaining` units if it still holds `expected`.
pub(crate) async fn reduce_if_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    id: i64,
    expected: i64,
    remaining: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE sales_history SET quantity = ?4
        WHERE id = ?1 AND owner = ?2 AND quantity = ?3
        "#,
    )
    .bind(id)
    .bind(tenant.as_str())
    .bind(expected)
    .bind(remaining)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Deletes a record if it still holds `expected` units.
pub(crate) async fn delete_if_in(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    id: i64,
    expected: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sales_history WHERE id = ?1 AND owner = ?2 AND quantity = ?3")
        .bind(id)
        .bind(tenant.as_str())
        .bind(expected)
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
    use chrono::Utc;

    fn record(product_id: i64, name: &str, quantity: i64) -> NewSaleRecord {
        NewSaleRecord {
            product_id,
            name: name.to_string(),
            barcode: Some("4006381333931".to_string()),
            quantity,
            sold_at: Utc::now(),
        }
    }

    async fn setup() -> (Database, LedgerRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger(&TenantId::new("anna"));
        (db, ledger)
    }

    #[tokio::test]
    async fn test_append_and_find() {
        let (_db, ledger) = setup().await;

        let new = record(7, "Pencil HB", 3);
        let stored = ledger.append(&new).await.unwrap();

        assert_eq!(stored.owner, "anna");
        assert_eq!(stored.product_id, 7);
        assert_eq!(stored.quantity, 3);
        assert_eq!(stored.barcode.as_deref(), Some("4006381333931"));

        let found = ledger.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(found.id, stored.id);
        assert_eq!(found.name, "Pencil HB");
        assert_eq!(found.sold_at.timestamp(), new.sold_at.timestamp());
    }

    #[tokio::test]
    async fn test_append_rejects_non_positive_quantity() {
        let (_db, ledger) = setup().await;

        assert!(matches!(
            ledger.append(&record(1, "Pen", 0)).await,
            Err(DbError::InvalidInput(_))
        ));
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_tenant_scoped() {
        let (db, ledger) = setup().await;
        let other = db.ledger(&TenantId::new("boris"));

        let first = ledger.append(&record(1, "Pen", 1)).await.unwrap();
        let second = ledger.append(&record(2, "Ink", 2)).await.unwrap();
        other.append(&record(3, "Tape", 1)).await.unwrap();

        let history = ledger.history().await.unwrap();
        let ids: Vec<i64> = history.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert_eq!(other.history().await.unwrap().len(), 1);
        assert_eq!(other.find_by_id(first.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_quantity_and_delete() {
        let (_db, ledger) = setup().await;
        let stored = ledger.append(&record(1, "Pen", 5)).await.unwrap();

        ledger.update_quantity(stored.id, 2).await.unwrap();
        assert_eq!(ledger.find_by_id(stored.id).await.unwrap().unwrap().quantity, 2);

        ledger.delete(stored.id).await.unwrap();
        assert_eq!(ledger.find_by_id(stored.id).await.unwrap(), None);
        assert!(matches!(
            ledger.update_quantity(stored.id, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_guarded_adjustments() {
        let (db, ledger) = setup().await;
        let tenant = TenantId::new("anna");
        let stored = ledger.append(&record(1, "Pen", 5)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!reduce_if_in(&mut conn, &tenant, stored.id, 4, 1).await.unwrap());
        assert!(reduce_if_in(&mut conn, &tenant, stored.id, 5, 3).await.unwrap());
        assert!(!delete_if_in(&mut conn, &tenant, stored.id, 5).await.unwrap());
        assert!(delete_if_in(&mut conn, &tenant, stored.id, 3).await.unwrap());
        drop(conn);

        assert_eq!(ledger.count().await.unwrap(), 0);
    }
}
