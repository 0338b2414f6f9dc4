//! # Sale Transaction Processor
//!
//! Turns a scanned code into a preview, a sale into a stock decrement plus a
//! ledger entry, and a return into a ledger adjustment plus a restock. Each
//! sale and each return is one SQLite transaction: either every row changes
//! or none does.
//!
//! Both open with `BEGIN IMMEDIATE`. The write lock is taken before the first
//! read, so a concurrent sale waits on the busy timeout instead of failing
//! with `database is locked` when it tries to upgrade a stale read snapshot.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sell(product_id = 12, quantity = 5)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                                                        │
//! │       │                                                                 │
//! │       ├── SELECT product 12 for tenant ─► plan_sale (core rules)        │
//! │       │        └── ProductNotFound / InsufficientStock ─► ROLLBACK      │
//! │       │                                                                 │
//! │       ├── UPDATE quantity = quantity - 5                                │
//! │       │   WHERE ... AND quantity >= 5                                   │
//! │       │        └── 0 rows (lost a race) ─► re-read, report, ROLLBACK    │
//! │       │                                                                 │
//! │       ├── INSERT sales_history (name/barcode snapshot, now)             │
//! │       ▼                                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Return Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  return_sale(sale_id = 40, quantity = r)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                                                        │
//! │       ├── SELECT record 40 for tenant ─► plan_return (core rules)       │
//! │       ├── Full:    DELETE record      WHERE quantity = <read value>     │
//! │       ├── Partial: UPDATE quantity    WHERE quantity = <read value>     │
//! │       ├── UPDATE products quantity = quantity + r                       │
//! │       │        └── 0 rows: product deleted, ledger-only return          │
//! │       ▼                                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a `sqlx::Transaction` without committing rolls it back, so every
//! early `return Err(..)` leaves the store untouched.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::ProcessResult;
use crate::repository::{catalog, ledger};
use stockroom_core::sale::{plan_return, plan_sale, ReturnPlan};
use stockroom_core::validation::validate_code;
use stockroom_core::{CoreError, NewSaleRecord, Product, SaleRecord, TenantId};

/// Opens a transaction that holds the write lock from its first statement.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Result of a successful return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    /// The record after the return; `None` when it was fully returned and
    /// deleted.
    pub sale: Option<SaleRecord>,

    /// Whether the units went back into stock. `false` when the product
    /// had been deleted since the sale.
    pub restocked: bool,
}

/// Sale and return operations for one tenant.
///
/// ## Usage
/// ```rust,ignore
/// let processor = db.sales_processor(&TenantId::new("anna"));
///
/// if let Some(product) = processor.preview_by_code("4006381333931").await? {
///     let record = processor.sell(product.id, 2).await?;
///     processor.return_sale(record.id, 1).await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    tenant: TenantId,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool, tenant: TenantId) -> Self {
        SaleProcessor { pool, tenant }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Finds the product a scanned code refers to. Read-only.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Barcode or QR code matched exactly
    /// * `Ok(None)` - Nothing in this tenant's catalog carries the code
    /// * `Err(..)` - Code was empty or too long
    pub async fn preview_by_code(&self, code: &str) -> ProcessResult<Option<Product>> {
        let code = validate_code(code)?;

        let mut conn = self.pool.acquire().await?;
        let product = catalog::find_by_code_in(&mut conn, &self.tenant, &code).await?;

        debug!(
            tenant = %self.tenant,
            code = %code,
            found = product.is_some(),
            "Previewed product by code"
        );

        Ok(product)
    }

    /// Sells `quantity` units of a product.
    ///
    /// ## Returns
    /// * `Ok(SaleRecord)` - The new ledger entry
    /// * `Err(CoreError::Validation)` - Quantity not a positive number
    /// * `Err(CoreError::ProductNotFound)` - No such product for this tenant
    /// * `Err(CoreError::InsufficientStock)` - Not enough units in stock
    pub async fn sell(&self, product_id: i64, quantity: i64) -> ProcessResult<SaleRecord> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let product = catalog::find_by_id_in(&mut tx, &self.tenant, product_id).await?;

        let plan = match plan_sale(product_id, product.as_ref(), quantity) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(tenant = %self.tenant, product_id, quantity, error = %err, "Sale rejected");
                return Err(err.into());
            }
        };
        let Some(product) = product else {
            return Err(CoreError::ProductNotFound(product_id).into());
        };

        if !catalog::take_stock_in(&mut tx, &self.tenant, product_id, quantity).await? {
            let err = self.stock_conflict(&mut tx, product_id, quantity).await?;
            warn!(tenant = %self.tenant, product_id, quantity, error = %err, "Sale lost a stock race");
            return Err(err.into());
        }

        let record = NewSaleRecord::snapshot(&product, quantity, Utc::now());
        let record = ledger::append_in(&mut tx, &self.tenant, &record).await?;

        tx.commit().await?;

        info!(
            tenant = %self.tenant,
            sale_id = record.id,
            product_id,
            quantity,
            remaining = plan.remaining,
            "Sale recorded"
        );

        Ok(record)
    }

    /// Takes back `quantity` units of a recorded sale.
    ///
    /// ## Returns
    /// * `Ok(ReturnOutcome)` - Record shrunk or deleted, stock restored if
    ///   the product still exists
    /// * `Err(CoreError::SaleNotFound)` - No such record (or already fully
    ///   returned)
    /// * `Err(CoreError::InvalidReturnQuantity)` - Zero, negative, or more
    ///   than the record holds
    pub async fn return_sale(&self, sale_id: i64, quantity: i64) -> ProcessResult<ReturnOutcome> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let Some(record) = ledger::find_by_id_in(&mut tx, &self.tenant, sale_id).await? else {
            warn!(tenant = %self.tenant, sale_id, "Return rejected: sale not found");
            return Err(CoreError::SaleNotFound(sale_id).into());
        };

        let plan = match plan_return(sale_id, record.quantity, quantity) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(tenant = %self.tenant, sale_id, quantity, error = %err, "Return rejected");
                return Err(err.into());
            }
        };

        let applied = match plan {
            ReturnPlan::Full => ledger::delete_if_in(&mut tx, &self.tenant, sale_id, record.quantity).await?,
            ReturnPlan::Partial { remaining } => {
                ledger::reduce_if_in(&mut tx, &self.tenant, sale_id, record.quantity, remaining).await?
            }
        };

        if !applied {
            let err = self.return_conflict(&mut tx, sale_id, quantity).await?;
            warn!(tenant = %self.tenant, sale_id, quantity, error = %err, "Return lost a ledger race");
            return Err(err.into());
        }

        let restocked = catalog::restock_in(&mut tx, &self.tenant, record.product_id, quantity).await?;

        tx.commit().await?;

        let sale = match plan {
            ReturnPlan::Full => None,
            ReturnPlan::Partial { remaining } => Some(SaleRecord {
                quantity: remaining,
                ..record
            }),
        };

        if restocked {
            info!(tenant = %self.tenant, sale_id, quantity, full = plan.is_full(), "Return processed");
        } else {
            info!(
                tenant = %self.tenant,
                sale_id,
                quantity,
                full = plan.is_full(),
                "Return processed without restock: product no longer exists"
            );
        }

        Ok(ReturnOutcome { sale, restocked })
    }

    /// Explains why a guarded decrement touched no row.
    async fn stock_conflict(
        &self,
        conn: &mut SqliteConnection,
        product_id: i64,
        quantity: i64,
    ) -> ProcessResult<CoreError> {
        let current = catalog::find_by_id_in(conn, &self.tenant, product_id).await?;

        Ok(match current {
            None => CoreError::ProductNotFound(product_id),
            Some(product) => CoreError::InsufficientStock {
                product_id,
                available: product.quantity,
                requested: quantity,
            },
        })
    }

    /// Explains why a guarded ledger adjustment touched no row.
    async fn return_conflict(
        &self,
        conn: &mut SqliteConnection,
        sale_id: i64,
        quantity: i64,
    ) -> ProcessResult<CoreError> {
        let current = ledger::find_by_id_in(conn, &self.tenant, sale_id).await?;

        Ok(match current {
            None => CoreError::SaleNotFound(sale_id),
            Some(record) => CoreError::InvalidReturnQuantity {
                sale_id,
                available: record.quantity,
                requested: quantity,
            },
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::{NewProduct, ValidationError};

    async fn setup() -> (Database, TenantId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (db, TenantId::new("anna"))
    }

    async fn add_product(db: &Database, tenant: &TenantId, barcode: &str, quantity: i64) -> Product {
        db.catalog(tenant)
            .insert(&NewProduct {
                name: "Pencil HB".to_string(),
                description: None,
                barcode: Some(barcode.to_string()),
                qr_code: Some(format!("QR-{barcode}")),
                quantity,
                category: "stationery".to_string(),
                image: None,
            })
            .await
            .unwrap()
    }

    /// A file database shared by several pooled connections.
    async fn setup_file(max_connections: u32) -> (tempfile::TempDir, Database, TenantId) {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("stockroom.db")).max_connections(max_connections);
        let db = Database::new(config).await.unwrap();
        (dir, db, TenantId::new("anna"))
    }

    async fn ledger_total(db: &Database, tenant: &TenantId) -> i64 {
        db.ledger(tenant).history().await.unwrap().iter().map(|r| r.quantity).sum()
    }

    async fn stock(db: &Database, tenant: &TenantId, id: i64) -> i64 {
        db.catalog(tenant).find_by_id(id).await.unwrap().unwrap().quantity
    }

    fn core(err: ProcessError) -> CoreError {
        match err {
            ProcessError::Core(err) => err,
            ProcessError::Db(err) => panic!("expected a rule violation, got {err:?}"),
        }
    }

    #[tokio::test]
    async fn test_preview_by_code() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "4006381333931", 4).await;
        let processor = db.sales_processor(&tenant);

        let by_barcode = processor.preview_by_code("4006381333931").await.unwrap();
        assert_eq!(by_barcode.map(|p| p.id), Some(product.id));

        let by_qr = processor.preview_by_code("QR-4006381333931").await.unwrap();
        assert_eq!(by_qr.map(|p| p.id), Some(product.id));

        assert_eq!(processor.preview_by_code("0000").await.unwrap(), None);
        assert_eq!(stock(&db, &tenant, product.id).await, 4);
    }

    #[tokio::test]
    async fn test_preview_rejects_empty_code() {
        let (db, tenant) = setup().await;

        let err = db.sales_processor(&tenant).preview_by_code("   ").await.unwrap_err();
        assert!(matches!(core(err), CoreError::Validation(ValidationError::Required { .. })));
    }

    #[tokio::test]
    async fn test_sell_and_return_lifecycle() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "111", 20).await;
        let processor = db.sales_processor(&tenant);

        let record = processor.sell(product.id, 5).await.unwrap();
        assert_eq!(record.quantity, 5);
        assert_eq!(record.product_id, product.id);
        assert_eq!(record.name, "Pencil HB");
        assert_eq!(record.barcode.as_deref(), Some("111"));
        assert_eq!(stock(&db, &tenant, product.id).await, 15);

        let partial = processor.return_sale(record.id, 2).await.unwrap();
        assert!(partial.restocked);
        assert_eq!(partial.sale.as_ref().map(|s| s.quantity), Some(3));
        assert_eq!(stock(&db, &tenant, product.id).await, 17);
        assert_eq!(
            db.ledger(&tenant).find_by_id(record.id).await.unwrap().map(|r| r.quantity),
            Some(3)
        );

        let full = processor.return_sale(record.id, 3).await.unwrap();
        assert!(full.restocked);
        assert_eq!(full.sale, None);
        assert_eq!(stock(&db, &tenant, product.id).await, 20);
        assert_eq!(db.ledger(&tenant).find_by_id(record.id).await.unwrap(), None);

        let again = processor.return_sale(record.id, 3).await.unwrap_err();
        assert_eq!(core(again), CoreError::SaleNotFound(record.id));
        assert_eq!(stock(&db, &tenant, product.id).await, 20);
    }

    #[tokio::test]
    async fn test_sell_insufficient_stock_writes_nothing() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "222", 5).await;

        let err = db.sales_processor(&tenant).sell(product.id, 999).await.unwrap_err();
        assert_eq!(
            core(err),
            CoreError::InsufficientStock {
                product_id: product.id,
                available: 5,
                requested: 999,
            }
        );
        assert_eq!(stock(&db, &tenant, product.id).await, 5);
        assert_eq!(db.ledger(&tenant).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sell_entire_stock() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "333", 3).await;
        let processor = db.sales_processor(&tenant);

        processor.sell(product.id, 3).await.unwrap();
        assert_eq!(stock(&db, &tenant, product.id).await, 0);

        let err = processor.sell(product.id, 1).await.unwrap_err();
        assert!(matches!(core(err), CoreError::InsufficientStock { available: 0, .. }));
    }

    #[tokio::test]
    async fn test_sell_rejects_non_positive_quantity() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "444", 3).await;
        let processor = db.sales_processor(&tenant);

        for quantity in [0, -2] {
            let err = processor.sell(product.id, quantity).await.unwrap_err();
            assert!(matches!(core(err), CoreError::Validation(_)));
        }
        assert_eq!(stock(&db, &tenant, product.id).await, 3);
        assert_eq!(db.ledger(&tenant).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sell_unknown_product() {
        let (db, tenant) = setup().await;

        let err = db.sales_processor(&tenant).sell(404, 1).await.unwrap_err();
        assert_eq!(core(err), CoreError::ProductNotFound(404));
    }

    #[tokio::test]
    async fn test_invalid_return_quantities() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "555", 10).await;
        let processor = db.sales_processor(&tenant);
        let record = processor.sell(product.id, 4).await.unwrap();

        for quantity in [0, -1, 5] {
            let err = processor.return_sale(record.id, quantity).await.unwrap_err();
            assert_eq!(
                core(err),
                CoreError::InvalidReturnQuantity {
                    sale_id: record.id,
                    available: 4,
                    requested: quantity,
                }
            );
        }

        assert_eq!(stock(&db, &tenant, product.id).await, 6);
        assert_eq!(
            db.ledger(&tenant).find_by_id(record.id).await.unwrap().map(|r| r.quantity),
            Some(4)
        );
    }

    #[tokio::test]
    async fn test_return_after_product_deleted_is_ledger_only() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "666", 10).await;
        let processor = db.sales_processor(&tenant);
        let record = processor.sell(product.id, 4).await.unwrap();

        db.catalog(&tenant).delete(product.id).await.unwrap();

        let partial = processor.return_sale(record.id, 1).await.unwrap();
        assert!(!partial.restocked);
        assert_eq!(partial.sale.map(|s| s.quantity), Some(3));

        let full = processor.return_sale(record.id, 3).await.unwrap();
        assert!(!full.restocked);
        assert_eq!(full.sale, None);
        assert_eq!(db.ledger(&tenant).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_product_edit() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "777", 10).await;
        let record = db.sales_processor(&tenant).sell(product.id, 1).await.unwrap();

        db.catalog(&tenant)
            .update(
                product.id,
                &stockroom_core::ProductUpdate {
                    name: "Pencil 2B".to_string(),
                    description: None,
                    barcode: Some("888".to_string()),
                    qr_code: None,
                    quantity: 9,
                    image: None,
                },
            )
            .await
            .unwrap();

        let stored = db.ledger(&tenant).find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Pencil HB");
        assert_eq!(stored.barcode.as_deref(), Some("777"));
    }

    #[tokio::test]
    async fn test_tenants_cannot_touch_each_other() {
        let (db, anna) = setup().await;
        let boris = TenantId::new("boris");
        let product = add_product(&db, &anna, "999", 10).await;
        let record = db.sales_processor(&anna).sell(product.id, 2).await.unwrap();

        let processor = db.sales_processor(&boris);
        assert_eq!(processor.preview_by_code("999").await.unwrap(), None);
        assert_eq!(
            core(processor.sell(product.id, 1).await.unwrap_err()),
            CoreError::ProductNotFound(product.id)
        );
        assert_eq!(
            core(processor.return_sale(record.id, 1).await.unwrap_err()),
            CoreError::SaleNotFound(record.id)
        );

        assert_eq!(stock(&db, &anna, product.id).await, 8);
        assert_eq!(db.ledger(&boris).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_return_does_not_restock_other_tenants_product() {
        let (db, anna) = setup().await;
        let boris = TenantId::new("boris");
        let product = add_product(&db, &anna, "123", 10).await;

        let foreign = db
            .ledger(&boris)
            .append(&NewSaleRecord {
                product_id: product.id,
                name: "Pencil HB".to_string(),
                barcode: None,
                quantity: 2,
                sold_at: Utc::now(),
            })
            .await
            .unwrap();

        let outcome = db.sales_processor(&boris).return_sale(foreign.id, 2).await.unwrap();
        assert!(!outcome.restocked);
        assert_eq!(stock(&db, &anna, product.id).await, 10);
    }

    async fn concurrent_sells(db: &Database, tenant: &TenantId, product_id: i64, sales: usize) -> (usize, usize) {
        let handles: Vec<_> = (0..sales)
            .map(|_| {
                let processor = db.sales_processor(tenant);
                tokio::spawn(async move { processor.sell(product_id, 1).await })
            })
            .collect();

        let mut sold = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(ProcessError::Core(CoreError::InsufficientStock { .. })) => refused += 1,
                Err(err) => panic!("concurrent sale failed in storage: {err:?}"),
            }
        }
        (sold, refused)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sells_with_plenty_of_stock_all_succeed() {
        let (_dir, db, tenant) = setup_file(8).await;
        let product = add_product(&db, &tenant, "1001", 100).await;

        let (sold, refused) = concurrent_sells(&db, &tenant, product.id, 20).await;

        assert_eq!((sold, refused), (20, 0));
        assert_eq!(stock(&db, &tenant, product.id).await, 80);
        assert_eq!(ledger_total(&db, &tenant).await, 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sells_never_oversell() {
        let (_dir, db, tenant) = setup_file(8).await;
        let product = add_product(&db, &tenant, "1002", 3).await;

        let (sold, refused) = concurrent_sells(&db, &tenant, product.id, 20).await;

        assert_eq!((sold, refused), (3, 17));
        let remaining = stock(&db, &tenant, product.id).await;
        assert_eq!(remaining, 0);
        assert_eq!(remaining + ledger_total(&db, &tenant).await, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_returns_never_over_return() {
        let (_dir, db, tenant) = setup_file(8).await;
        let product = add_product(&db, &tenant, "1003", 10).await;
        let record = db.sales_processor(&tenant).sell(product.id, 4).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let processor = db.sales_processor(&tenant);
                tokio::spawn(async move { processor.return_sale(record.id, 1).await })
            })
            .collect();

        let mut returned = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => {
                    assert!(outcome.restocked);
                    returned += 1;
                }
                Err(ProcessError::Core(CoreError::SaleNotFound(_))) => {}
                Err(err) => panic!("concurrent return failed in storage: {err:?}"),
            }
        }

        assert_eq!(returned, 4);
        assert_eq!(stock(&db, &tenant, product.id).await, 10);
        assert_eq!(db.ledger(&tenant).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stock_stays_non_negative_through_mixed_sequence() {
        let (db, tenant) = setup().await;
        let product = add_product(&db, &tenant, "1004", 6).await;
        let product_id = product.id;
        let processor = db.sales_processor(&tenant);

        let check = |label: &'static str| {
            let db = db.clone();
            let tenant = tenant.clone();
            async move {
                let remaining = stock(&db, &tenant, product_id).await;
                assert!(remaining >= 0, "{label}: stock went negative");
                assert_eq!(remaining + ledger_total(&db, &tenant).await, 6, "{label}: units lost");
            }
        };

        let first = processor.sell(product.id, 4).await.unwrap();
        check("sell 4").await;

        let second = processor.sell(product.id, 2).await.unwrap();
        check("sell 2").await;

        assert!(processor.sell(product.id, 1).await.is_err());
        check("sell from empty").await;

        processor.return_sale(first.id, 1).await.unwrap();
        check("partial return").await;

        assert!(processor.return_sale(first.id, 4).await.is_err());
        check("over-return").await;

        processor.sell(product.id, 1).await.unwrap();
        check("sell returned unit").await;

        processor.return_sale(second.id, 2).await.unwrap();
        check("full return").await;

        processor.return_sale(first.id, 3).await.unwrap();
        check("return the rest").await;

        assert_eq!(stock(&db, &tenant, product.id).await, 5);
        assert_eq!(ledger_total(&db, &tenant).await, 1);
    }
}
