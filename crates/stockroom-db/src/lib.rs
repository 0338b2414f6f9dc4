//! # stockroom-db: Database Layer for Stockroom
//!
//! Database access for the Stockroom service: SQLite through sqlx, one pool
//! shared by every tenant, rows partitioned by `owner`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/sale)                                         │
//! │       │  TenantId from the verified principal                           │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌─────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │  Repositories   │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │   │  catalog (per   │   │  (embedded)  │   │   │
//! │  │   │               │◄──│  tenant), ledger│   │              │   │   │
//! │  │   │  SqlitePool   │   │  (per tenant),  │   │ 001_users    │   │   │
//! │  │   │               │   │  users          │   │ 002_catalog… │   │   │
//! │  │   └───────▲───────┘   └─────────────────┘   └──────────────┘   │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────┴───────────────────────────┐                         │   │
//! │  │   │  SaleProcessor (processor.rs)     │  one transaction per    │   │
//! │  │   │  preview_by_code / sell / return  │  sale or return         │   │
//! │  │   └───────────────────────────────────┘                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, ledger and user repositories
//! - [`processor`] - The sale transaction processor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_core::TenantId;
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/stockroom.db")).await?;
//! let tenant = TenantId::new("anna");
//!
//! let product = db.sales_processor(&tenant).preview_by_code("4006381333931").await?;
//! let sale = db.sales_processor(&tenant).sell(product.id, 2).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod processor;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ProcessError, ProcessResult};
pub use pool::{Database, DbConfig};
pub use processor::{ReturnOutcome, SaleProcessor};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::users::UserRepository;
