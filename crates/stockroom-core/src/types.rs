//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleRecord    │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │◄ ─│  product_id     │   │  id (i64)       │       │
//! │  │  owner (tenant) │   │  owner (tenant) │   │  username       │       │
//! │  │  barcode / qr   │   │  name snapshot  │   │  password_hash  │       │
//! │  │  quantity ≥ 0   │   │  quantity > 0   │   │  role           │       │
//! │  │  category       │   │  sold_at        │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  The product link is soft: a record outlives its product.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Role
// =============================================================================

/// What an account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Provisions workers and manages any worker's catalog.
    Admin,
    /// Owns one catalog and one ledger; sells and takes returns.
    Worker,
}

impl Role {
    /// Lowercase name as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Worker => "worker",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in a tenant's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique within the catalog.
    pub id: i64,

    /// Tenant (worker username) owning this product.
    pub owner: String,

    /// Display name.
    pub name: String,

    pub description: Option<String>,

    /// Barcode (EAN-13, UPC-A, ...). Uniqueness is not enforced.
    pub barcode: Option<String>,

    /// QR code payload. Uniqueness is not enforced.
    pub qr_code: Option<String>,

    /// Units in stock. Never negative.
    pub quantity: i64,

    /// Free-form category ("drinks", "stationery", ...).
    pub category: String,

    /// Stored file name of the product image, if one was uploaded.
    pub image: Option<String>,
}

impl Product {
    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.quantity >= quantity
    }

    /// True when `code` equals the barcode or the QR code exactly.
    pub fn matches_code(&self, code: &str) -> bool {
        self.barcode.as_deref() == Some(code) || self.qr_code.as_deref() == Some(code)
    }
}

/// Fields for a product about to be created.
///
/// The owner and category come from the request path, never from the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub quantity: i64,
    pub category: String,
    pub image: Option<String>,
}

/// Replacement values for an edited product.
///
/// `image: None` keeps the current image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub quantity: i64,
    pub image: Option<String>,
}

// =============================================================================
// Sale Record
// =============================================================================

/// One line in a tenant's sales ledger.
///
/// Uses the snapshot pattern: name and barcode are frozen at the time of
/// sale, so the record still reads correctly after the product is edited or
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleRecord {
    pub id: i64,
    pub owner: String,
    /// Soft link to the product sold.
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Barcode at time of sale (frozen).
    pub barcode: Option<String>,
    /// Units still counted as sold. Shrinks with partial returns.
    pub quantity: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

/// A ledger entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleRecord {
    pub product_id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub sold_at: DateTime<Utc>,
}

impl NewSaleRecord {
    /// Snapshots `product` for a sale of `quantity` units at `sold_at`.
    pub fn snapshot(product: &Product, quantity: i64, sold_at: DateTime<Utc>) -> Self {
        NewSaleRecord {
            product_id: product.id,
            name: product.name.clone(),
            barcode: product.barcode.clone(),
            quantity,
            sold_at,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// An account that can log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
