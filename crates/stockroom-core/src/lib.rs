//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Domain types and rules for a multi-tenant inventory and point-of-sale
//! service. Nothing in this crate touches a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/server)                       │   │
//! │  │    login ─► catalog CRUD ─► preview ─► sell ─► return          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Principal + TenantId                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   sale    │  │  tenant   │  │ validation│  │   │
//! │  │   │  Product  │  │ plan_sale │  │ Principal │  │   rules   │  │   │
//! │  │   │SaleRecord │  │plan_return│  │ TenantId  │  │  parsing  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db (Database Layer)                  │   │
//! │  │        SQLite, repositories, sale transaction processor         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, SaleRecord, User, ...)
//! - [`tenant`] - Tenant identifiers and the request-scoped principal
//! - [`sale`] - Sale and return planning (the stock/ledger state machine)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and fail-closed parsing
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::sale::{plan_return, ReturnPlan};
//!
//! // A sale of 5 units, 2 come back: the record stays with 3.
//! let plan = plan_return(7, 5, 2).unwrap();
//! assert_eq!(plan, ReturnPlan::Partial { remaining: 3 });
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod sale;
pub mod tenant;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use tenant::{Principal, TenantId};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Username of the built-in administrator account.
///
/// Created at server start if missing. It owns no catalog and cannot sell.
pub const ADMIN_USERNAME: &str = "admin";

/// Largest quantity accepted in a single sale, return or stock entry.
///
/// ## Business Reason
/// Catches typos (an extra zero or a scanned barcode pasted into the
/// quantity field) before they reach the ledger.
pub const MAX_QUANTITY: i64 = 1_000_000;
