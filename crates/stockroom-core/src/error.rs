//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Sale/return rule violations                    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ProcessError     - CoreError | DbError from the processor         │
//! │                                                                         │
//! │  Server errors (apps/server)                                           │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ProcessError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every variant is recoverable and request-scoped

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Sale and return rule violations.
///
/// None of these is fatal: the HTTP layer maps each one to a status code
/// and a message, and the store is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product does not exist in the tenant's catalog.
    ///
    /// ## When This Occurs
    /// - Id belongs to another tenant
    /// - Product was deleted between preview and sale
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Requested quantity exceeds current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Preview "4006381333931" ──► Pencil (stock: 3)
    ///      │
    ///      ▼
    /// Sell qty 5
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 12, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Nothing written. Client shows "Only 3 in stock".
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Sale record does not exist in the tenant's ledger.
    ///
    /// Also the outcome of repeating a full return: the first call deleted
    /// the record.
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Return quantity is zero, negative, or larger than what is left on
    /// the sale record.
    #[error("Invalid return quantity for sale {sale_id}: {requested} requested, {available} returnable")]
    InvalidReturnQuantity {
        sale_id: i64,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (non-numeric quantity, bad file name, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
