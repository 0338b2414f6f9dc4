//! # Sale and Return Planning
//!
//! The decision half of the sale transaction processor. These functions look
//! at the current rows and say what must be written; `stockroom-db` applies
//! the plan inside one transaction.
//!
//! ## Sale Record State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   sell(product, q) ──► Active { quantity: q }                          │
//! │                              │                                          │
//! │                              │ return r, 0 < r < quantity               │
//! │                              ▼                                          │
//! │                        Active { quantity: q - r }  ◄─┐                  │
//! │                              │                       │ return r < rest  │
//! │                              ├───────────────────────┘                  │
//! │                              │ return r == quantity                     │
//! │                              ▼                                          │
//! │                        FullyReturned (row deleted, terminal)           │
//! │                                                                         │
//! │   Every return adds r back to the product, if it still exists.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::Product;
use crate::validation::validate_quantity;

/// What a successful sale does to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePlan {
    pub product_id: i64,
    /// Stock before the sale.
    pub available: i64,
    /// Stock after the sale. Never negative.
    pub remaining: i64,
}

/// What a successful return does to the ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPlan {
    /// Everything came back: delete the record.
    Full,
    /// Keep the record with `remaining` units.
    Partial { remaining: i64 },
}

impl ReturnPlan {
    pub fn is_full(&self) -> bool {
        matches!(self, ReturnPlan::Full)
    }
}

/// Decides whether `quantity` units of `product_id` can be sold.
///
/// ## Validation Order
/// 1. `quantity` must be a positive, in-range number
/// 2. The product must exist (`None` → `ProductNotFound`)
/// 3. Stock must cover the quantity (else `InsufficientStock`)
pub fn plan_sale(product_id: i64, product: Option<&Product>, quantity: i64) -> CoreResult<SalePlan> {
    validate_quantity(quantity)?;

    let product = product.ok_or(CoreError::ProductNotFound(product_id))?;

    if !product.can_sell(quantity) {
        return Err(CoreError::InsufficientStock {
            product_id,
            available: product.quantity,
            requested: quantity,
        });
    }

    Ok(SalePlan {
        product_id,
        available: product.quantity,
        remaining: product.quantity - quantity,
    })
}

/// Decides how a return of `return_quantity` units settles a sale that
/// currently holds `sold_quantity` units.
///
/// Zero, negative and excessive quantities are rejected with
/// `InvalidReturnQuantity` instead of being ignored.
pub fn plan_return(sale_id: i64, sold_quantity: i64, return_quantity: i64) -> CoreResult<ReturnPlan> {
    if return_quantity <= 0 || return_quantity > sold_quantity {
        return Err(CoreError::InvalidReturnQuantity {
            sale_id,
            available: sold_quantity,
            requested: return_quantity,
        });
    }

    if return_quantity == sold_quantity {
        Ok(ReturnPlan::Full)
    } else {
        Ok(ReturnPlan::Partial {
            remaining: sold_quantity - return_quantity,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
