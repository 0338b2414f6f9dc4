//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /health                                         health::check          │
//! │  /api/auth/login                                 auth::login            │
//! │  /api/me                                         auth::me               │
//! │                                                                         │
//! │  /api/admin/workers              (admin)         admin::*               │
//! │  /api/admin/workers/{username}   (admin)                                │
//! │                                                                         │
//! │  /api/tenants/{tenant}/categories/{category}/products   catalog::*      │
//! │  /api/tenants/{tenant}/products/{id}       (owner or admin)             │
//! │  /api/tenants/{tenant}/products/{id}/image                              │
//! │  /uploads/{stored name}           (public, static files)                │
//! │                                                                         │
//! │  /api/sale/preview                (worker, own tenant)  sale::*         │
//! │  /api/sale                                                              │
//! │  /api/sales                                                             │
//! │  /api/sales/{id}/return                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod sale;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::state::AppState;
use stockroom_core::validation::{
    parse_quantity, parse_stock, parse_whole_number, validate_quantity, validate_stock, ValidationResult,
};

/// Multipart framing on top of the image bytes.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the API router for `state`.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/health", get(health::check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/me", get(auth::me))
        .route(
            "/api/admin/workers",
            get(admin::list_workers).post(admin::create_worker),
        )
        .route("/api/admin/workers/:username", get(admin::get_worker))
        .route(
            "/api/tenants/:tenant/categories/:category/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/api/tenants/:tenant/products/:id",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route(
            "/api/tenants/:tenant/products/:id/image",
            post(catalog::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/sale/preview", post(sale::preview))
        .route("/api/sale", post(sale::sell))
        .route("/api/sales", get(sale::history))
        .route("/api/sales/:id/return", post(sale::return_sale))
        .nest_service("/uploads", uploads)
        .with_state(state)
}

/// A quantity as clients send it: `3` or `"3"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(i64),
    Text(String),
}

impl QuantityInput {
    /// The whole number carried, before any range check. Returns use this.
    pub fn value(&self) -> ValidationResult<i64> {
        match self {
            QuantityInput::Number(n) => Ok(*n),
            QuantityInput::Text(raw) => parse_whole_number(raw),
        }
    }

    /// A sale quantity: positive and within `MAX_QUANTITY`.
    pub fn quantity(&self) -> ValidationResult<i64> {
        match self {
            QuantityInput::Number(n) => validate_quantity(*n).map(|()| *n),
            QuantityInput::Text(raw) => parse_quantity(raw),
        }
    }

    /// A stock level for the product form: zero allowed.
    pub fn stock(&self) -> ValidationResult<i64> {
        match self {
            QuantityInput::Number(n) => validate_stock(*n).map(|()| *n),
            QuantityInput::Text(raw) => parse_stock(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_input_accepts_numbers_and_strings() {
        let number: QuantityInput = serde_json::from_str("3").unwrap();
        let text: QuantityInput = serde_json::from_str("\" 4 \"").unwrap();
        let junk: QuantityInput = serde_json::from_str("\"four\"").unwrap();

        assert_eq!(number.value().unwrap(), 3);
        assert_eq!(text.value().unwrap(), 4);
        assert!(junk.value().is_err());
    }

    #[test]
    fn test_quantity_input_ranges() {
        let zero: QuantityInput = serde_json::from_str("\"0\"").unwrap();
        let negative = QuantityInput::Number(-2);
        let five = QuantityInput::Text("5".to_string());

        assert!(zero.quantity().is_err());
        assert_eq!(zero.stock().unwrap(), 0);
        assert_eq!(zero.value().unwrap(), 0);

        assert!(negative.quantity().is_err());
        assert!(negative.stock().is_err());
        assert_eq!(negative.value().unwrap(), -2);

        assert_eq!(five.quantity().unwrap(), 5);
        assert_eq!(five.stock().unwrap(), 5);
        assert!(QuantityInput::Number(1_000_001).quantity().is_err());
    }
}
