//! Point of sale: preview, sell, history, return.
//!
//! All four act on the caller's own tenant; the admin is refused.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::QuantityInput;
use crate::state::AppState;
use stockroom_core::{Product, SaleRecord};
use stockroom_db::ReturnOutcome;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub product_id: i64,
    pub quantity: QuantityInput,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    pub quantity: QuantityInput,
}

/// `POST /api/sale/preview`
pub async fn preview(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<Product>, ApiError> {
    let tenant = auth.selling_tenant()?;

    let product = state
        .db
        .sales_processor(&tenant)
        .preview_by_code(&request.code)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No product with code '{}'", request.code.trim())))?;

    Ok(Json(product))
}

/// `POST /api/sale`
pub async fn sell(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<SellRequest>,
) -> Result<(StatusCode, Json<SaleRecord>), ApiError> {
    let tenant = auth.selling_tenant()?;
    let quantity = request.quantity.quantity()?;

    let record = state
        .db
        .sales_processor(&tenant)
        .sell(request.product_id, quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/sales`: newest first.
pub async fn history(auth: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<SaleRecord>>, ApiError> {
    let tenant = auth.selling_tenant()?;

    Ok(Json(state.db.ledger(&tenant).history().await?))
}

/// `POST /api/sales/{id}/return`
///
/// Only the number format is checked here; the processor answers zero,
/// negative or excessive quantities with `INVALID_RETURN_QUANTITY`.
pub async fn return_sale(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
    Json(request): Json<ReturnRequest>,
) -> Result<Json<ReturnOutcome>, ApiError> {
    let tenant = auth.selling_tenant()?;
    let quantity = request.quantity.value()?;

    let outcome = state
        .db
        .sales_processor(&tenant)
        .return_sale(sale_id, quantity)
        .await?;

    Ok(Json(outcome))
}
