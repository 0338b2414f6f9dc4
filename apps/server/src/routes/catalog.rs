//! Catalog management: list, create, view, edit, delete, image upload.
//!
//! Every route names the tenant in its path. Workers may only use their own
//! name there; the admin may use any worker's.
//!
//! Uploaded images live in the upload directory under their stored name and
//! are served from `/uploads/{stored name}`. Replacing an image or deleting
//! its product removes the old file.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path as FsPath;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::QuantityInput;
use crate::state::AppState;
use stockroom_core::validation::{
    optional_text, sanitize_image_filename, validate_category, validate_product_name, validate_search_query,
};
use stockroom_core::{NewProduct, Product, ProductUpdate, ValidationError};

const MAX_DESCRIPTION: usize = 2000;
const MAX_CODE: usize = 128;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// Body of product create and edit.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
    pub quantity: QuantityInput,
}

/// Validated form of [`ProductInput`].
struct ProductFields {
    name: String,
    description: Option<String>,
    barcode: Option<String>,
    qr_code: Option<String>,
    quantity: i64,
}

impl ProductInput {
    fn validate(&self) -> Result<ProductFields, ValidationError> {
        let quantity = self.quantity.stock()?;

        Ok(ProductFields {
            name: validate_product_name(&self.name)?,
            description: optional_text("description", self.description.as_deref(), MAX_DESCRIPTION)?,
            barcode: optional_text("barcode", self.barcode.as_deref(), MAX_CODE)?,
            qr_code: optional_text("qr_code", self.qr_code.as_deref(), MAX_CODE)?,
            quantity,
        })
    }
}

/// `GET /api/tenants/{tenant}/categories/{category}/products?search=`
pub async fn list_products(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((tenant, category)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let tenant = auth.managed_tenant(&state, &tenant).await?;
    let category = validate_category(&category)?;
    let search = validate_search_query(query.search.as_deref())?;

    let products = state
        .db
        .catalog(&tenant)
        .list_by_category(&category, search.as_deref())
        .await?;

    Ok(Json(products))
}

/// `POST /api/tenants/{tenant}/categories/{category}/products`
pub async fn create_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((tenant, category)): Path<(String, String)>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let tenant = auth.managed_tenant(&state, &tenant).await?;
    let category = validate_category(&category)?;
    let fields = input.validate()?;

    let product = state
        .db
        .catalog(&tenant)
        .insert(&NewProduct {
            name: fields.name,
            description: fields.description,
            barcode: fields.barcode,
            qr_code: fields.qr_code,
            quantity: fields.quantity,
            category,
            image: None,
        })
        .await?;

    info!(tenant = %tenant, product_id = product.id, by = %auth.0.username, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/tenants/{tenant}/products/{id}`
pub async fn get_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, i64)>,
) -> Result<Json<Product>, ApiError> {
    let tenant = auth.managed_tenant(&state, &tenant).await?;

    let product = state
        .db
        .catalog(&tenant)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?;

    Ok(Json(product))
}

/// `PUT /api/tenants/{tenant}/products/{id}`
///
/// The stored image is kept; images change only through the upload route.
pub async fn update_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, i64)>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    let tenant = auth.managed_tenant(&state, &tenant).await?;
    let fields = input.validate()?;

    let product = state
        .db
        .catalog(&tenant)
        .update(
            id,
            &ProductUpdate {
                name: fields.name,
                description: fields.description,
                barcode: fields.barcode,
                qr_code: fields.qr_code,
                quantity: fields.quantity,
                image: None,
            },
        )
        .await?;

    info!(tenant = %tenant, product_id = id, by = %auth.0.username, "Product updated");

    Ok(Json(product))
}

/// `DELETE /api/tenants/{tenant}/products/{id}`
pub async fn delete_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let tenant = auth.managed_tenant(&state, &tenant).await?;

    let removed = state.db.catalog(&tenant).delete(id).await?;

    if let Some(image) = removed.image.as_deref() {
        remove_image(&state.config.upload_dir, image).await;
    }

    info!(tenant = %tenant, product_id = id, by = %auth.0.username, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/tenants/{tenant}/products/{id}/image`
///
/// Multipart form with one file field named `image`. The stored name is
/// `{uuid}_{sanitized original name}`.
pub async fn upload_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, i64)>,
    mut multipart: Multipart,
) -> Result<Json<Product>, ApiError> {
    let tenant = auth.managed_tenant(&state, &tenant).await?;
    let catalog = state.db.catalog(&tenant);

    let previous = catalog
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?
        .image;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let sanitized = sanitize_image_filename(&original)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed upload: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::validation("image is empty"));
        }

        if data.len() > state.config.max_upload_bytes {
            warn!(tenant = %tenant, product_id = id, size = data.len(), "Image upload too large");
            return Err(ApiError::validation(format!(
                "image must be at most {} bytes",
                state.config.max_upload_bytes
            )));
        }

        let stored_name = format!("{}_{}", Uuid::new_v4(), sanitized);

        tokio::fs::create_dir_all(&state.config.upload_dir)
            .await
            .map_err(ApiError::internal)?;
        tokio::fs::write(state.config.upload_dir.join(&stored_name), &data)
            .await
            .map_err(ApiError::internal)?;

        let product = match catalog.set_image(id, &stored_name).await {
            Ok(product) => product,
            Err(err) => {
                remove_image(&state.config.upload_dir, &stored_name).await;
                return Err(err.into());
            }
        };

        if let Some(previous) = previous.as_deref() {
            remove_image(&state.config.upload_dir, previous).await;
        }

        info!(tenant = %tenant, product_id = id, image = %stored_name, size = data.len(), "Product image stored");

        return Ok(Json(product));
    }

    Err(ApiError::validation("image is required"))
}

/// Deletes a stored image file. A file that is already gone is fine; other
/// failures are only logged.
async fn remove_image(upload_dir: &FsPath, stored_name: &str) {
    match tokio::fs::remove_file(upload_dir.join(stored_name)).await {
        Ok(()) => debug!(image = stored_name, "Image file removed"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(image = stored_name, error = %err, "Failed to remove image file"),
    }
}
