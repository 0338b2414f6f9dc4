//! Worker provisioning (admin only).
//!
//! Creating a worker only inserts a `users` row: catalog and ledger tables
//! are shared and partitioned by owner, so a new tenant needs no DDL.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password_blocking, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use stockroom_core::validation::{validate_password, validate_username};
use stockroom_core::{Role, TenantId, User};

#[derive(Debug, Deserialize)]
pub struct CreateWorkerRequest {
    pub username: String,
    pub password: String,
}

/// Summary shown on a worker's card.
#[derive(Debug, Serialize)]
pub struct WorkerCard {
    #[serde(flatten)]
    pub user: User,
    pub product_count: i64,
    pub sale_count: i64,
}

/// `GET /api/admin/workers`
pub async fn list_workers(auth: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    auth.require_admin()?;

    Ok(Json(state.db.users().list_workers().await?))
}

/// `POST /api/admin/workers`
pub async fn create_worker(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateWorkerRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    auth.require_admin()?;

    let username = validate_username(&request.username)?;
    validate_password(&request.password)?;

    let hash = hash_password_blocking(request.password).await?;
    let user = state.db.users().create(&username, &hash, Role::Worker).await?;

    info!(username = %user.username, "Worker provisioned");

    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/admin/workers/{username}`
pub async fn get_worker(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<WorkerCard>, ApiError> {
    auth.require_admin()?;

    let user = state
        .db
        .users()
        .find_by_username(&username)
        .await?
        .filter(|u| u.role == Role::Worker)
        .ok_or_else(|| ApiError::not_found(format!("Worker not found: {}", username)))?;

    let tenant = TenantId::new(user.username.clone());
    let product_count = state.db.catalog(&tenant).count().await?;
    let sale_count = state.db.ledger(&tenant).count().await?;

    Ok(Json(WorkerCard {
        user,
        product_count,
        sale_count,
    }))
}
