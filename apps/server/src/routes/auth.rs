//! Login and session introspection.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{verify_password_blocking, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use stockroom_core::{Principal, Role};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub username: String,
    pub role: Role,
}

/// `POST /api/auth/login`
///
/// Unknown users and wrong passwords get the same answer.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = request.username.trim();

    let user = state.db.users().find_by_username(username).await?;
    let verified = match &user {
        Some(user) => verify_password_blocking(request.password, user.password_hash.clone()).await?,
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        warn!(username, "Login failed");
        return Err(ApiError::unauthorized("Invalid username or password"));
    };

    let principal = Principal::new(user.username, user.role);
    let token = state.jwt.generate_token(&principal)?;

    info!(username = %principal.username, role = principal.role.as_str(), "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        username: principal.username,
        role: principal.role,
    }))
}

/// `GET /api/me`
pub async fn me(AuthUser(principal): AuthUser) -> Json<Principal> {
    Json(principal)
}
