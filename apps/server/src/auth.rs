//! JWT authentication module.
//!
//! Handles password hashing, token generation and validation, and turns the
//! `Authorization: Bearer` header into an [`AuthUser`] for handlers.
//!
//! ```text
//! POST /api/auth/login {username, password}
//!      │  verify_password (argon2)
//!      ▼
//! JwtManager::generate_token ──► "eyJ..."
//!
//! GET /api/sales  Authorization: Bearer eyJ...
//!      │  AuthUser extractor: validate_token
//!      ▼
//! Principal { username, role } ──► handler
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use stockroom_core::{Principal, Role, TenantId};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager { secret, lifetime_secs }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate a session token for `principal`.
    pub fn generate_token(&self, principal: &Principal) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: principal.username.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)
}

// =============================================================================
// Request extractor
// =============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Tenant the caller may sell from: their own. Admins have none.
    pub fn selling_tenant(&self) -> Result<TenantId, ApiError> {
        self.0
            .own_tenant()
            .ok_or_else(|| ApiError::forbidden("Only workers can sell and take returns"))
    }

    /// Authorises catalog management of `tenant`.
    ///
    /// Workers may only name themselves. The admin may name any worker, but
    /// not an unknown user or an admin account: rows under such a name would
    /// belong to nobody.
    pub async fn managed_tenant(&self, state: &AppState, tenant: &str) -> Result<TenantId, ApiError> {
        let tenant = TenantId::new(tenant);
        if !self.0.can_manage(&tenant) {
            return Err(ApiError::forbidden(format!("No access to tenant '{}'", tenant)));
        }

        if self.0.is_admin() {
            let is_worker = state
                .db
                .users()
                .find_by_username(tenant.as_str())
                .await?
                .is_some_and(|user| user.role == Role::Worker);
            if !is_worker {
                return Err(ApiError::not_found(format!("Worker not found: {}", tenant)));
            }
        }

        Ok(tenant)
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.jwt.validate_token(token)?;

        Ok(AuthUser(Principal::new(claims.sub, claims.role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::error::ErrorCode;
    use stockroom_db::{Database, DbConfig};

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager
            .generate_token(&Principal::new("anna", Role::Worker))
            .unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "anna");
        assert_eq!(claims.role, Role::Worker);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600);
        let verifier = JwtManager::new("secret-b".to_string(), 3600);

        let token = issuer.generate_token(&Principal::new("anna", Role::Worker)).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway
        let manager = JwtManager::new("test-secret".to_string(), -120);

        let token = manager.generate_token(&Principal::new("anna", Role::Worker)).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("s3cret").unwrap();

        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_blocking_password_helpers() {
        let hash = hash_password_blocking("s3cret".to_string()).await.unwrap();

        assert!(verify_password_blocking("s3cret".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("wrong".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_tenant_authorisation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().create("boris", "hash", Role::Worker).await.unwrap();
        db.users().ensure_admin("hash").await.unwrap();
        let state = AppState::new(db, ServerConfig::for_tests());

        let worker = AuthUser(Principal::new("anna", Role::Worker));
        let admin = AuthUser(Principal::new("admin", Role::Admin));

        assert_eq!(worker.selling_tenant().unwrap(), TenantId::new("anna"));
        assert!(admin.selling_tenant().is_err());

        assert!(worker.managed_tenant(&state, "anna").await.is_ok());
        assert_eq!(
            worker.managed_tenant(&state, "boris").await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert_eq!(admin.managed_tenant(&state, "boris").await.unwrap(), TenantId::new("boris"));

        for orphan in ["ghost", "admin"] {
            let err = admin.managed_tenant(&state, orphan).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::NotFound, "tenant {orphan}");
        }

        assert!(worker.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }
}
