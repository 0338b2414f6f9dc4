//! Shared application state.

use std::sync::Arc;

use tracing::info;

use crate::auth::{hash_password_blocking, JwtManager};
use crate::config::ServerConfig;
use crate::error::ApiError;
use stockroom_db::Database;

/// Read-only state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);

        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// Creates the admin account on first start.
    pub async fn bootstrap_admin(&self) -> Result<(), ApiError> {
        let hash = hash_password_blocking(self.config.admin_password.clone()).await?;

        if !self.db.users().ensure_admin(&hash).await? {
            info!("Admin account already present");
        }

        Ok(())
    }
}
