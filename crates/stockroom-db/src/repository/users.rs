//! # User Repository
//!
//! Accounts that can log in. A worker's username doubles as the tenant id
//! stamped on their catalog and ledger rows; the single admin account owns
//! no rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockroom_core::{Role, User, ADMIN_USERNAME};

/// Repository for account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks up an account for login.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates an account.
    ///
    /// ## Returns
    /// * `Ok(User)` - The stored account
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    pub async fn create(&self, username: &str, password_hash: &str, role: Role) -> DbResult<User> {
        debug!(username, role = role.as_str(), "Creating user");

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                info!(username, role = role.as_str(), "User created");
                Ok(user)
            }
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("username", username)),
                other => Err(other),
            },
        }
    }

    /// Lists worker accounts in creation order.
    pub async fn list_workers(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE role = ?1
            ORDER BY id
            "#,
        )
        .bind(Role::Worker)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Creates the admin account if it does not exist yet.
    ///
    /// An existing admin keeps its password.
    ///
    /// ## Returns
    /// `true` when the account was created by this call.
    pub async fn ensure_admin(&self, password_hash: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(ADMIN_USERNAME)
        .bind(password_hash)
        .bind(Role::Admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            info!(username = ADMIN_USERNAME, "Admin account created");
        }

        Ok(created)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> UserRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let users = setup().await;

        let created = users.create("anna", "$argon2id$fake", Role::Worker).await.unwrap();
        assert_eq!(created.username, "anna");
        assert_eq!(created.role, Role::Worker);

        let found = users.find_by_username("anna").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "$argon2id$fake");

        assert_eq!(users.find_by_username("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let users = setup().await;

        users.create("anna", "h1", Role::Worker).await.unwrap();
        let err = users.create("anna", "h2", Role::Worker).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "username");
                assert_eq!(value, "anna");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let users = setup().await;

        assert!(users.ensure_admin("first").await.unwrap());
        assert!(!users.ensure_admin("second").await.unwrap());

        let admin = users.find_by_username(ADMIN_USERNAME).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.password_hash, "first");
    }

    #[tokio::test]
    async fn test_list_workers_excludes_admin() {
        let users = setup().await;

        users.ensure_admin("hash").await.unwrap();
        users.create("anna", "h", Role::Worker).await.unwrap();
        users.create("boris", "h", Role::Worker).await.unwrap();

        let names: Vec<String> = users
            .list_workers()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["anna".to_string(), "boris".to_string()]);
    }
}
