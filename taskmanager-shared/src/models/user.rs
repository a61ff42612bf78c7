/// User model and database operations
///
/// Users authenticate with a username (or email) and password, own projects,
/// create tasks and may be assigned tasks. Deleting a user is a soft delete
/// via `is_active`; uniqueness checks still see inactive rows.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(50) NOT NULL UNIQUE,
///     email VARCHAR(100) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     refresh_token VARCHAR(256),
///     refresh_token_expiry TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account row
///
/// `password_hash` and the refresh token never leave the service layer;
/// responses go through `UserResponse`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub role: UserRole,
    pub is_active: bool,

    /// Opaque refresh token, rotated on every refresh
    pub refresh_token: Option<String>,
    pub refresh_token_expiry: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Explicit id; `None` lets the database generate one
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
    /// Argon2id hash, never the plaintext password
    pub password_hash: String,
    pub role: UserRole,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_active, \
     refresh_token, refresh_token_expiry, created_at, updated_at";

impl User {
    /// Inserts a new active user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the username or email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash, role)
             VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.id)
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.role)
            .fetch_one(pool)
            .await
    }

    /// Finds an active user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND is_active = TRUE"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username or email, active or not
    pub async fn find_for_login(
        pool: &PgPool,
        username_or_email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username = $1 OR email = $1
             ORDER BY (username = $1) DESC
             LIMIT 1"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(username_or_email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the active user holding `token`, if it has not expired at `now`
    pub async fn find_by_valid_refresh_token(
        pool: &PgPool,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE refresh_token = $1 AND refresh_token_expiry > $2 AND is_active = TRUE"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Finds the user holding `token`, expired or not
    pub async fn find_by_refresh_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE refresh_token = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Stores (or clears, with `None`) the refresh token and its expiry
    pub async fn set_refresh_token(
        pool: &PgPool,
        id: Uuid,
        token: Option<&str>,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $2, refresh_token_expiry = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expiry)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active users ordered by username
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE is_active = TRUE
             ORDER BY username
             LIMIT $1 OFFSET $2"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts active users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Whether an active user with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND is_active = TRUE)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Whether the username is taken, including by inactive accounts
    pub async fn exists_by_username(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(pool)
            .await
    }

    /// Whether the email is taken, including by inactive accounts
    pub async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
