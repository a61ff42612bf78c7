/// Startup seed data
///
/// The default labels come from the labels migration. The administrator
/// account needs a password hash, so it is created here at startup instead.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password, PasswordError};
use crate::models::user::{CreateUser, User, UserRole};

pub const ADMIN_USER_ID: Uuid = Uuid::from_u128(0xaaaaaaaa_aaaa_aaaa_aaaa_aaaaaaaaaaaa);
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@taskmanager.com";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Creates the administrator account unless a user named `admin` exists
///
/// The password is not checked against the registration strength rules.
/// Returns `true` when the account was created.
pub async fn ensure_admin_user(pool: &PgPool, password: &str) -> Result<bool, SeedError> {
    if User::exists_by_username(pool, ADMIN_USERNAME).await? {
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    User::create(
        pool,
        CreateUser {
            id: Some(ADMIN_USER_ID),
            username: ADMIN_USERNAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash,
            role: UserRole::Admin,
        },
    )
    .await?;

    info!(user_id = %ADMIN_USER_ID, "Seeded administrator account");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_id() {
        assert_eq!(
            ADMIN_USER_ID.to_string(),
            "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"
        );
    }
}
