/// Registration, login and refresh-token lifecycle
///
/// # Flow
///
/// 1. `register` creates a `user`-role account (username and email must be unused).
/// 2. `login` accepts a username or an email and returns an access JWT plus an
///    opaque refresh token, which is stored on the user row.
/// 3. `refresh` swaps a live refresh token for a new pair (rotation).
/// 4. `revoke` clears the stored refresh token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::jwt::{create_token, generate_refresh_token, Claims, JwtSettings};
use crate::auth::password::{hash_password, verify_password};
use crate::clock::SharedClock;
use crate::models::user::{CreateUser, User, UserRole};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Tokens and identity returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token expiry
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt: JwtSettings,
    clock: SharedClock,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: JwtSettings, clock: SharedClock) -> Self {
        Self { pool, jwt, clock }
    }

    /// Creates a new `user`-role account
    ///
    /// # Errors
    ///
    /// `BadRequest` when the username or email is already taken, including by
    /// a disabled account.
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<User> {
        if User::exists_by_username(&self.pool, &input.username).await? {
            return Err(ServiceError::BadRequest(
                "Username is already in use".to_string(),
            ));
        }

        if User::exists_by_email(&self.pool, &input.email).await? {
            return Err(ServiceError::BadRequest(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let user = User::create(
            &self.pool,
            CreateUser {
                id: None,
                username: input.username,
                email: input.email,
                password_hash,
                role: UserRole::User,
            },
        )
        .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticates by username or email
    ///
    /// # Errors
    ///
    /// `Unauthorized` for unknown users, wrong passwords and disabled accounts.
    pub async fn login(&self, username_or_email: &str, password: &str) -> ServiceResult<AuthResponse> {
        let user = User::find_for_login(&self.pool, username_or_email).await?;

        let user = match user {
            Some(user) if self.password_matches(password, &user) => user,
            _ => {
                info!(login = %username_or_email, "Login rejected");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !user.is_active {
            return Err(ServiceError::Unauthorized("Account is disabled".to_string()));
        }

        let response = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(response)
    }

    /// Rotates a live refresh token
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<AuthResponse> {
        let user = User::find_by_valid_refresh_token(&self.pool, refresh_token, self.clock.utc())
            .await?
            .ok_or_else(|| {
                ServiceError::Unauthorized("Invalid or expired refresh token".to_string())
            })?;

        self.issue_tokens(&user).await
    }

    /// Forgets a refresh token
    ///
    /// # Errors
    ///
    /// `BadRequest` when no user holds the token.
    pub async fn revoke(&self, refresh_token: &str) -> ServiceResult<()> {
        let user = User::find_by_refresh_token(&self.pool, refresh_token)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Invalid refresh token".to_string()))?;

        User::set_refresh_token(&self.pool, user.id, None, None).await?;
        info!(user_id = %user.id, "Refresh token revoked");
        Ok(())
    }

    fn password_matches(&self, password: &str, user: &User) -> bool {
        match verify_password(password, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }

    async fn issue_tokens(&self, user: &User) -> ServiceResult<AuthResponse> {
        let now = self.clock.utc();
        let claims = Claims::for_user(user, &self.jwt, now);
        let access_token = create_token(&claims, &self.jwt.secret)?;

        let refresh_token = generate_refresh_token();
        User::set_refresh_token(
            &self.pool,
            user.id,
            Some(&refresh_token),
            Some(self.jwt.refresh_expires_at(now)),
        )
        .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_at: self.jwt.access_expires_at(now),
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        })
    }
}
