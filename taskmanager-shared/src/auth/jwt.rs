/// JWT access tokens and opaque refresh tokens
///
/// Access tokens are HS256-signed JWTs carrying the user's identity and role.
/// Refresh tokens are not JWTs: they are 64 random bytes, hex-encoded, stored
/// on the user row and rotated on every use.
///
/// # Validation
///
/// - Signature (HS256)
/// - `exp` and `nbf`
/// - `iss` must equal the configured issuer
/// - `aud` must equal the configured audience
///
/// # Example
///
/// ```
/// use taskmanager_shared::auth::jwt::{create_token, validate_token, Claims, JwtSettings};
/// use taskmanager_shared::models::user::UserRole;
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = JwtSettings::new("a-secret-that-is-at-least-32-bytes-long");
/// let claims = Claims::new(Uuid::new_v4(), "alice", "alice@example.com", UserRole::User, &settings, Utc::now());
///
/// let token = create_token(&claims, &settings.secret)?;
/// let validated = validate_token(&token, &settings)?;
/// assert_eq!(validated.name, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{User, UserRole};

pub const DEFAULT_ISSUER: &str = "TaskManager";
pub const DEFAULT_AUDIENCE: &str = "TaskManagerClient";
pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 60;
pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;

/// Random bytes in a refresh token (hex doubles the length)
const REFRESH_TOKEN_BYTES: usize = 64;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    #[error("Invalid audience: expected {expected}")]
    InvalidAudience { expected: String },
}

/// Signing key, claim values and token lifetimes
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtSettings {
    /// Default issuer, audience and lifetimes with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_token_expiry_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
            refresh_token_expiry_days: DEFAULT_REFRESH_TOKEN_DAYS,
        }
    }

    pub fn access_expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(self.access_token_expiry_minutes)
    }

    pub fn refresh_expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.refresh_token_expiry_days)
    }
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Username
    pub name: String,

    pub email: String,
    pub role: UserRole,

    /// Unique token ID
    pub jti: Uuid,

    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl Claims {
    /// Claims valid from `now` for the configured access-token lifetime
    pub fn new(
        user_id: Uuid,
        username: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
        settings: &JwtSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id,
            name: username.into(),
            email: email.into(),
            role,
            jti: Uuid::new_v4(),
            iss: settings.issuer.clone(),
            aud: settings.audience.clone(),
            iat: now.timestamp(),
            exp: settings.access_expires_at(now).timestamp(),
            nbf: now.timestamp(),
        }
    }

    pub fn for_user(user: &User, settings: &JwtSettings, now: DateTime<Utc>) -> Self {
        Self::new(
            user.id,
            user.username.clone(),
            user.email.clone(),
            user.role,
            settings,
            now,
        )
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies a token and returns its claims
pub fn validate_token(token: &str, settings: &JwtSettings) -> Result<Claims, JwtError> {
    use jsonwebtoken::errors::ErrorKind;

    let key = DecodingKey::from_secret(settings.secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[settings.issuer.as_str()]);
    validation.set_audience(&[settings.audience.as_str()]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
                expected: settings.issuer.clone(),
            },
            ErrorKind::InvalidAudience => JwtError::InvalidAudience {
                expected: settings.audience.clone(),
            },
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                JwtError::InvalidFormat(e.to_string())
            }
            _ => JwtError::ValidationError(e.to_string()),
        })
}

/// New opaque refresh token (128 hex characters)
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
