/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register new user
/// - `POST /api/v1/auth/login` - Login with username or email
/// - `POST /api/v1/auth/refresh` - Rotate the refresh token
/// - `POST /api/v1/auth/revoke` - Invalidate a refresh token
/// - `GET /api/v1/auth/me` - Current user (requires JWT)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{field_error, validate_request, ApiResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskmanager_shared::{
    auth::{middleware::AuthContext, password::validate_password_strength},
    services::{
        auth::{AuthResponse, RegisterInput},
        user::UserResponse,
    },
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: String,

    pub password: String,

    pub confirm_password: String,
}

impl RegisterRequest {
    fn validate_all(&self) -> ApiResult<()> {
        let mut extra = Vec::new();

        if !self
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            extra.push(field_error(
                "username",
                "Username may only contain letters, digits and underscores",
            ));
        }
        if let Err(message) = validate_password_strength(&self.password) {
            extra.push(field_error("password", message));
        }
        if self.confirm_password != self.password {
            extra.push(field_error("confirm_password", "Passwords do not match"));
        }

        validate_request(self, extra)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub username_or_email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Register a new user
///
/// ```text
/// POST /api/v1/auth/register
///
/// {
///   "username": "jdoe",
///   "email": "jdoe@example.com",
///   "password": "Secure#Pass1",
///   "confirm_password": "Secure#Pass1"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, username or email taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<()>>)> {
    req.validate_all()?;

    let user = state
        .auth()
        .register(RegisterInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("User registered successfully")),
    ))
}

/// Login with username or email
///
/// # Errors
///
/// - `400 Bad Request`: empty fields
/// - `401 Unauthorized`: bad credentials or disabled account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    validate_request(&req, Vec::new())?;

    let response = state
        .auth()
        .login(req.username_or_email.trim(), &req.password)
        .await?;

    Ok(Json(ApiResponse::data(response)))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    if req.refresh_token.trim().is_empty() {
        return Err(ApiError::Unauthorized(
            "Invalid or expired refresh token".to_string(),
        ));
    }

    let response = state.auth().refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::data(response)))
}

/// Invalidate a refresh token
pub async fn revoke(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if req.refresh_token.trim().is_empty() {
        return Err(ApiError::BadRequest("Invalid refresh token".to_string()));
    }

    state.auth().revoke(&req.refresh_token).await?;
    Ok(Json(ApiResponse::message("Token revoked successfully")))
}

/// Current user profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .users()
        .get_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(username: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: "user@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn failed_fields(result: ApiResult<()>) -> Vec<String> {
        match result {
            Err(ApiError::ValidationError(details)) => {
                details.into_iter().map(|d| d.field).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(register_request("jane_doe", "Secure#Pass1", "Secure#Pass1")
            .validate_all()
            .is_ok());
    }

    #[test]
    fn test_username_rules() {
        let fields = failed_fields(register_request("jd", "Secure#Pass1", "Secure#Pass1").validate_all());
        assert_eq!(fields, vec!["username"]);

        let fields =
            failed_fields(register_request("jane-doe", "Secure#Pass1", "Secure#Pass1").validate_all());
        assert_eq!(fields, vec!["username"]);
    }

    #[test]
    fn test_password_rules() {
        let fields = failed_fields(register_request("jane", "weakpass", "weakpass").validate_all());
        assert_eq!(fields, vec!["password"]);

        let fields =
            failed_fields(register_request("jane", "Secure#Pass1", "Secure#Pass2").validate_all());
        assert_eq!(fields, vec!["confirm_password"]);
    }

    #[test]
    fn test_bad_email() {
        let mut request = register_request("jane", "Secure#Pass1", "Secure#Pass1");
        request.email = "not-an-email".into();
        assert_eq!(failed_fields(request.validate_all()), vec!["email"]);
    }
}
