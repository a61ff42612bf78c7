/// Application services
///
/// Each service loads an entity, checks its preconditions, mutates and
/// persists it, then maps it to a response type. Services hold a `PgPool`
/// clone plus whatever collaborators they need; they are cheap to build per
/// request.
///
/// - `auth`: registration, login, refresh-token rotation and revocation
/// - `user`: user lookups
/// - `project`: project CRUD with owner checks
/// - `task`: task CRUD, status changes, assignment and filtering
/// - `label`: label CRUD behind a TTL cache

pub mod auth;
pub mod label;
pub mod project;
pub mod task;
pub mod user;

use crate::auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError};

/// Errors produced by the service layer
///
/// The API maps each variant to one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    /// A business rule rejected the request
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// The row changed since the caller read it
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_message_through() {
        let err = ServiceError::NotFound("Task not found".into());
        assert_eq!(err.to_string(), "Task not found");
    }

    #[test]
    fn test_authz_maps_to_forbidden() {
        let err: ServiceError = AuthzError::NotOwner("project").into();
        assert!(matches!(err, ServiceError::Forbidden(msg) if msg.contains("project")));
    }

    #[test]
    fn test_sqlx_error_converts() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
