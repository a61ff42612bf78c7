/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: health check (public)
/// - `auth`: register, login, refresh, revoke (public) and `me`
/// - `users`, `projects`, `tasks`, `labels`: CRUD resources
/// - `attachments`: multipart upload, download and metadata
///
/// Request bodies are checked with `validator` derives plus
/// [`validate_request`] for rules the derives cannot express.

pub mod attachments;
pub mod auth;
pub mod health;
pub mod labels;
pub mod projects;
pub mod tasks;
pub mod users;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use serde::Serialize;
use validator::Validate;

/// Success envelope used by the auth endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Runs the derived rules and merges in `extra` failures
pub fn validate_request<T: Validate>(
    request: &T,
    extra: Vec<ValidationErrorDetail>,
) -> ApiResult<()> {
    let mut details = match request.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => match ApiError::from(errors) {
            ApiError::ValidationError(details) => details,
            other => return Err(other),
        },
    };
    details.extend(extra);

    if details.is_empty() {
        Ok(())
    } else {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        Err(ApiError::ValidationError(details))
    }
}

pub fn field_error(field: &str, message: impl Into<String>) -> ValidationErrorDetail {
    ValidationErrorDetail {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Error for a value that is non-empty but only whitespace
///
/// Empty strings are left to the length rules so they are not reported twice.
pub fn check_not_blank(
    field: &str,
    value: &str,
    message: &str,
) -> Option<ValidationErrorDetail> {
    (!value.is_empty() && value.trim().is_empty()).then(|| field_error(field, message))
}

/// `#RRGGBB`
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Error for an optional color that is present but malformed
pub fn check_color(color: Option<&str>) -> Option<ValidationErrorDetail> {
    match color {
        Some(c) if !is_hex_color(c) => Some(field_error(
            "color",
            "Color must be a hex value like #1a2b3c",
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, max = 5, message = "Name must be 1-5 characters"))]
        name: String,
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#00ffAA"));
        assert!(!is_hex_color("00ffAA"));
        assert!(!is_hex_color("#00ffA"));
        assert!(!is_hex_color("#00ffAG"));
        assert!(check_color(None).is_none());
        assert!(check_color(Some("red")).is_some());
    }

    #[test]
    fn test_validate_request_merges_errors() {
        let request = Named {
            name: String::new(),
        };
        let err = validate_request(&request, vec![field_error("color", "bad")]).unwrap_err();

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "color");
                assert_eq!(details[1].field, "name");
                assert_eq!(details[1].message, "Name must be 1-5 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_values() {
        assert!(check_not_blank("name", "   ", "Name is required").is_some());
        assert!(check_not_blank("name", "\t\n", "Name is required").is_some());
        assert!(check_not_blank("name", "", "Name is required").is_none());
        assert!(check_not_blank("name", " a ", "Name is required").is_none());
    }

    #[test]
    fn test_validate_request_ok() {
        let request = Named {
            name: "ok".into(),
        };
        assert!(validate_request(&request, Vec::new()).is_ok());
    }

    #[test]
    fn test_api_response_shapes() {
        let json = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));

        let json = serde_json::to_value(ApiResponse::data(5)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 5}));
    }
}
