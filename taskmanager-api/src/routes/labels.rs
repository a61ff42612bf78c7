/// Label endpoints
///
/// Label reads are served from the shared TTL cache; every write
/// invalidates it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_color, check_not_blank, validate_request},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskmanager_shared::services::label::{LabelDto, LabelInput};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LabelRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    pub color: Option<String>,
}

impl LabelRequest {
    fn into_input(self) -> ApiResult<LabelInput> {
        let extra = check_color(self.color.as_deref())
            .into_iter()
            .chain(check_not_blank("name", &self.name, "Name is required"))
            .collect();
        validate_request(&self, extra)?;

        Ok(LabelInput {
            name: self.name.trim().to_string(),
            color: self.color,
        })
    }
}

pub async fn list_labels(State(state): State<AppState>) -> ApiResult<Json<Vec<LabelDto>>> {
    Ok(Json(state.labels().get_all().await?))
}

pub async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LabelDto>> {
    state
        .labels()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Label {} not found", id)))
}

pub async fn create_label(
    State(state): State<AppState>,
    Json(req): Json<LabelRequest>,
) -> ApiResult<(StatusCode, Json<LabelDto>)> {
    let label = state.labels().create(req.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn update_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LabelRequest>,
) -> ApiResult<Json<LabelDto>> {
    Ok(Json(state.labels().update(id, req.into_input()?).await?))
}

pub async fn delete_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.labels().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_request_rules() {
        let long = LabelRequest {
            name: "x".repeat(51),
            color: None,
        };
        assert!(matches!(long.into_input(), Err(ApiError::ValidationError(_))));

        let blank = LabelRequest {
            name: "   ".into(),
            color: None,
        };
        assert!(matches!(
            blank.into_input(),
            Err(ApiError::ValidationError(details)) if details[0].field == "name"
        ));

        let ok = LabelRequest {
            name: "Backend".into(),
            color: Some("#ABCDEF".into()),
        };
        let input = ok.into_input().unwrap();
        assert_eq!(input.color.as_deref(), Some("#ABCDEF"));
    }
}
