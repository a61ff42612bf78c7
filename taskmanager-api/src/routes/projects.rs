/// Project endpoints
///
/// - `GET /api/v1/projects` - Paged list of active projects
/// - `GET /api/v1/projects/my-projects` - Projects owned by the caller
/// - `GET /api/v1/projects/:id` - Project summary
/// - `POST /api/v1/projects` - Create (caller becomes owner)
/// - `PUT /api/v1/projects/:id` - Update (owner or admin)
/// - `DELETE /api/v1/projects/:id` - Soft delete (owner or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_color, check_not_blank, validate_request},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskmanager_shared::{
    auth::middleware::AuthContext,
    models::paging::{PageParams, PagedResult},
    services::project::{ProjectInput, ProjectResponse},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub color: Option<String>,
}

impl ProjectRequest {
    fn into_input(self) -> ApiResult<ProjectInput> {
        let extra = check_color(self.color.as_deref())
            .into_iter()
            .chain(check_not_blank("name", &self.name, "Name is required"))
            .collect();
        validate_request(&self, extra)?;

        Ok(ProjectInput {
            name: self.name.trim().to_string(),
            description: self.description,
            color: self.color,
        })
    }
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<PagedResult<ProjectResponse>>> {
    Ok(Json(state.projects().get_all(page).await?))
}

pub async fn my_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<PagedResult<ProjectResponse>>> {
    Ok(Json(state.projects().get_by_owner(auth.user_id, page).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    state
        .projects()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Project {} not found", id)))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let input = req.into_input()?;
    let project = state.projects().create(input, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let input = req.into_input()?;
    Ok(Json(state.projects().update(id, input, &auth).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.projects().delete(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}
