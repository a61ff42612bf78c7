/// User lookup endpoints
///
/// - `GET /api/v1/users` - Paged user list
/// - `GET /api/v1/users/:id` - User by id
/// - `GET /api/v1/users/by-username/:username` - User by username

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use taskmanager_shared::{
    models::paging::{PageParams, PagedResult},
    services::user::UserResponse,
};
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<PagedResult<UserResponse>>> {
    Ok(Json(state.users().get_all(page).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    state
        .users()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    state
        .users()
        .get_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", username)))
}
