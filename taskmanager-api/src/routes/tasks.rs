/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/tasks` - Filtered, sorted, paged task list
/// - `GET /api/v1/tasks/my-tasks` - Tasks assigned to the caller
/// - `GET /api/v1/tasks/project/:project_id` - Tasks of one project
/// - `GET /api/v1/tasks/:id` - Task details
/// - `POST /api/v1/tasks` - Create
/// - `PUT /api/v1/tasks/:id` - Edit (409 on a stale `row_version`)
/// - `PATCH /api/v1/tasks/:id/status` - Status transition
/// - `POST /api/v1/tasks/:id/assign/:user_id` - Assign
/// - `DELETE /api/v1/tasks/:id` - Soft delete
///
/// # List query
///
/// ```text
/// GET /api/v1/tasks?status=in_progress&priority=high&search_term=report
///     &sort_by=dueDate&sort_descending=true&include_overdue=false
///     &page=1&page_size=20
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{check_not_blank, validate_request},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskmanager_shared::{
    auth::middleware::AuthContext,
    models::{
        paging::{PageParams, PagedResult},
        task::{TaskFilter, TaskPriority, TaskStatus},
    },
    services::task::{CreateTaskInput, TaskResponse, UpdateTaskInput},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    pub search_term: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_descending: bool,
    #[serde(default)]
    pub include_overdue: bool,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(q: TaskListQuery) -> Self {
        let defaults = PageParams::default();

        TaskFilter {
            status: q.status,
            priority: q.priority,
            project_id: q.project_id,
            assigned_user_id: q.assigned_user_id,
            search_term: q
                .search_term
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort_by: q.sort_by,
            sort_descending: q.sort_descending,
            include_overdue: q.include_overdue,
            paging: PageParams::new(
                q.page.unwrap_or(defaults.page),
                q.page_size.unwrap_or(defaults.page_size),
            ),
        }
    }
}

const TITLE_REQUIRED: &str = "Title is required";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: TaskPriority,

    pub due_date: Option<DateTime<Utc>>,

    pub project_id: Option<Uuid>,

    pub assigned_user_id: Option<Uuid>,

    #[serde(default)]
    pub label_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: TaskPriority,

    pub due_date: Option<DateTime<Utc>>,

    pub project_id: Option<Uuid>,

    pub row_version: Option<i32>,
}

impl CreateTaskRequest {
    fn into_input(self) -> ApiResult<CreateTaskInput> {
        let extra = check_not_blank("title", &self.title, TITLE_REQUIRED)
            .into_iter()
            .collect();
        validate_request(&self, extra)?;

        Ok(CreateTaskInput {
            title: self.title.trim().to_string(),
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            project_id: self.project_id,
            assigned_user_id: self.assigned_user_id,
            label_ids: self.label_ids,
        })
    }
}

impl UpdateTaskRequest {
    fn into_input(self) -> ApiResult<UpdateTaskInput> {
        let extra = check_not_blank("title", &self.title, TITLE_REQUIRED)
            .into_iter()
            .collect();
        validate_request(&self, extra)?;

        Ok(UpdateTaskInput {
            title: self.title.trim().to_string(),
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            project_id: self.project_id,
            row_version: self.row_version,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<PagedResult<TaskResponse>>> {
    Ok(Json(state.tasks().get_all(query.into()).await?))
}

pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<PagedResult<TaskResponse>>> {
    Ok(Json(
        state.tasks().get_by_assigned_user(auth.user_id, page).await?,
    ))
}

pub async fn project_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<PagedResult<TaskResponse>>> {
    Ok(Json(state.tasks().get_by_project(project_id, page).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    state
        .tasks()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", id)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state.tasks().create(req.into_input()?, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    Ok(Json(state.tasks().update(id, req.into_input()?).await?))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    Ok(Json(state.tasks().update_status(id, req.status).await?))
}

pub async fn assign_task(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskResponse>> {
    Ok(Json(state.tasks().assign_user(id, user_id).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.tasks().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let filter: TaskFilter = TaskListQuery::default().into();

        assert_eq!(filter.paging.page(), 1);
        assert_eq!(filter.paging.page_size(), 20);
        assert!(!filter.sort_descending);
        assert!(!filter.include_overdue);
        assert!(filter.search_term.is_none());
    }

    #[test]
    fn test_list_query_blank_search_is_dropped() {
        let query = TaskListQuery {
            search_term: Some("   ".into()),
            page: Some(3),
            page_size: Some(500),
            ..Default::default()
        };
        let filter: TaskFilter = query.into();

        assert!(filter.search_term.is_none());
        assert_eq!(filter.paging.page(), 3);
        assert_eq!(filter.paging.page_size(), 100);
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Write report"}"#).unwrap();

        assert_eq!(req.priority, TaskPriority::Medium);
        assert!(req.label_ids.is_empty());
        assert!(req.into_input().is_ok());
    }

    #[test]
    fn test_create_request_title_rules() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(matches!(req.into_input(), Err(ApiError::ValidationError(_))));

        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        match req.into_input() {
            Err(ApiError::ValidationError(details)) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "title");
                assert_eq!(details[0].message, TITLE_REQUIRED);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "  Ship it  "}"#).unwrap();
        assert_eq!(req.into_input().unwrap().title, "Ship it");
    }

    #[test]
    fn test_update_request_rejects_blank_title() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"title": "\t ", "row_version": 2}"#).unwrap();
        assert!(matches!(
            req.into_input(),
            Err(ApiError::ValidationError(details)) if details[0].field == "title"
        ));
    }

    #[test]
    fn test_status_request_uses_snake_case() {
        let req: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        assert_eq!(req.status, TaskStatus::InProgress);
        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status": "done"}"#).is_err());
    }
}
