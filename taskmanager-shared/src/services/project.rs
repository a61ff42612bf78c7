/// Project CRUD
///
/// Anyone authenticated may read projects. Updates and deletes are limited
/// to the owner and administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::require_owner_or_admin;
use crate::auth::middleware::AuthContext;
use crate::models::paging::{PageParams, PagedResult};
use crate::models::project::{CreateProject, Project, ProjectSummary, UpdateProject};
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub owner_id: Uuid,
    pub owner_name: Option<String>,
    pub task_count: i64,
    pub completed_task_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectSummary> for ProjectResponse {
    fn from(p: ProjectSummary) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            color: p.color,
            owner_id: p.owner_id,
            owner_name: p.owner_name,
            task_count: p.task_count,
            completed_task_count: p.completed_task_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Option<ProjectResponse>> {
        Ok(Project::find_summary_by_id(&self.pool, id)
            .await?
            .map(Into::into))
    }

    pub async fn get_all(&self, page: PageParams) -> ServiceResult<PagedResult<ProjectResponse>> {
        let items = Project::list_summaries(&self.pool, page.limit(), page.offset()).await?;
        let total = Project::count(&self.pool).await?;

        Ok(PagedResult::new(items, total, page).map(Into::into))
    }

    pub async fn get_by_owner(
        &self,
        owner_id: Uuid,
        page: PageParams,
    ) -> ServiceResult<PagedResult<ProjectResponse>> {
        let items =
            Project::list_summaries_by_owner(&self.pool, owner_id, page.limit(), page.offset())
                .await?;
        let total = Project::count_by_owner(&self.pool, owner_id).await?;

        Ok(PagedResult::new(items, total, page).map(Into::into))
    }

    /// Creates a project owned by `owner_id`
    ///
    /// # Errors
    ///
    /// `BadRequest` if the owner does not exist or is disabled.
    pub async fn create(&self, input: ProjectInput, owner_id: Uuid) -> ServiceResult<ProjectResponse> {
        if !User::exists(&self.pool, owner_id).await? {
            return Err(ServiceError::BadRequest(format!(
                "User {} does not exist",
                owner_id
            )));
        }

        let project = Project::create(
            &self.pool,
            CreateProject {
                name: input.name,
                description: input.description,
                color: input.color,
                owner_id,
            },
        )
        .await?;

        info!(project_id = %project.id, owner_id = %owner_id, "Project created");
        self.summary(project.id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: ProjectInput,
        actor: &AuthContext,
    ) -> ServiceResult<ProjectResponse> {
        let project = self.load(id).await?;
        require_owner_or_admin(actor, project.owner_id, "project")?;

        Project::update(
            &self.pool,
            id,
            UpdateProject {
                name: input.name,
                description: input.description,
                color: input.color,
            },
        )
        .await?
        .ok_or_else(|| project_not_found(id))?;

        self.summary(id).await
    }

    /// Soft-deletes the project; its tasks keep their `project_id`
    pub async fn delete(&self, id: Uuid, actor: &AuthContext) -> ServiceResult<()> {
        let project = self.load(id).await?;
        require_owner_or_admin(actor, project.owner_id, "project")?;

        if !Project::soft_delete(&self.pool, id).await? {
            return Err(project_not_found(id));
        }

        info!(project_id = %id, user_id = %actor.user_id, "Project deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Project> {
        Project::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| project_not_found(id))
    }

    async fn summary(&self, id: Uuid) -> ServiceResult<ProjectResponse> {
        Project::find_summary_by_id(&self.pool, id)
            .await?
            .map(Into::into)
            .ok_or_else(|| project_not_found(id))
    }
}

fn project_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Project {} not found", id))
}
