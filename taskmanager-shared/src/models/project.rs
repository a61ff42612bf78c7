/// Project model and database operations
///
/// Projects group tasks and belong to a single owner. The owner is also
/// recorded in `project_members` when the project is created. Deletion is a
/// soft delete; tasks keep their `project_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     color VARCHAR(7) NOT NULL DEFAULT '#007bff',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role VARCHAR(20) NOT NULL DEFAULT 'Member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Color applied when a project is created without one
pub const DEFAULT_PROJECT_COLOR: &str = "#007bff";

/// Member role recorded for the project owner
pub const OWNER_MEMBER_ROLE: &str = "Owner";

/// Role given to members added after creation
pub const DEFAULT_MEMBER_ROLE: &str = "Member";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub owner_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project joined with its owner's username and task counters
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectSummary {
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

/// Row of `project_members`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

const PROJECT_COLUMNS: &str =
    "id, name, description, color, owner_id, is_active, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.color, p.owner_id,
           u.username AS owner_name,
           COUNT(t.id) AS task_count,
           COUNT(t.id) FILTER (WHERE t.status = 'completed') AS completed_task_count,
           p.created_at, p.updated_at
    FROM projects p
    LEFT JOIN users u ON u.id = p.owner_id
    LEFT JOIN tasks t ON t.project_id = p.id AND t.is_active = TRUE
"#;

const SUMMARY_GROUP_BY: &str = "GROUP BY p.id, u.username";

impl Project {
    /// Inserts a project and registers the owner as a member
    ///
    /// Both rows are written in one transaction.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO projects (name, description, color, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {PROJECT_COLUMNS}"
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.color.unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()))
            .bind(data.owner_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project.id)
        .bind(project.owner_id)
        .bind(OWNER_MEMBER_ROLE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds an active project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND is_active = TRUE");

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active project with owner name and task counters
    pub async fn find_summary_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<ProjectSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE p.id = $1 AND p.is_active = TRUE {SUMMARY_GROUP_BY}"
        );

        sqlx::query_as::<_, ProjectSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active projects, newest first
    pub async fn list_summaries(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE p.is_active = TRUE {SUMMARY_GROUP_BY}
             ORDER BY p.created_at DESC
             LIMIT $1 OFFSET $2"
        );

        sqlx::query_as::<_, ProjectSummary>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Active projects owned by `owner_id`, newest first
    pub async fn list_summaries_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE p.owner_id = $1 AND p.is_active = TRUE {SUMMARY_GROUP_BY}
             ORDER BY p.created_at DESC
             LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, ProjectSummary>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM projects WHERE is_active = TRUE")
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    pub async fn count_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM projects WHERE owner_id = $1 AND is_active = TRUE",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Replaces name, description and color
    ///
    /// A `None` color keeps the current one.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE projects
             SET name = $2, description = $3, color = COALESCE($4, color), updated_at = NOW()
             WHERE id = $1 AND is_active = TRUE
             RETURNING {PROJECT_COLUMNS}"
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.color)
            .fetch_optional(pool)
            .await
    }

    /// Marks the project inactive
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET is_active = FALSE, updated_at = NOW()
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether an active project with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Whether `user_id` is recorded as a member of the project
    pub async fn is_member(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Records `user_id` as a member with `role`
    ///
    /// Returns `false` when the user already belongs to the project; the
    /// existing role is left alone.
    pub async fn add_member(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Members of the project, earliest joined first
    pub async fn list_members(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY joined_at ASC, user_id ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_color_is_hex() {
        assert_eq!(DEFAULT_PROJECT_COLOR.len(), 7);
        assert!(DEFAULT_PROJECT_COLOR.starts_with('#'));
    }

    #[test]
    fn test_summary_query_counts_only_active_tasks() {
        assert!(SUMMARY_SELECT.contains("t.is_active = TRUE"));
        assert!(SUMMARY_SELECT.contains("FILTER (WHERE t.status = 'completed')"));
    }
}
