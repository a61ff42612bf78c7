/// Task model and database operations
///
/// Tasks are the core entity: they carry a status and priority, may be
/// assigned to a user and filed under a project, and are soft-deleted.
///
/// # Status rules
///
/// ```text
/// pending | in_progress | blocked | cancelled  → any status
/// completed                                   → completed only
/// ```
///
/// # Optimistic concurrency
///
/// Every UPDATE bumps `row_version` and is guarded by
/// `WHERE row_version = $expected`. A guarded update that matches no row
/// returns `None`, which callers report as a conflict.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled', 'blocked');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'critical');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(2000),
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     assigned_user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by_user_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     row_version INTEGER NOT NULL DEFAULT 1
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::models::paging::PageParams;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// A completed task is frozen; every other move is allowed
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match self {
            TaskStatus::Completed => target == TaskStatus::Completed,
            _ => true,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority, ordered low to critical
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

/// Task row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,

    /// Set when the status first becomes `completed`
    pub completed_at: Option<DateTime<Utc>>,

    pub assigned_user_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Concurrency token, incremented by every update
    pub row_version: i32,
}

/// Task row joined with display names for the assignee, creator and project
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRecord {
    #[sqlx(flatten)]
    pub task: Task,
    pub assigned_user_name: Option<String>,
    pub created_by_user_name: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
}

/// Editable task fields; all of them are replaced on update
#[derive(Debug, Clone)]
pub struct UpdateTaskDetails {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
}

/// Sort keys accepted by [`TaskFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    DueDate,
    Priority,
    Status,
    CreatedAt,
}

impl TaskSortKey {
    /// Parses a case-insensitive sort key; unknown keys yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "duedate" => Some(TaskSortKey::DueDate),
            "priority" => Some(TaskSortKey::Priority),
            "status" => Some(TaskSortKey::Status),
            "createdat" => Some(TaskSortKey::CreatedAt),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            TaskSortKey::DueDate => "t.due_date",
            TaskSortKey::Priority => "t.priority",
            TaskSortKey::Status => "t.status",
            TaskSortKey::CreatedAt => "t.created_at",
        }
    }
}

/// Filters for the task listing endpoint
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    pub search_term: Option<String>,
    pub sort_by: Option<String>,
    pub sort_descending: bool,
    /// Only tasks past their due date that are not completed
    pub include_overdue: bool,
    pub paging: PageParams,
}

impl TaskFilter {
    /// ORDER BY clause; created_at DESC when no known key is given
    fn order_by(&self) -> String {
        match self.sort_by.as_deref().and_then(TaskSortKey::parse) {
            Some(key) => {
                let direction = if self.sort_descending { "DESC" } else { "ASC" };
                format!(" ORDER BY {} {}, t.id", key.column(), direction)
            }
            None => " ORDER BY t.created_at DESC, t.id".to_string(),
        }
    }

    fn push_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>, now: DateTime<Utc>) {
        qb.push(" WHERE t.is_active = TRUE");

        if let Some(status) = self.status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = self.priority {
            qb.push(" AND t.priority = ").push_bind(priority);
        }
        if let Some(project_id) = self.project_id {
            qb.push(" AND t.project_id = ").push_bind(project_id);
        }
        if let Some(assigned_user_id) = self.assigned_user_id {
            qb.push(" AND t.assigned_user_id = ").push_bind(assigned_user_id);
        }
        if self.include_overdue {
            qb.push(" AND t.due_date IS NOT NULL AND t.due_date < ")
                .push_bind(now)
                .push(" AND t.status <> 'completed'");
        }
        if let Some(term) = self.search_term.as_deref().map(str::trim) {
            if !term.is_empty() {
                let pattern = format!("%{}%", escape_like(term));
                qb.push(" AND (t.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR t.description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }
    }
}

/// Escapes LIKE wildcards so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, completed_at, \
     assigned_user_id, created_by_user_id, project_id, is_active, created_at, updated_at, \
     row_version";

const RECORD_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date, t.completed_at,
           t.assigned_user_id, t.created_by_user_id, t.project_id, t.is_active,
           t.created_at, t.updated_at, t.row_version,
           au.username AS assigned_user_name,
           cu.username AS created_by_user_name,
           p.name AS project_name
    FROM tasks t
    LEFT JOIN users au ON au.id = t.assigned_user_id
    LEFT JOIN users cu ON cu.id = t.created_by_user_id
    LEFT JOIN projects p ON p.id = t.project_id
"#;

const WORKLIST_ORDER: &str = " ORDER BY t.priority DESC, t.due_date ASC NULLS LAST, t.id";

impl Task {
    /// Inserts a pending task inside the caller's transaction
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (title, description, status, priority, due_date, project_id,
                                assigned_user_id, created_by_user_id)
             VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7)
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.project_id)
            .bind(data.assigned_user_id)
            .bind(data.created_by_user_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Finds an active task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND is_active = TRUE");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active task with joined display names
    pub async fn find_record_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskRecord>, sqlx::Error> {
        let query = format!("{RECORD_SELECT} WHERE t.id = $1 AND t.is_active = TRUE");

        sqlx::query_as::<_, TaskRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Filtered, sorted page of active tasks
    pub async fn list_records(
        pool: &PgPool,
        filter: &TaskFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(RECORD_SELECT);
        filter.push_conditions(&mut qb, now);
        qb.push(filter.order_by());
        qb.push(" LIMIT ").push_bind(filter.paging.limit());
        qb.push(" OFFSET ").push_bind(filter.paging.offset());

        qb.build_query_as::<TaskRecord>().fetch_all(pool).await
    }

    /// Number of active tasks matching `filter`, ignoring paging
    pub async fn count(
        pool: &PgPool,
        filter: &TaskFilter,
        now: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        filter.push_conditions(&mut qb, now);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Active tasks assigned to `user_id`, most urgent first
    pub async fn list_records_by_assignee(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let query = format!(
            "{RECORD_SELECT} WHERE t.assigned_user_id = $1 AND t.is_active = TRUE
             {WORKLIST_ORDER} LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, TaskRecord>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_assignee(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE assigned_user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Active tasks in `project_id`, most urgent first
    pub async fn list_records_by_project(
        pool: &PgPool,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let query = format!(
            "{RECORD_SELECT} WHERE t.project_id = $1 AND t.is_active = TRUE
             {WORKLIST_ORDER} LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, TaskRecord>(&query)
            .bind(project_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE project_id = $1 AND is_active = TRUE",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Replaces the editable fields if `row_version` still matches
    pub async fn update_details(
        pool: &PgPool,
        id: Uuid,
        expected_row_version: i32,
        data: UpdateTaskDetails,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks
             SET title = $3, description = $4, priority = $5, due_date = $6, project_id = $7,
                 updated_at = NOW(), row_version = row_version + 1
             WHERE id = $1 AND row_version = $2 AND is_active = TRUE
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(expected_row_version)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.project_id)
            .fetch_optional(pool)
            .await
    }

    /// Sets the status if `row_version` still matches
    ///
    /// `completed_at` is only overwritten when a value is given.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        expected_row_version: i32,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks
             SET status = $3, completed_at = COALESCE($4, completed_at),
                 updated_at = NOW(), row_version = row_version + 1
             WHERE id = $1 AND row_version = $2 AND is_active = TRUE
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(expected_row_version)
            .bind(status)
            .bind(completed_at)
            .fetch_optional(pool)
            .await
    }

    /// Assigns the task if `row_version` still matches
    pub async fn assign(
        pool: &PgPool,
        id: Uuid,
        expected_row_version: i32,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks
             SET assigned_user_id = $3, updated_at = NOW(), row_version = row_version + 1
             WHERE id = $1 AND row_version = $2 AND is_active = TRUE
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(expected_row_version)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Marks the task inactive
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks
             SET is_active = FALSE, updated_at = NOW(), row_version = row_version + 1
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1 AND is_active = TRUE)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(TaskStatus::Blocked.as_str(), "blocked");
    }

    #[test]
    fn test_task_status_serde_matches_db_names() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
            TaskStatus::Blocked,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_completed_is_frozen() {
        assert!(TaskStatus::Completed.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Cancelled));
    }

    #[test]
    fn test_open_statuses_move_freely() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Blocked.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::Cancelled.can_transition_to(TaskStatus::Pending));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Blocked));
    }

    #[test]
    fn test_priority_order_and_default() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::Low < TaskPriority::Medium);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(TaskSortKey::parse("DueDate"), Some(TaskSortKey::DueDate));
        assert_eq!(TaskSortKey::parse("PRIORITY"), Some(TaskSortKey::Priority));
        assert_eq!(TaskSortKey::parse("status"), Some(TaskSortKey::Status));
        assert_eq!(TaskSortKey::parse("createdAt"), Some(TaskSortKey::CreatedAt));
        assert_eq!(TaskSortKey::parse("title"), None);
    }

    #[test]
    fn test_order_by_defaults_to_newest_first() {
        let filter = TaskFilter::default();
        assert_eq!(filter.order_by(), " ORDER BY t.created_at DESC, t.id");

        let filter = TaskFilter {
            sort_by: Some("bogus".into()),
            sort_descending: false,
            ..Default::default()
        };
        assert_eq!(filter.order_by(), " ORDER BY t.created_at DESC, t.id");
    }

    #[test]
    fn test_order_by_direction() {
        let filter = TaskFilter {
            sort_by: Some("priority".into()),
            sort_descending: true,
            ..Default::default()
        };
        assert_eq!(filter.order_by(), " ORDER BY t.priority DESC, t.id");

        let filter = TaskFilter {
            sort_by: Some("duedate".into()),
            ..Default::default()
        };
        assert_eq!(filter.order_by(), " ORDER BY t.due_date ASC, t.id");
    }

    #[test]
    fn test_filter_sql_includes_requested_conditions() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Blocked),
            include_overdue: true,
            search_term: Some("report".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        filter.push_conditions(&mut qb, Utc::now());
        let sql = qb.sql();

        assert!(sql.contains("t.is_active = TRUE"));
        assert!(sql.contains("t.status = $1"));
        assert!(sql.contains("t.due_date < $2"));
        assert!(sql.contains("t.status <> 'completed'"));
        assert!(sql.contains("t.title ILIKE $3"));
        assert!(sql.contains("t.description ILIKE $4"));
        assert!(!sql.contains("t.priority ="));
    }

    #[test]
    fn test_blank_search_term_is_ignored() {
        let filter = TaskFilter {
            search_term: Some("   ".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM tasks t");
        filter.push_conditions(&mut qb, Utc::now());
        assert!(!qb.sql().contains("ILIKE"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
