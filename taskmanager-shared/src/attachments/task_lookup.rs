/// Read-only view of tasks for the attachments module
///
/// Only the columns attachments need are exposed. Nothing here writes to
/// the task tables.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskInfo {
    pub id: Uuid,
    pub is_active: bool,
    pub created_by_user_id: Uuid,
}

#[async_trait]
pub trait TaskLookup: Send + Sync {
    /// Finds a task whether or not it is active
    async fn get_task_by_id(&self, task_id: Uuid) -> Result<Option<TaskInfo>, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgTaskLookup {
    pool: PgPool,
}

impl PgTaskLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskLookup for PgTaskLookup {
    async fn get_task_by_id(&self, task_id: Uuid) -> Result<Option<TaskInfo>, sqlx::Error> {
        sqlx::query_as::<_, TaskInfo>(
            "SELECT id, is_active, created_by_user_id FROM tasks WHERE id = $1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }
}
