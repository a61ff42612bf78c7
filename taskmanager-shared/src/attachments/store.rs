/// Attachment metadata persistence
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL,               -- no FK: tasks belong to another module
///     file_name VARCHAR(255) NOT NULL,
///     file_size BIGINT NOT NULL,           -- 1..=10485760
///     content_type VARCHAR(200) NOT NULL,
///     uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     uploaded_by_user_id UUID NOT NULL,
///     storage_path VARCHAR(500) NOT NULL UNIQUE
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by_user_id: Uuid,
    pub storage_path: String,
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn add(&self, attachment: &Attachment) -> Result<(), sqlx::Error>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Attachment>, sqlx::Error>;

    /// Newest first
    async fn get_by_task_id(&self, task_id: Uuid) -> Result<Vec<Attachment>, sqlx::Error>;

    /// Returns `false` when no row was removed
    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    async fn count_by_task_id(&self, task_id: Uuid) -> Result<i64, sqlx::Error>;
}

const ATTACHMENT_COLUMNS: &str =
    "id, task_id, file_name, file_size, content_type, uploaded_at, uploaded_by_user_id, storage_path";

#[derive(Debug, Clone)]
pub struct PgAttachmentStore {
    pool: PgPool,
}

impl PgAttachmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentStore for PgAttachmentStore {
    async fn add(&self, attachment: &Attachment) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO attachments
                (id, task_id, file_name, file_size, content_type, uploaded_at,
                 uploaded_by_user_id, storage_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(attachment.id)
        .bind(attachment.task_id)
        .bind(&attachment.file_name)
        .bind(attachment.file_size)
        .bind(&attachment.content_type)
        .bind(attachment.uploaded_at)
        .bind(attachment.uploaded_by_user_id)
        .bind(&attachment.storage_path)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Attachment>, sqlx::Error> {
        let query = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1");

        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_by_task_id(&self, task_id: Uuid) -> Result<Vec<Attachment>, sqlx::Error> {
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments
             WHERE task_id = $1
             ORDER BY uploaded_at DESC, id"
        );

        sqlx::query_as::<_, Attachment>(&query)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_task_id(&self, task_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM attachments WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await
    }
}
