/// Label model and database operations
///
/// Labels are global (not per project) and attach to tasks through
/// `task_labels`. Five default labels are seeded by the labels migration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE labels (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL,
///     color VARCHAR(7) NOT NULL DEFAULT '#6c757d',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_labels (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     label_id UUID NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, label_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub const DEFAULT_LABEL_COLOR: &str = "#6c757d";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A label attached to a specific task
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskLabel {
    pub task_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

const LABEL_COLUMNS: &str = "id, name, color, is_active, created_at, updated_at";

impl Label {
    pub async fn create(
        pool: &PgPool,
        name: &str,
        color: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO labels (name, color) VALUES ($1, $2) RETURNING {LABEL_COLUMNS}"
        );

        sqlx::query_as::<_, Label>(&query)
            .bind(name)
            .bind(color.unwrap_or(DEFAULT_LABEL_COLOR))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {LABEL_COLUMNS} FROM labels WHERE id = $1 AND is_active = TRUE");

        sqlx::query_as::<_, Label>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active labels ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query =
            format!("SELECT {LABEL_COLUMNS} FROM labels WHERE is_active = TRUE ORDER BY name");

        sqlx::query_as::<_, Label>(&query).fetch_all(pool).await
    }

    /// Renames/recolors an active label. A `None` color keeps the current one.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE labels
             SET name = $2, color = COALESCE($3, color), updated_at = NOW()
             WHERE id = $1 AND is_active = TRUE
             RETURNING {LABEL_COLUMNS}"
        );

        sqlx::query_as::<_, Label>(&query)
            .bind(id)
            .bind(name)
            .bind(color)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE labels SET is_active = FALSE, updated_at = NOW()
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM labels WHERE id = $1 AND is_active = TRUE)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Returns the subset of `ids` that refer to active labels
    pub async fn existing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar("SELECT id FROM labels WHERE id = ANY($1) AND is_active = TRUE")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Links labels to a task inside the caller's transaction
    ///
    /// Existing links are left untouched.
    pub async fn attach_to_task(
        tx: &mut Transaction<'_, Postgres>,
        task_id: Uuid,
        label_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        if label_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO task_labels (task_id, label_id)
            SELECT $1, label_id FROM UNNEST($2::uuid[]) AS label_id
            ON CONFLICT (task_id, label_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(label_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Active labels for a batch of tasks, ordered by label name
    pub async fn list_for_tasks(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<Vec<TaskLabel>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, TaskLabel>(
            r#"
            SELECT tl.task_id, l.id, l.name, l.color
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1) AND l.is_active = TRUE
            ORDER BY l.name
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label_color() {
        assert_eq!(DEFAULT_LABEL_COLOR, "#6c757d");
    }
}
