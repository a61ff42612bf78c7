/// Task workflows
///
/// Create, edit, status changes, assignment, soft delete and the filtered
/// listings. Every response carries the task's labels and its current
/// `row_version`; writes are guarded by that version so a stale edit comes
/// back as [`ServiceError::Conflict`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::label::LabelDto;
use super::{ServiceError, ServiceResult};
use crate::clock::SharedClock;
use crate::models::label::{Label, TaskLabel};
use crate::models::paging::{PageParams, PagedResult};
use crate::models::project::Project;
use crate::models::task::{
    CreateTask, Task, TaskFilter, TaskPriority, TaskRecord, TaskStatus, UpdateTaskDetails,
};
use crate::models::user::User;
use crate::notifier::SharedNotifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_user_id: Option<Uuid>,
    pub assigned_user_name: Option<String>,
    pub created_by_user_id: Uuid,
    pub created_by_user_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub labels: Vec<LabelDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub row_version: i32,
}

impl TaskResponse {
    fn from_record(record: TaskRecord, labels: Vec<LabelDto>) -> Self {
        let TaskRecord {
            task,
            assigned_user_name,
            created_by_user_name,
            project_name,
        } = record;

        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            completed_at: task.completed_at,
            assigned_user_id: task.assigned_user_id,
            assigned_user_name,
            created_by_user_id: task.created_by_user_id,
            created_by_user_name,
            project_id: task.project_id,
            project_name,
            labels,
            created_at: task.created_at,
            updated_at: task.updated_at,
            row_version: task.row_version,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    pub label_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    /// Version the caller last read; checked before writing when present
    pub row_version: Option<i32>,
}

#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
    notifier: SharedNotifier,
    clock: SharedClock,
}

impl TaskService {
    pub fn new(pool: PgPool, notifier: SharedNotifier, clock: SharedClock) -> Self {
        Self {
            pool,
            notifier,
            clock,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Option<TaskResponse>> {
        match Task::find_record_by_id(&self.pool, id).await? {
            Some(record) => Ok(self.with_labels(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn get_all(&self, filter: TaskFilter) -> ServiceResult<PagedResult<TaskResponse>> {
        let now = self.clock.utc();
        let records = Task::list_records(&self.pool, &filter, now).await?;
        let total = Task::count(&self.pool, &filter, now).await?;

        let items = self.with_labels(records).await?;
        Ok(PagedResult::new(items, total, filter.paging))
    }

    pub async fn get_by_assigned_user(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> ServiceResult<PagedResult<TaskResponse>> {
        let records =
            Task::list_records_by_assignee(&self.pool, user_id, page.limit(), page.offset())
                .await?;
        let total = Task::count_by_assignee(&self.pool, user_id).await?;

        let items = self.with_labels(records).await?;
        Ok(PagedResult::new(items, total, page))
    }

    pub async fn get_by_project(
        &self,
        project_id: Uuid,
        page: PageParams,
    ) -> ServiceResult<PagedResult<TaskResponse>> {
        let records =
            Task::list_records_by_project(&self.pool, project_id, page.limit(), page.offset())
                .await?;
        let total = Task::count_by_project(&self.pool, project_id).await?;

        let items = self.with_labels(records).await?;
        Ok(PagedResult::new(items, total, page))
    }

    /// Creates a pending task and links the known labels
    ///
    /// # Errors
    ///
    /// `BadRequest` when the project or assignee does not exist, or the due
    /// date lies before today.
    pub async fn create(
        &self,
        input: CreateTaskInput,
        created_by: Uuid,
    ) -> ServiceResult<TaskResponse> {
        if let Some(project_id) = input.project_id {
            self.require_project(project_id).await?;
        }
        if let Some(user_id) = input.assigned_user_id {
            self.require_user(user_id).await?;
        }
        check_due_date(input.due_date, self.clock.utc().date_naive())?;

        let label_ids = Label::existing_ids(&self.pool, &input.label_ids).await?;

        let mut tx = self.pool.begin().await?;
        let task = Task::create(
            &mut tx,
            CreateTask {
                title: input.title,
                description: input.description,
                priority: input.priority,
                due_date: input.due_date,
                project_id: input.project_id,
                assigned_user_id: input.assigned_user_id,
                created_by_user_id: created_by,
            },
        )
        .await?;
        Label::attach_to_task(&mut tx, task.id, &label_ids).await?;
        tx.commit().await?;

        info!(task_id = %task.id, created_by = %created_by, "Task created");

        if let Some(user_id) = task.assigned_user_id {
            self.notifier.task_assigned(&task, user_id).await;
        }

        self.response(task.id).await
    }

    /// Replaces the editable fields of a task
    pub async fn update(&self, id: Uuid, input: UpdateTaskInput) -> ServiceResult<TaskResponse> {
        let task = self.load(id).await?;

        if let Some(expected) = input.row_version {
            if expected != task.row_version {
                return Err(stale(id));
            }
        }
        check_due_date(input.due_date, self.clock.utc().date_naive())?;
        if let Some(project_id) = input.project_id {
            self.require_project(project_id).await?;
        }

        Task::update_details(
            &self.pool,
            id,
            task.row_version,
            UpdateTaskDetails {
                title: input.title,
                description: input.description,
                priority: input.priority,
                due_date: input.due_date,
                project_id: input.project_id,
            },
        )
        .await?
        .ok_or_else(|| stale(id))?;

        self.response(id).await
    }

    pub async fn update_status(&self, id: Uuid, status: TaskStatus) -> ServiceResult<TaskResponse> {
        let task = self.load(id).await?;

        if !task.status.can_transition_to(status) {
            return Err(ServiceError::BadRequest(format!(
                "Cannot change status of a completed task to {}",
                status
            )));
        }

        let completed_at = completion_time(status, self.clock.utc());
        let updated = Task::update_status(&self.pool, id, task.row_version, status, completed_at)
            .await?
            .ok_or_else(|| stale(id))?;

        info!(task_id = %id, from = %task.status, to = %status, "Task status updated");

        if let Some(user_id) = updated.assigned_user_id {
            self.notifier.status_changed(&updated, user_id).await;
        }

        self.response(id).await
    }

    pub async fn assign_user(&self, id: Uuid, user_id: Uuid) -> ServiceResult<TaskResponse> {
        let task = self.load(id).await?;
        self.require_user(user_id).await?;

        let updated = Task::assign(&self.pool, id, task.row_version, user_id)
            .await?
            .ok_or_else(|| stale(id))?;

        self.notifier.task_assigned(&updated, user_id).await;
        self.response(id).await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if !Task::soft_delete(&self.pool, id).await? {
            return Err(task_not_found(id));
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Task> {
        Task::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| task_not_found(id))
    }

    async fn response(&self, id: Uuid) -> ServiceResult<TaskResponse> {
        self.get_by_id(id).await?.ok_or_else(|| task_not_found(id))
    }

    async fn require_project(&self, project_id: Uuid) -> ServiceResult<()> {
        if Project::exists(&self.pool, project_id).await? {
            Ok(())
        } else {
            Err(ServiceError::BadRequest(format!(
                "Project {} does not exist",
                project_id
            )))
        }
    }

    async fn require_user(&self, user_id: Uuid) -> ServiceResult<()> {
        if User::exists(&self.pool, user_id).await? {
            Ok(())
        } else {
            Err(ServiceError::BadRequest(format!(
                "User {} does not exist",
                user_id
            )))
        }
    }

    /// Loads labels for all records with one query
    async fn with_labels(&self, records: Vec<TaskRecord>) -> ServiceResult<Vec<TaskResponse>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.task.id).collect();
        let labels = Label::list_for_tasks(&self.pool, &ids).await?;

        Ok(attach_labels(records, labels))
    }
}

fn attach_labels(records: Vec<TaskRecord>, labels: Vec<TaskLabel>) -> Vec<TaskResponse> {
    let mut by_task: HashMap<Uuid, Vec<LabelDto>> = HashMap::new();
    for label in labels {
        by_task.entry(label.task_id).or_default().push(label.into());
    }

    records
        .into_iter()
        .map(|record| {
            let labels = by_task.remove(&record.task.id).unwrap_or_default();
            TaskResponse::from_record(record, labels)
        })
        .collect()
}

/// Due dates may not fall on a day before `today`
fn check_due_date(due_date: Option<DateTime<Utc>>, today: NaiveDate) -> ServiceResult<()> {
    match due_date {
        Some(due) if due.date_naive() < today => Err(ServiceError::BadRequest(
            "Due date cannot be in the past".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `completed_at` to write for a status change; `None` keeps the stored value
///
/// Every change to Completed stamps `now`, including Completed to Completed.
fn completion_time(target: TaskStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (target == TaskStatus::Completed).then_some(now)
}

fn task_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Task {} not found", id))
}

fn stale(id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!(
        "Task {} was modified by another request; reload and retry",
        id
    ))
}
