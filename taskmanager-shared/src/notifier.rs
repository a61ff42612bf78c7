/// Task event notifications
///
/// Services call the notifier after a task is assigned or changes status.
/// The only implementation writes structured log events; delivery to users
/// (email, push) is out of scope.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::task::Task;

#[async_trait]
pub trait TaskNotifier: Send + Sync {
    /// `user_id` was made the assignee of `task`
    async fn task_assigned(&self, task: &Task, user_id: Uuid);

    /// The status of `task`, assigned to `user_id`, changed
    async fn status_changed(&self, task: &Task, user_id: Uuid);
}

pub type SharedNotifier = Arc<dyn TaskNotifier>;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTaskNotifier;

#[async_trait]
impl TaskNotifier for LoggingTaskNotifier {
    async fn task_assigned(&self, task: &Task, user_id: Uuid) {
        info!(
            task_id = %task.id,
            user_id = %user_id,
            title = %task.title,
            "Task assigned"
        );
    }

    async fn status_changed(&self, task: &Task, user_id: Uuid) {
        info!(
            task_id = %task.id,
            user_id = %user_id,
            status = %task.status,
            "Task status changed"
        );
    }
}
