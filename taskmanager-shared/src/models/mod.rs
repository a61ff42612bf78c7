/// Database models for TaskManager
///
/// Each model owns its SQL. Reads skip soft-deleted rows (`is_active = FALSE`)
/// unless the method says otherwise.
///
/// # Models
///
/// - `user`: accounts, roles and refresh tokens
/// - `project`: projects and project membership
/// - `task`: tasks, filtering and optimistic concurrency
/// - `label`: labels and the task/label link table
/// - `paging`: page parameters and paged results
///
/// Attachment metadata lives in [`crate::attachments::store`], outside this module.

pub mod label;
pub mod paging;
pub mod project;
pub mod task;
pub mod user;
