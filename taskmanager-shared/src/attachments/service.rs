/// Attachment workflows
///
/// # Upload flow
///
/// ```text
/// validate ─> task exists? ─> task active? ─> under limit?
///          ─> save blob ─> insert metadata (on failure: delete blob)
/// ```

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::storage::{FileStorage, StorageError};
use super::store::{Attachment, AttachmentStore};
use super::task_lookup::TaskLookup;
use super::validation::{sanitize_file_name, storage_path, validate_upload, UploadValidationError};
use crate::auth::middleware::AuthContext;
use crate::clock::SharedClock;

pub const MAX_ATTACHMENTS_PER_TASK: i64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Validation(#[from] UploadValidationError),

    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Cannot attach files to an inactive task")]
    TaskInactive,

    #[error("Task already has the maximum of 5 attachments")]
    LimitReached,

    #[error("{0}")]
    NotFound(String),

    #[error("Only the uploader or an administrator can delete this attachment")]
    Forbidden,

    #[error("Failed to store file: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to access attachment metadata: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

/// A file received from a client
#[derive(Debug, Clone)]
pub struct UploadAttachment {
    pub task_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by_user_id: Uuid,
}

impl From<Attachment> for AttachmentResponse {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            task_id: a.task_id,
            file_name: a.file_name,
            file_size: a.file_size,
            content_type: a.content_type,
            uploaded_at: a.uploaded_at,
            uploaded_by_user_id: a.uploaded_by_user_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub attachment: AttachmentResponse,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct AttachmentService {
    store: Arc<dyn AttachmentStore>,
    storage: Arc<dyn FileStorage>,
    tasks: Arc<dyn TaskLookup>,
    clock: SharedClock,
}

impl AttachmentService {
    pub fn new(
        store: Arc<dyn AttachmentStore>,
        storage: Arc<dyn FileStorage>,
        tasks: Arc<dyn TaskLookup>,
        clock: SharedClock,
    ) -> Self {
        Self {
            store,
            storage,
            tasks,
            clock,
        }
    }

    pub async fn upload(
        &self,
        request: UploadAttachment,
        user_id: Uuid,
    ) -> AttachmentResult<AttachmentResponse> {
        validate_upload(&request)?;

        info!(
            task_id = %request.task_id,
            file_name = %request.file_name,
            user_id = %user_id,
            "Starting attachment upload"
        );

        let task = self
            .tasks
            .get_task_by_id(request.task_id)
            .await?
            .ok_or(AttachmentError::TaskNotFound(request.task_id))?;
        if !task.is_active {
            warn!(task_id = %task.id, "Upload rejected: task is inactive");
            return Err(AttachmentError::TaskInactive);
        }

        let count = self.store.count_by_task_id(task.id).await?;
        if count >= MAX_ATTACHMENTS_PER_TASK {
            warn!(task_id = %task.id, count, "Upload rejected: attachment limit reached");
            return Err(AttachmentError::LimitReached);
        }

        let id = Uuid::new_v4();
        let path = storage_path(task.id, id, &request.file_name);
        let file_size = request.data.len() as i64;

        if let Err(e) = self.storage.save(&path, request.data).await {
            error!(error = %e, path = %path, "Failed to save attachment file");
            return Err(e.into());
        }

        let attachment = Attachment {
            id,
            task_id: task.id,
            file_name: sanitize_file_name(&request.file_name),
            file_size,
            content_type: request.content_type,
            uploaded_at: self.clock.utc(),
            uploaded_by_user_id: user_id,
            storage_path: path,
        };

        if let Err(e) = self.store.add(&attachment).await {
            error!(error = %e, path = %attachment.storage_path, "Failed to save attachment metadata, removing file");
            if let Err(rollback) = self.storage.delete(&attachment.storage_path).await {
                error!(error = %rollback, path = %attachment.storage_path, "Failed to remove orphaned file");
            }
            return Err(e.into());
        }

        info!(
            attachment_id = %attachment.id,
            task_id = %attachment.task_id,
            file_size,
            "Attachment uploaded"
        );

        Ok(attachment.into())
    }

    pub async fn get(&self, id: Uuid) -> AttachmentResult<AttachmentResponse> {
        Ok(self.load(id).await?.into())
    }

    pub async fn list_for_task(&self, task_id: Uuid) -> AttachmentResult<Vec<AttachmentResponse>> {
        if self.tasks.get_task_by_id(task_id).await?.is_none() {
            return Err(AttachmentError::TaskNotFound(task_id));
        }

        let attachments = self.store.get_by_task_id(task_id).await?;
        Ok(attachments.into_iter().map(Into::into).collect())
    }

    pub async fn download(&self, id: Uuid) -> AttachmentResult<AttachmentDownload> {
        let attachment = self.load(id).await?;

        let data = match self.storage.get(&attachment.storage_path).await {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => {
                warn!(attachment_id = %id, path = %attachment.storage_path, "Attachment file is missing");
                return Err(AttachmentError::NotFound(format!(
                    "File for attachment {} not found",
                    id
                )));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(AttachmentDownload {
            attachment: attachment.into(),
            data,
        })
    }

    /// Removes the metadata row, then the file
    ///
    /// A file that cannot be removed is logged and left behind.
    pub async fn delete(&self, id: Uuid, actor: &AuthContext) -> AttachmentResult<()> {
        let attachment = self.load(id).await?;

        if attachment.uploaded_by_user_id != actor.user_id && !actor.is_admin() {
            return Err(AttachmentError::Forbidden);
        }

        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        if let Err(e) = self.storage.delete(&attachment.storage_path).await {
            warn!(error = %e, path = %attachment.storage_path, "Failed to delete attachment file");
        }

        info!(attachment_id = %id, user_id = %actor.user_id, "Attachment deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> AttachmentResult<Attachment> {
        self.store.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AttachmentError {
    AttachmentError::NotFound(format!("Attachment {} not found", id))
}
