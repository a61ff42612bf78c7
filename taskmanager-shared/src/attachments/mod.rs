/// File attachments for tasks
///
/// A self-contained module with its own table and storage. It never joins
/// against or writes to the task tables; task existence comes from the
/// read-only [`task_lookup::TaskLookup`] port.
///
/// ```text
/// AttachmentService
///   ├─> validation   (size, MIME type, extension)
///   ├─> TaskLookup   (tasks, read-only)
///   ├─> FileStorage  (blob bytes)
///   └─> AttachmentStore (metadata rows)
/// ```

pub mod mime;
pub mod service;
pub mod storage;
pub mod store;
pub mod task_lookup;
pub mod validation;

pub use service::{
    AttachmentDownload, AttachmentError, AttachmentResponse, AttachmentService, UploadAttachment,
};
