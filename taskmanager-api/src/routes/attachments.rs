/// Attachment endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/attachments` - Multipart upload
/// - `GET /api/v1/attachments/:id` - Metadata
/// - `GET /api/v1/attachments/:id/download` - File contents
/// - `GET /api/v1/attachments/task/:task_id` - Attachments of a task
/// - `DELETE /api/v1/attachments/:id` - Delete (uploader or admin)
///
/// # Upload
///
/// ```text
/// POST /api/v1/attachments
/// Content-Type: multipart/form-data; boundary=...
///
/// task_id=<uuid>   (taskId is accepted too)
/// file=<binary>    (file name and part content type are required)
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Extension, Json,
};
use bytes::Bytes;
use taskmanager_shared::{
    attachments::{validation::MAX_FILE_SIZE_BYTES, AttachmentResponse, UploadAttachment},
    auth::middleware::AuthContext,
};
use uuid::Uuid;

/// Body limit for the upload route; the 10 MiB file rule is enforced by
/// validation so oversize files still get a 413 with a JSON body
pub const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Parts pulled out of the multipart body
#[derive(Debug, Default)]
struct UploadForm {
    task_id: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Option<Bytes>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "Invalid multipart body"))?
        {
            match field.name() {
                Some("task_id") | Some("taskId") => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, "Invalid task_id field"))?;
                    form.task_id = Some(value);
                }
                Some("file") => {
                    form.file_name = field.file_name().map(str::to_string);
                    form.content_type = field.content_type().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, "Failed to read file"))?;
                    form.data = Some(data);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn into_upload(self) -> ApiResult<UploadAttachment> {
        let task_id = self
            .task_id
            .ok_or_else(|| ApiError::BadRequest("task_id is required".to_string()))?;
        let task_id = Uuid::parse_str(task_id.trim())
            .map_err(|_| ApiError::BadRequest("task_id must be a valid UUID".to_string()))?;

        let data = self
            .data
            .ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;

        Ok(UploadAttachment {
            task_id,
            file_name: self.file_name.unwrap_or_default(),
            content_type: self
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            data,
        })
    }
}

/// Body-limit overruns keep their 413; anything else is a malformed request
fn multipart_error(err: MultipartError, context: &str) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::debug!(error = %err, "Upload exceeded the body limit");
        return ApiError::PayloadTooLarge(format!(
            "File must be between 1 byte and {} MB",
            MAX_FILE_SIZE_BYTES / 1_048_576
        ));
    }

    ApiError::BadRequest(format!("{}: {}", context, err))
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<AttachmentResponse>)> {
    let upload = UploadForm::read(multipart).await?.into_upload()?;
    let attachment = state.attachments.upload(upload, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn get_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AttachmentResponse>> {
    Ok(Json(state.attachments.get(id).await?))
}

pub async fn list_task_attachments(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AttachmentResponse>>> {
    Ok(Json(state.attachments.list_for_task(task_id).await?))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let download = state.attachments.download(id).await?;
    let attachment = download.attachment;

    let content_type = HeaderValue::from_str(&attachment.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&content_disposition(&attachment.file_name))
        .map_err(|e| ApiError::InternalError(format!("Invalid file name header: {}", e)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, download.data.len())
        .body(Body::from(download.data))
        .map_err(|e| ApiError::InternalError(format!("Failed to build response: {}", e)))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.attachments.delete(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `attachment; filename="..."` with quotes and non-ASCII replaced
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    format!("attachment; filename=\"{}\"", safe)
}
