/// Upload validation and file-name hygiene
///
/// All rules are checked and every failure is reported. The error kind is
/// chosen by priority: a bad MIME type wins over a bad size, which wins over
/// anything else.

use uuid::Uuid;

use super::mime::{extension_of, is_allowed_extension, is_allowed_mime_type, ALLOWED_EXTENSIONS_HINT};
use super::service::UploadAttachment;

/// 10 MiB
pub const MAX_FILE_SIZE_BYTES: u64 = 10_485_760;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadValidationError {
    #[error("{}", .0.join("; "))]
    UnsupportedMediaType(Vec<String>),

    #[error("{}", .0.join("; "))]
    PayloadTooLarge(Vec<String>),

    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl UploadValidationError {
    pub fn messages(&self) -> &[String] {
        match self {
            Self::UnsupportedMediaType(m) | Self::PayloadTooLarge(m) | Self::Invalid(m) => m,
        }
    }
}

pub fn validate_upload(upload: &UploadAttachment) -> Result<(), UploadValidationError> {
    let mut errors = Vec::new();
    let mut bad_mime = false;
    let mut bad_size = false;

    if upload.task_id.is_nil() {
        errors.push("task_id is required".to_string());
    }

    let size = upload.data.len() as u64;
    if size == 0 || size > MAX_FILE_SIZE_BYTES {
        bad_size = true;
        errors.push(format!(
            "File must be between 1 byte and {} MB",
            MAX_FILE_SIZE_BYTES / 1_048_576
        ));
    }

    if upload.file_name.trim().is_empty() {
        errors.push("File name is required".to_string());
    } else if !is_allowed_extension(&extension_of(&upload.file_name)) {
        errors.push(format!(
            "File extension not allowed. Allowed: {}",
            ALLOWED_EXTENSIONS_HINT
        ));
    }

    if upload.content_type.trim().is_empty() || !is_allowed_mime_type(&upload.content_type) {
        bad_mime = true;
        errors.push(format!(
            "MIME type not allowed. Allowed: {}",
            ALLOWED_EXTENSIONS_HINT
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else if bad_mime {
        Err(UploadValidationError::UnsupportedMediaType(errors))
    } else if bad_size {
        Err(UploadValidationError::PayloadTooLarge(errors))
    } else {
        Err(UploadValidationError::Invalid(errors))
    }
}

/// Strips directories and characters that are unsafe in file names
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let replaced: String = base
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Relative blob path: `{task_id}/{attachment_id}{ext}`
pub fn storage_path(task_id: Uuid, attachment_id: Uuid, file_name: &str) -> String {
    format!("{}/{}{}", task_id, attachment_id, extension_of(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn upload(file_name: &str, content_type: &str, size: usize) -> UploadAttachment {
        UploadAttachment {
            task_id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from(vec![7u8; size]),
        }
    }

    #[test]
    fn test_valid_upload() {
        assert!(validate_upload(&upload("plan.pdf", "application/pdf", 1024)).is_ok());
        assert!(validate_upload(&upload("photo.JPEG", "image/jpeg", 1)).is_ok());
    }

    #[test]
    fn test_max_size_is_inclusive() {
        let exact = upload("big.png", "image/png", MAX_FILE_SIZE_BYTES as usize);
        assert!(validate_upload(&exact).is_ok());

        let over = upload("big.png", "image/png", MAX_FILE_SIZE_BYTES as usize + 1);
        assert!(matches!(
            validate_upload(&over),
            Err(UploadValidationError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_empty_file_is_too_large_kind() {
        assert!(matches!(
            validate_upload(&upload("empty.pdf", "application/pdf", 0)),
            Err(UploadValidationError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_mime_error_takes_priority() {
        let err = validate_upload(&upload("script.exe", "application/x-msdownload", 0)).unwrap_err();

        assert!(matches!(err, UploadValidationError::UnsupportedMediaType(_)));
        assert_eq!(err.messages().len(), 3);
    }

    #[test]
    fn test_missing_content_type_is_unsupported() {
        assert!(matches!(
            validate_upload(&upload("notes.pdf", "", 10)),
            Err(UploadValidationError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_bad_extension_is_invalid() {
        let err = validate_upload(&upload("notes.txt", "application/pdf", 10)).unwrap_err();
        assert!(matches!(err, UploadValidationError::Invalid(_)));
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn test_nil_task_id_is_invalid() {
        let mut request = upload("a.png", "image/png", 10);
        request.task_id = Uuid::nil();
        assert!(matches!(
            validate_upload(&request),
            Err(UploadValidationError::Invalid(_))
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("what?is*this.png"), "what_is_this.png");
        assert_eq!(sanitize_file_name("  .hidden. "), "hidden");
        assert_eq!(sanitize_file_name("tab\there.doc"), "tab_here.doc");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn test_storage_path() {
        let task = Uuid::new_v4();
        let id = Uuid::new_v4();
        assert_eq!(
            storage_path(task, id, "Scan.JPG"),
            format!("{}/{}.jpg", task, id)
        );
        assert_eq!(storage_path(task, id, "noext"), format!("{}/{}", task, id));
    }
}
