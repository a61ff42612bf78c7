/// Allowed upload types
///
/// Each MIME type maps to its accepted extensions; the first extension is the
/// canonical one. Lookups ignore case.

const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &[".jpg", ".jpeg"]),
    ("image/png", &[".png"]),
    ("image/gif", &[".gif"]),
    ("application/pdf", &[".pdf"]),
    ("application/msword", &[".doc"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &[".docx"],
    ),
    ("application/vnd.ms-excel", &[".xls"]),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &[".xlsx"],
    ),
];

/// Human-readable list used in validation messages
pub const ALLOWED_EXTENSIONS_HINT: &str = "jpg, jpeg, png, gif, pdf, doc, docx, xls, xlsx";

pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_TYPES
        .iter()
        .any(|(mime, _)| mime.eq_ignore_ascii_case(mime_type.trim()))
}

/// `extension` includes the leading dot
pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_TYPES
        .iter()
        .flat_map(|(_, extensions)| extensions.iter())
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Lowercased extension of the last path component, dot included
///
/// Returns an empty string when the name has no extension.
pub fn extension_of(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);

    match base.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < base.len() => base[pos..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types_case_insensitive() {
        assert!(is_allowed_mime_type("image/png"));
        assert!(is_allowed_mime_type("IMAGE/PNG"));
        assert!(is_allowed_mime_type("application/vnd.ms-excel"));
        assert!(!is_allowed_mime_type("text/plain"));
        assert!(!is_allowed_mime_type("application/x-msdownload"));
        assert!(!is_allowed_mime_type(""));
    }

    #[test]
    fn test_extensions() {
        for ext in [".jpg", ".jpeg", ".png", ".gif", ".pdf", ".doc", ".docx", ".xls", ".xlsx"] {
            assert!(is_allowed_extension(ext), "{ext} should be allowed");
        }
        assert!(is_allowed_extension(".PDF"));
        assert!(!is_allowed_extension(".exe"));
        assert!(!is_allowed_extension("pdf"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.PDF"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("C:\\docs\\plan.Docx"), ".docx");
        assert_eq!(extension_of("dir.v2/README"), "");
        assert_eq!(extension_of(".hidden"), "");
        assert_eq!(extension_of("trailing."), "");
    }
}
