//! Upload control: local gating of files before they reach the network.
//!
//! A file is accepted only if its MIME type is PDF, DOCX or plain text and
//! its size does not exceed the configured limit (10 MiB by default). The
//! MIME type is derived from the file extension, the same way a browser
//! fills in `File.type`. Rejections never produce a request.

use std::path::Path;

use crate::error::ClientError;
use crate::list::format_file_size;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TXT: &str = "text/plain";

pub const ALLOWED_MIME_TYPES: [&str; 3] = [MIME_PDF, MIME_DOCX, MIME_TXT];

pub const TYPE_REJECTED: &str = "Please upload a PDF, DOCX, or TXT file";

/// Rejection message for a file over `max_bytes`, e.g.
/// `File size must be less than 10MB` for the default limit.
pub fn size_rejected(max_bytes: u64) -> String {
    format!(
        "File size must be less than {}",
        format_file_size(max_bytes).replace(' ', "")
    )
}

/// A file that passed validation and is ready to send.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// MIME type for a file name, by extension. Unknown extensions map to
/// `application/octet-stream`.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => MIME_PDF,
        Some("docx") => MIME_DOCX,
        Some("txt") => MIME_TXT,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("doc") => "application/msword",
        _ => "application/octet-stream",
    }
}

/// Check type and size. The type check runs first.
pub fn validate(mime: &str, size: u64, max_bytes: u64) -> Result<(), ClientError> {
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(ClientError::Validation(TYPE_REJECTED.to_string()));
    }
    if size > max_bytes {
        return Err(ClientError::Validation(size_rejected(max_bytes)));
    }
    Ok(())
}

/// Validate a file on disk and read it.
///
/// Size is checked from metadata so oversized files are never read.
pub fn prepare(path: &Path, max_bytes: u64) -> Result<UploadFile, ClientError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ClientError::Validation(format!("Invalid file name: {}", path.display())))?
        .to_string();
    let mime = mime_for_name(&name);

    let metadata = std::fs::metadata(path)
        .map_err(|e| ClientError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(ClientError::Validation(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    validate(mime, metadata.len(), max_bytes)?;

    let bytes = std::fs::read(path)
        .map_err(|e| ClientError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    Ok(UploadFile { name, mime, bytes })
}
