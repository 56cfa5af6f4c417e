//! Upload boundary: local file to attachment
//!
//! The size check runs on file metadata before any bytes are read.

use crate::error::TutorError;
use std::path::Path;
use tutor_model::Attachment;

/// Read `path` into an attachment, rejecting files over `max_bytes`
pub async fn read_attachment(path: &Path, max_bytes: u64) -> Result<Attachment, TutorError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| TutorError::io_error(path, e))?;
    check_size(&name, metadata.len(), max_bytes)?;

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| TutorError::io_error(path, e))?;
    check_size(&name, data.len() as u64, max_bytes)?;

    let attachment = Attachment::with_guessed_mime(name, data);
    tracing::debug!(
        file = %attachment.name,
        mime = %attachment.mime_type,
        bytes = attachment.size(),
        "attachment read"
    );
    Ok(attachment)
}

/// Reject sizes over the limit
pub fn check_size(name: &str, size: u64, max_bytes: u64) -> Result<(), TutorError> {
    if size > max_bytes {
        tracing::warn!(file = name, size, max = max_bytes, "upload rejected");
        return Err(TutorError::UploadTooLarge {
            name: name.to_string(),
            size,
            max: max_bytes,
        });
    }
    Ok(())
}
