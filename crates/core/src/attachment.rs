//! Evidence-file allow-listing.
//!
//! Files are accepted by extension and size only; content is stored opaquely.

use crate::error::CoreError;

/// Default maximum upload size (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Default allowed extensions (lowercase, without the dot).
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Upload limits applied before anything reaches the blob store.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl UploadPolicy {
    /// Validate a file name and size against the policy.
    ///
    /// Returns the normalised (lowercase) extension on success.
    pub fn check(&self, file_name: &str, size: u64) -> Result<String, CoreError> {
        let ext = extension_of(file_name).ok_or_else(|| {
            CoreError::Validation(format!("File '{file_name}' has no extension"))
        })?;

        if !self.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(CoreError::Validation(format!(
                "Invalid file type '{ext}'. Allowed: {}",
                self.allowed_extensions.join(", ")
            )));
        }

        if size == 0 {
            return Err(CoreError::Validation("File is empty".into()));
        }
        if size > self.max_bytes {
            return Err(CoreError::Validation(format!(
                "File size {size} exceeds limit of {} bytes",
                self.max_bytes
            )));
        }

        Ok(ext)
    }
}

/// Lowercase extension of `file_name`, if it has a non-empty one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type derived from the extension. Unknown types are opaque bytes.
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
