//! Attachment intake: validation and persistence of uploaded files.
//!
//! The [`AttachmentStore`] accepts a single binary upload, validates it
//! against a size cap and a file-type allow-list, writes it into a flat
//! blob directory under a timestamp-disambiguated name, and returns the
//! [`Attachment`] descriptor the client attaches to a task. It never
//! mutates task state.

use std::path::{Path, PathBuf};

use chrono::Utc;
use taskboard_proto::task::Attachment;

/// Default maximum upload size in bytes (5 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// File extensions (and content-type tokens) accepted by the intake.
const ALLOWED_TYPES: [&str; 7] = ["jpeg", "jpg", "png", "gif", "pdf", "doc", "docx"];

/// Errors produced by the attachment intake.
///
/// Validation failures surface as HTTP 400 responses to the uploading
/// client only; they are never broadcast and no byte is durably kept.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The multipart request carried no `file` field.
    #[error("No file uploaded")]
    MissingFile,
    /// Declared size exceeds the configured cap.
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge {
        /// Size of the rejected upload.
        size: u64,
        /// Configured maximum.
        max: u64,
    },
    /// Extension or content-type is outside the allow-list.
    #[error("Invalid file type")]
    InvalidFileType,
    /// The blob directory or file could not be written.
    #[error("failed to persist upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether this error is the client's fault (HTTP 400) rather than a
    /// server-side persistence failure (HTTP 500).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Blob area for uploaded attachments.
///
/// Files are stored flat under `root` as `<millis>-<originalname>`, which
/// disambiguates concurrent uploads of the same filename without a content
/// hash. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    max_size: u64,
}

impl AttachmentStore {
    /// Creates an intake rooted at the given directory with the default
    /// 5 MiB size cap.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Creates an intake with a custom size cap.
    #[must_use]
    pub fn with_max_size(root: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            root: root.into(),
            max_size,
        }
    }

    /// The blob directory this intake writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configured size cap in bytes.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Validates and persists one upload, returning its descriptor.
    ///
    /// Both checks must pass before any byte is durably kept: the size must
    /// not exceed the cap, and the file extension and declared content-type
    /// must both match the allow-list. The content-type check is token
    /// containment (`image/png` matches `png`), mirroring how board clients
    /// declare types.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::FileTooLarge`] or [`UploadError::InvalidFileType`]
    /// on validation failure, or [`UploadError::Io`] if the write fails.
    pub async fn save(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Attachment, UploadError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.max_size,
            });
        }

        // Strip any path components the client smuggled into the filename.
        let original = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(UploadError::InvalidFileType)?;

        if !extension_allowed(original) || !content_type_allowed(content_type) {
            return Err(UploadError::InvalidFileType);
        }

        let stored = format!("{}-{}", Utc::now().timestamp_millis(), original);
        let dest = self.root.join(&stored);

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&dest, data).await?;

        tracing::info!(filename = %stored, size, "attachment stored");

        Ok(Attachment {
            path: format!("/uploads/{stored}"),
            filename: stored,
            size,
        })
    }
}

/// Checks the file extension against the allow-list, case-insensitively.
fn extension_allowed(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            ALLOWED_TYPES.contains(&ext.as_str())
        })
}

/// Checks the declared content-type for an allow-listed token.
fn content_type_allowed(content_type: &str) -> bool {
    let ct = content_type.to_lowercase();
    ALLOWED_TYPES.iter().any(|t| ct.contains(t))
}
