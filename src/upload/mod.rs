//! Upload session module
//!
//! Client-side state machine for staging files and sending them to the
//! backend one at a time.
//!
//! ```text
//! FileCandidate --validator--> Session (pending) --driver--> uploading
//!                                                      |--> completed --aggregator--> consumer
//!                                                      '--> error
//! ```

use crate::api::{ApiError, Category, UploadResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

pub mod aggregator;
pub mod driver;
pub mod registry;
pub mod session;
pub mod validator;

pub use aggregator::{collect_results, ResultAggregator, ResultConsumer};
pub use driver::{RunReport, UploadDriver, UPLOADING_PROGRESS};
pub use registry::{EntrySummary, FileId, FileStatus, Session, StageOutcome, StagedFile};
pub use session::SessionHandle;
pub use validator::{check, check_declared, validate, Rejection, UploadPolicy};

/// Message recorded when a failed upload carries no text of its own
pub const GENERIC_UPLOAD_ERROR: &str = "Upload failed";

/// Session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("An upload run is already in progress for this session")]
    RunInProgress,
}

/// Failure of a single upload call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    #[error("{0}")]
    Message(String),

    #[error("Upload failed")]
    Unspecified,
}

impl UploadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        UploadFailure::Message(message.into())
    }

    /// Text to record on the failed entry
    pub fn message(&self) -> String {
        match self {
            UploadFailure::Message(m) if !m.trim().is_empty() => m.clone(),
            _ => GENERIC_UPLOAD_ERROR.to_string(),
        }
    }
}

/// Why a file on disk did not become a candidate
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rejected: {0}")]
    Rejected(Rejection),
}

impl From<ApiError> for UploadFailure {
    fn from(err: ApiError) -> Self {
        UploadFailure::Message(err.to_string())
    }
}

/// A file offered for staging: raw bytes plus name and MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(file_name(path), guess_mime_type(path), Bytes::from(data)))
    }

    /// Read a file from disk only if `policy` would accept it.
    ///
    /// Type and size are checked from the extension and the file metadata
    /// first, so rejected files are never loaded into memory.
    pub async fn load<P: AsRef<Path>>(path: P, policy: &UploadPolicy) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mime_type = guess_mime_type(path);
        let byte_size = tokio::fs::metadata(path).await?.len();
        check_declared(&mime_type, byte_size, policy).map_err(LoadError::Rejected)?;

        let data = tokio::fs::read(path).await?;
        Ok(Self::new(file_name(path), mime_type, Bytes::from(data)))
    }

    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string()
}

fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Performs one upload request for one file
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        category: Category,
        file: FileCandidate,
    ) -> Result<UploadResponse, UploadFailure>;
}

#[async_trait]
impl<U: Uploader + ?Sized> Uploader for std::sync::Arc<U> {
    async fn upload(
        &self,
        category: Category,
        file: FileCandidate,
    ) -> Result<UploadResponse, UploadFailure> {
        (**self).upload(category, file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_fallback() {
        assert_eq!(UploadFailure::new("network error").message(), "network error");
        assert_eq!(UploadFailure::new("  ").message(), GENERIC_UPLOAD_ERROR);
        assert_eq!(UploadFailure::Unspecified.message(), GENERIC_UPLOAD_ERROR);
    }

    #[test]
    fn test_failure_from_api_error() {
        let failure: UploadFailure = ApiError::UploadRejected("Bad Request".into()).into();
        assert_eq!(failure.message(), "Upload failed: Bad Request");
    }

    #[tokio::test]
    async fn test_candidate_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chest.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let candidate = FileCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.name, "chest.jpg");
        assert_eq!(candidate.mime_type, "image/jpeg");
        assert_eq!(candidate.byte_size(), 10);
    }

    #[tokio::test]
    async fn test_load_rejects_oversized_file_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        // Sparse file: the size exists only in metadata
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(60 * 1024 * 1024).unwrap();

        let policy = UploadPolicy::default();
        match FileCandidate::load(&path, &policy).await {
            Err(LoadError::Rejected(Rejection::TooLarge { byte_size, limit })) => {
                assert_eq!(byte_size, 60 * 1024 * 1024);
                assert_eq!(limit, policy.max_file_bytes);
            }
            other => panic!("expected size rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_rejects_type_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"text").unwrap();

        let result = FileCandidate::load(&path, &UploadPolicy::default()).await;
        assert!(matches!(
            result,
            Err(LoadError::Rejected(Rejection::UnsupportedType { .. }))
        ));
    }

    #[tokio::test]
    async fn test_load_accepts_file_within_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"png bytes").unwrap();

        let candidate = FileCandidate::load(&path, &UploadPolicy::default())
            .await
            .unwrap();
        assert_eq!(candidate.mime_type, "image/png");
        assert_eq!(candidate.byte_size(), 9);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileCandidate::load(dir.path().join("gone.png"), &UploadPolicy::default()).await;
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
