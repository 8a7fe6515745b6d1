//! Staged file registry
//!
//! A [`Session`] is an ordered list of staged files. Staging, removal and
//! clearing never modify a session in place: each returns a new value, and
//! entries untouched by the operation keep their identity.

use super::validator::{check, Rejection, UploadPolicy};
use super::FileCandidate;
use crate::api::UploadResponse;
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Identifier of a staged file, stable for the entry's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    fn generate() -> Self {
        FileId(Uuid::new_v4())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a staged file
///
/// ```text
/// Pending -> Uploading -> Completed(result)
///                     \-> Error(message)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Pending,
    Uploading,
    Completed(UploadResponse),
    Error(String),
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Uploading => "uploading",
            FileStatus::Completed(_) => "completed",
            FileStatus::Error(_) => "error",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FileStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed(_) | FileStatus::Error(_))
    }
}

/// One user-selected file awaiting or undergoing upload
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    id: FileId,
    payload: FileCandidate,
    status: FileStatus,
    progress: u8,
    staged_at: DateTime<Utc>,
}

impl StagedFile {
    fn new(payload: FileCandidate) -> Self {
        Self {
            id: FileId::generate(),
            payload,
            status: FileStatus::Pending,
            progress: 0,
            staged_at: Utc::now(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn payload(&self) -> &FileCandidate {
        &self.payload
    }

    pub fn name(&self) -> &str {
        &self.payload.name
    }

    pub fn status(&self) -> &FileStatus {
        &self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn staged_at(&self) -> DateTime<Utc> {
        self.staged_at
    }

    /// Present only once completed
    pub fn result(&self) -> Option<&UploadResponse> {
        match &self.status {
            FileStatus::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// Present only after a failed upload
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            FileStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn mark_uploading(&mut self, progress: u8) {
        self.status = FileStatus::Uploading;
        self.progress = progress.min(99);
    }

    pub(crate) fn mark_completed(&mut self, result: UploadResponse) {
        self.status = FileStatus::Completed(result);
        self.progress = 100;
    }

    pub(crate) fn mark_failed(&mut self, message: String) {
        self.status = FileStatus::Error(message);
        self.progress = 0;
    }

    pub fn summary(&self) -> EntrySummary<'_> {
        EntrySummary {
            id: self.id,
            name: &self.payload.name,
            mime_type: &self.payload.mime_type,
            byte_size: self.payload.byte_size(),
            status: self.status.as_str(),
            progress: self.progress,
            staged_at: self.staged_at,
            error: self.error_message(),
            result: self.result(),
        }
    }
}

/// Serializable view of a staged file, without its bytes
#[derive(Debug, Serialize)]
pub struct EntrySummary<'a> {
    pub id: FileId,
    pub name: &'a str,
    pub mime_type: &'a str,
    pub byte_size: u64,
    pub status: &'static str,
    pub progress: u8,
    pub staged_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a UploadResponse>,
}

/// What a staging call did with its candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    /// Ids of the entries appended, in order
    pub staged: Vec<FileId>,
    /// Candidates excluded by the validator
    pub rejected: Vec<(String, Rejection)>,
    /// Valid candidates dropped for lack of capacity
    pub truncated: usize,
}

impl StageOutcome {
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.rejected.is_empty() || self.truncated > 0
    }
}

/// Ordered collection of staged files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    entries: Vec<StagedFile>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StagedFile] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.entries.iter()
    }

    pub fn get(&self, id: FileId) -> Option<&StagedFile> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: FileId) -> Option<&mut StagedFile> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Ids of entries currently pending, in session order
    pub fn pending_ids(&self) -> Vec<FileId> {
        self.entries
            .iter()
            .filter(|e| e.status.is_pending())
            .map(|e| e.id)
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.status.is_pending())
    }

    /// Validate candidates and append the survivors as pending entries.
    ///
    /// Rejected candidates are dropped. Accepted ones beyond the remaining
    /// capacity (`max_file_count - len`) are dropped from the tail of the
    /// batch, so the session never grows past `max_file_count`.
    pub fn stage<I>(&self, candidates: I, policy: &UploadPolicy) -> (Session, StageOutcome)
    where
        I: IntoIterator<Item = FileCandidate>,
    {
        let mut outcome = StageOutcome::default();
        let mut accepted = Vec::new();

        for candidate in candidates {
            match check(&candidate, policy) {
                Ok(()) => accepted.push(candidate),
                Err(rejection) => {
                    tracing::warn!(
                        file = %candidate.name,
                        reason = rejection.reason(),
                        "Rejected file: {}",
                        rejection
                    );
                    metrics::record_staging_rejection(rejection.reason(), 1);
                    outcome.rejected.push((candidate.name, rejection));
                }
            }
        }

        let capacity = policy.max_file_count.saturating_sub(self.entries.len());
        if accepted.len() > capacity {
            outcome.truncated = accepted.len() - capacity;
            accepted.truncate(capacity);
            tracing::warn!(
                dropped = outcome.truncated,
                max_file_count = policy.max_file_count,
                "Session is full, dropping extra files"
            );
            metrics::record_staging_rejection("capacity", outcome.truncated as u64);
        }

        let mut entries = self.entries.clone();
        entries.reserve(accepted.len());
        for candidate in accepted {
            let entry = StagedFile::new(candidate);
            outcome.staged.push(entry.id);
            entries.push(entry);
        }

        (Session { entries }, outcome)
    }

    /// Drop the entry with `id`. No-op when absent.
    pub fn remove(&self, id: FileId) -> Session {
        Session {
            entries: self
                .entries
                .iter()
                .filter(|e| e.id != id)
                .cloned()
                .collect(),
        }
    }

    /// Drop every entry, in flight or not.
    pub fn clear(&self) -> Session {
        Session::default()
    }
}
