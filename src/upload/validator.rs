//! File acceptance rules
//!
//! Decides whether a candidate file may be staged, based on its MIME type and
//! size. Validation is pure: the same candidate and policy always produce the
//! same answer, independent of any other candidate.

use super::FileCandidate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default per-file size limit (50 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Default number of files a session may hold at once
pub const DEFAULT_MAX_FILE_COUNT: usize = 10;

/// Staging policy, immutable for the lifetime of a session.
///
/// # Example
///
/// ```yaml
/// upload:
///   accepted_mime_types: ["image/jpeg", "image/png"]
///   max_file_bytes: 52428800
///   max_file_count: 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// MIME types allowed into the session. Default: JPEG and PNG
    #[serde(default = "default_accepted_mime_types")]
    pub accepted_mime_types: Vec<String>,

    /// Largest accepted file in bytes. Default: 50 MiB
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Maximum number of files staged at the same time. Default: 10
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_mime_types: default_accepted_mime_types(),
            max_file_bytes: default_max_file_bytes(),
            max_file_count: default_max_file_count(),
        }
    }
}

impl UploadPolicy {
    /// Whether `mime_type` is in the accepted set (exact match)
    pub fn accepts_type(&self, mime_type: &str) -> bool {
        self.accepted_mime_types.iter().any(|t| t == mime_type)
    }
}

fn default_accepted_mime_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/jpg".to_string(),
    ]
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_max_file_count() -> usize {
    DEFAULT_MAX_FILE_COUNT
}

/// Why a candidate was kept out of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnsupportedType { mime_type: String },
    TooLarge { byte_size: u64, limit: u64 },
}

impl Rejection {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::UnsupportedType { .. } => "unsupported_type",
            Rejection::TooLarge { .. } => "too_large",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnsupportedType { mime_type } => {
                write!(f, "unsupported type '{}'", mime_type)
            }
            Rejection::TooLarge { byte_size, limit } => {
                write!(f, "{} bytes exceeds limit of {} bytes", byte_size, limit)
            }
        }
    }
}

/// Check a candidate against the policy, naming the first rule it breaks.
pub fn check(candidate: &FileCandidate, policy: &UploadPolicy) -> Result<(), Rejection> {
    check_declared(&candidate.mime_type, candidate.byte_size(), policy)
}

/// Same rules as [`check`], applied to a type and size known before the
/// bytes are read.
pub fn check_declared(
    mime_type: &str,
    byte_size: u64,
    policy: &UploadPolicy,
) -> Result<(), Rejection> {
    if !policy.accepts_type(mime_type) {
        return Err(Rejection::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }

    if byte_size > policy.max_file_bytes {
        return Err(Rejection::TooLarge {
            byte_size,
            limit: policy.max_file_bytes,
        });
    }

    Ok(())
}

/// Accept or reject a candidate.
#[inline]
pub fn validate(candidate: &FileCandidate, policy: &UploadPolicy) -> bool {
    check(candidate, policy).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn candidate(mime_type: &str, size: usize) -> FileCandidate {
        FileCandidate::new("scan.jpg", mime_type, Bytes::from(vec![0u8; size]))
    }

    #[test]
    fn test_default_policy() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.max_file_bytes, 52_428_800);
        assert_eq!(policy.max_file_count, 10);
        assert!(policy.accepts_type("image/jpeg"));
        assert!(policy.accepts_type("image/jpg"));
        assert!(!policy.accepts_type("image/gif"));
    }

    #[test]
    fn test_accepts_valid_file() {
        assert!(validate(&candidate("image/png", 1024), &UploadPolicy::default()));
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let result = check(&candidate("application/pdf", 10), &UploadPolicy::default());
        assert_eq!(
            result,
            Err(Rejection::UnsupportedType {
                mime_type: "application/pdf".into()
            })
        );
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = UploadPolicy {
            max_file_bytes: 100,
            ..UploadPolicy::default()
        };
        assert!(validate(&candidate("image/jpeg", 100), &policy));

        let rejection = check(&candidate("image/jpeg", 101), &policy).unwrap_err();
        assert_eq!(rejection.reason(), "too_large");
    }

    #[test]
    fn test_mime_match_is_exact() {
        // No case folding or parameter stripping
        assert!(!validate(&candidate("IMAGE/JPEG", 1), &UploadPolicy::default()));
    }

    #[test]
    fn test_check_declared_matches_check() {
        let policy = UploadPolicy {
            max_file_bytes: 1024,
            ..UploadPolicy::default()
        };
        assert!(check_declared("image/png", 1024, &policy).is_ok());
        assert_eq!(
            check_declared("image/png", 60 * 1024 * 1024, &policy),
            Err(Rejection::TooLarge {
                byte_size: 60 * 1024 * 1024,
                limit: 1024
            })
        );
        assert_eq!(
            check_declared("text/plain", 1, &policy).unwrap_err().reason(),
            "unsupported_type"
        );
    }
}
