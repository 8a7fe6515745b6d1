//! Shared session handle
//!
//! The session is the only mutable state shared between the caller and the
//! upload driver. It lives in a `tokio::sync::watch` channel: every mutation
//! replaces or edits the value atomically and wakes subscribers, and no borrow
//! is ever held across an `.await`.

use super::registry::{FileId, Session, StageOutcome, StagedFile};
use super::validator::UploadPolicy;
use super::FileCandidate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to one upload session
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<Session>>,
    policy: Arc<UploadPolicy>,
    running: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn new(policy: UploadPolicy) -> Self {
        let (state, _) = watch::channel(Session::new());
        Self {
            state: Arc::new(state),
            policy: Arc::new(policy),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Look up a single entry by id
    pub fn entry(&self, id: FileId) -> Option<StagedFile> {
        self.state.borrow().get(id).cloned()
    }

    /// Receive every published change to the session
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Validate and stage files, returning what happened to each.
    pub fn stage<I>(&self, candidates: I) -> StageOutcome
    where
        I: IntoIterator<Item = FileCandidate>,
    {
        let mut outcome = StageOutcome::default();
        self.state.send_if_modified(|session| {
            let (next, result) = session.stage(candidates, &self.policy);
            outcome = result;
            if outcome.staged.is_empty() {
                return false;
            }
            *session = next;
            true
        });

        tracing::debug!(
            staged = outcome.staged_count(),
            rejected = outcome.rejected.len(),
            truncated = outcome.truncated,
            "Staged files"
        );
        outcome
    }

    /// Remove one entry. Returns whether it was present.
    pub fn remove(&self, id: FileId) -> bool {
        self.state.send_if_modified(|session| {
            if session.get(id).is_none() {
                return false;
            }
            *session = session.remove(id);
            true
        })
    }

    /// Drop every entry, including any being uploaded.
    pub fn clear(&self) {
        self.state.send_modify(|session| *session = session.clear());
    }

    /// Whether an upload run currently owns this session
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Apply `f` to the entry with `id` if it still exists.
    ///
    /// Returns `false` when the entry has been removed; the update is dropped.
    pub(crate) fn update_entry<F>(&self, id: FileId, f: F) -> bool
    where
        F: FnOnce(&mut StagedFile),
    {
        self.state.send_if_modified(|session| match session.get_mut(id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        })
    }

    /// Claim the session for an upload run.
    pub(crate) fn begin_run(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running: Arc::clone(&self.running),
            })
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("entries", &self.len())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Releases the run claim when dropped
pub(crate) struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
