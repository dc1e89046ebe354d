//! The `SubmissionStore` trait and supporting result types.
//!
//! The trait is implemented by storage backends (`MemoryStore` here,
//! `moderation-store-sqlite` for durable storage). The gateway depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::submission::{NewSubmission, ReviewStatus, Submission, SubmissionKind};

// ─── Result types ────────────────────────────────────────────────────────────

/// Outcome of [`SubmissionStore::compare_and_set_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
  /// The write committed; carries the submission as stored afterwards,
  /// including the new history entry.
  Applied(Submission),
  /// The stored status did not match the expected one. Nothing was written.
  Conflict { current: ReviewStatus },
  /// The stored status matched but is terminal, so it can never be left.
  /// Nothing was written.
  Terminal { current: ReviewStatus },
  NotFound,
}

/// Number of submissions of one kind currently in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
  pub kind:   SubmissionKind,
  pub status: ReviewStatus,
  pub count:  u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a submission store backend.
///
/// `compare_and_set_status` is the only way a status changes. Implementations
/// must make the status check, the status write and the history append a
/// single atomic unit, scoped to one submission; unrelated submissions must
/// not serialise behind each other beyond what the backend itself imposes.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SubmissionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new `pending` submission. Used by the intake layer; the
  /// moderation core never calls this itself.
  fn create(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// Retrieve a submission by kind and id. Returns `None` if no submission of
  /// that kind has that id.
  fn get(
    &self,
    kind: SubmissionKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  /// All submissions of `kind` in `status`, oldest first. Submissions created
  /// at the same instant keep their insertion order.
  fn list_by_status(
    &self,
    kind: SubmissionKind,
    status: ReviewStatus,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Move `(kind, id)` from `expected` to `new`, appending a history entry
  /// attributed to `actor_id`. Never overwrites a status other than
  /// `expected`, and never leaves a terminal status: a matching terminal
  /// `expected` yields [`CasOutcome::Terminal`].
  fn compare_and_set_status(
    &self,
    kind: SubmissionKind,
    id: Uuid,
    expected: ReviewStatus,
    new: ReviewStatus,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<CasOutcome, Self::Error>> + Send + '_;

  /// Per-(kind, status) counts from a single consistent read. Pairs with no
  /// submissions may be omitted.
  fn status_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<StatusCount>, Self::Error>> + Send + '_;
}
