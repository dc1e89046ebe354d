//! Error types for `moderation-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::submission::{ReviewStatus, SubmissionKind};

/// Errors surfaced by the moderation gateway. Each variant is a distinct
/// condition the presentation layer renders differently.
#[derive(Debug, Error)]
pub enum Error {
  /// The caller does not hold the administrative role.
  #[error("forbidden: administrative role required")]
  Forbidden,

  #[error("{kind} {id} not found")]
  NotFound { kind: SubmissionKind, id: Uuid },

  /// The submission already reached a terminal state with a different
  /// decision.
  #[error("{kind} {id} was already reviewed ({status})")]
  AlreadyReviewed {
    kind:   SubmissionKind,
    id:     Uuid,
    status: ReviewStatus,
  },

  /// Lost the compare-and-set race after the bounded retry; a fresh read will
  /// show the new status.
  #[error("{kind} {id} was modified concurrently; try again")]
  Conflict { kind: SubmissionKind, id: Uuid },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
