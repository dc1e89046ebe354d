//! [`ModerationGateway`] — the public moderation contract.
//!
//! Every operation passes the same authorization guard before touching the
//! store. `decide` is safe to retry: replaying a decision that is already
//! recorded succeeds without writing anything.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  caller::Caller,
  stats::{Aggregator, DashboardStats},
  store::{CasOutcome, SubmissionStore},
  submission::{ReviewStatus, Submission, SubmissionKind},
  transition::{Verb, next_status},
};

/// Fetch/decide/compare-and-set rounds `decide` makes before giving up with
/// [`Error::Conflict`].
const DECIDE_ATTEMPTS: usize = 2;

/// Result of [`ModerationGateway::decide`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub submission: Submission,
  /// `true` if the identical decision was already recorded and this call
  /// wrote nothing.
  pub replayed:   bool,
}

pub struct ModerationGateway<S> {
  store:      Arc<S>,
  aggregator: Aggregator<S>,
}

impl<S: SubmissionStore> ModerationGateway<S> {
  pub fn new(store: Arc<S>, stats_max_age: Duration) -> Self {
    let aggregator = Aggregator::new(store.clone(), stats_max_age);
    Self { store, aggregator }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn aggregator(&self) -> &Aggregator<S> { &self.aggregator }

  fn authorize(&self, caller: &Caller, action: &'static str) -> Result<()> {
    if caller.is_admin() {
      return Ok(());
    }
    warn!(caller_id = %caller.id, role = %caller.role, action, "refused non-admin caller");
    Err(Error::Forbidden)
  }

  /// Pending submissions of `kind`, oldest first.
  pub async fn list_pending(
    &self,
    kind: SubmissionKind,
    caller: &Caller,
  ) -> Result<Vec<Submission>> {
    self.authorize(caller, "list_pending")?;
    self
      .store
      .list_by_status(kind, ReviewStatus::Pending)
      .await
      .map_err(Error::store)
  }

  /// Apply `verb` to `(kind, id)` on behalf of `caller`.
  ///
  /// - Already decided the same way: `Ok` with `replayed = true`.
  /// - Already decided the other way: [`Error::AlreadyReviewed`].
  ///
  /// Both of those invalidate the cached stats, since the write they observed
  /// may belong to a caller that has not refreshed yet.
  /// - Lost a compare-and-set race: one more fetch/decide/write round, then
  ///   [`Error::Conflict`] if still contended.
  ///
  /// After a write commits the dashboard stats are refreshed before
  /// returning. A refresh failure is logged and does not affect the result.
  pub async fn decide(
    &self,
    kind: SubmissionKind,
    id: Uuid,
    verb: Verb,
    caller: &Caller,
  ) -> Result<Decision> {
    self.authorize(caller, "decide")?;

    for attempt in 1..=DECIDE_ATTEMPTS {
      let current = self
        .store
        .get(kind, id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::NotFound { kind, id })?;

      let next = match next_status(current.status, verb) {
        Ok(next) => next,
        Err(illegal) if illegal.is_replay() => {
          debug!(%kind, submission_id = %id, %verb, actor_id = %caller.id, "decision replayed");
          // The committing writer may not have refreshed the stats yet.
          self.aggregator.invalidate();
          return Ok(Decision { submission: current, replayed: true });
        }
        Err(illegal) => {
          info!(
            %kind, submission_id = %id, %verb, actor_id = %caller.id,
            status = %illegal.from, "submission already reviewed"
          );
          self.aggregator.invalidate();
          return Err(Error::AlreadyReviewed { kind, id, status: illegal.from });
        }
      };

      let outcome = self
        .store
        .compare_and_set_status(kind, id, current.status, next, caller.id)
        .await
        .map_err(Error::store)?;

      match outcome {
        CasOutcome::Applied(submission) => {
          info!(
            %kind, submission_id = %id, %verb, actor_id = %caller.id,
            status = %submission.status, "decision recorded"
          );
          if let Err(e) = self.aggregator.refresh().await {
            warn!(error = %e, %kind, submission_id = %id, "stats refresh failed after decision");
          }
          return Ok(Decision { submission, replayed: false });
        }
        CasOutcome::Conflict { current } => {
          debug!(%kind, submission_id = %id, attempt, %current, "lost compare-and-set race");
        }
        CasOutcome::Terminal { current } => {
          self.aggregator.invalidate();
          return Err(Error::AlreadyReviewed { kind, id, status: current });
        }
        CasOutcome::NotFound => return Err(Error::NotFound { kind, id }),
      }
    }

    warn!(%kind, submission_id = %id, %verb, "decision still contended after retry");
    Err(Error::Conflict { kind, id })
  }

  pub async fn get_stats(&self, caller: &Caller) -> Result<DashboardStats> {
    self.authorize(caller, "get_stats")?;
    self.aggregator.stats().await
  }

  /// A single submission, visible to administrators and to its owner.
  /// Anyone else gets [`Error::NotFound`] so ids are not disclosed.
  pub async fn get_submission(
    &self,
    kind: SubmissionKind,
    id: Uuid,
    caller: &Caller,
  ) -> Result<Submission> {
    let submission = self
      .store
      .get(kind, id)
      .await
      .map_err(Error::store)?
      .filter(|s| caller.is_admin() || s.owner_id == caller.id)
      .ok_or(Error::NotFound { kind, id })?;
    Ok(submission)
  }
}
