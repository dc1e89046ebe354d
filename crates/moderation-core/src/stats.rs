//! Dashboard counters and the aggregator that derives them.
//!
//! [`DashboardStats`] is never stored. It is a fold over
//! [`SubmissionStore::status_counts`]; the [`Aggregator`] only memoises the
//! latest fold.

use std::{
  sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
  },
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::{StatusCount, SubmissionStore},
  submission::{ReviewStatus, SubmissionKind},
};

// ─── DashboardStats ──────────────────────────────────────────────────────────

/// Totals per kind (all statuses) and pending counts per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub organisations:         u64,
  pub businesses:            u64,
  pub artists:               u64,
  pub pending_organisations: u64,
  pub pending_businesses:    u64,
  pub pending_artists:       u64,
  pub total_pending:         u64,
  /// When the underlying counts were read.
  pub as_of:                 DateTime<Utc>,
}

impl DashboardStats {
  pub fn fold(
    counts: impl IntoIterator<Item = StatusCount>,
    as_of: DateTime<Utc>,
  ) -> Self {
    let mut stats = Self {
      organisations: 0,
      businesses: 0,
      artists: 0,
      pending_organisations: 0,
      pending_businesses: 0,
      pending_artists: 0,
      total_pending: 0,
      as_of,
    };

    for StatusCount { kind, status, count } in counts {
      let (total, pending) = match kind {
        SubmissionKind::Organisation => {
          (&mut stats.organisations, &mut stats.pending_organisations)
        }
        SubmissionKind::Business => {
          (&mut stats.businesses, &mut stats.pending_businesses)
        }
        SubmissionKind::Artist => (&mut stats.artists, &mut stats.pending_artists),
      };
      *total += count;
      if status == ReviewStatus::Pending {
        *pending += count;
        stats.total_pending += count;
      }
    }

    stats
  }

  pub fn total(&self, kind: SubmissionKind) -> u64 {
    match kind {
      SubmissionKind::Organisation => self.organisations,
      SubmissionKind::Business => self.businesses,
      SubmissionKind::Artist => self.artists,
    }
  }

  pub fn pending(&self, kind: SubmissionKind) -> u64 {
    match kind {
      SubmissionKind::Organisation => self.pending_organisations,
      SubmissionKind::Business => self.pending_businesses,
      SubmissionKind::Artist => self.pending_artists,
    }
  }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

struct Snapshot {
  generation: u64,
  taken_at:   Instant,
  stats:      DashboardStats,
}

/// Computes [`DashboardStats`] from a store and memoises the result.
///
/// Every [`invalidate`](Self::invalidate) bumps a generation counter. A fold
/// is only installed if the generation did not move while it ran, and a
/// snapshot is only served while its generation is current and it is younger
/// than `max_age`.
pub struct Aggregator<S> {
  store:      Arc<S>,
  max_age:    Duration,
  generation: AtomicU64,
  snapshot:   RwLock<Option<Snapshot>>,
}

impl<S: SubmissionStore> Aggregator<S> {
  pub fn new(store: Arc<S>, max_age: Duration) -> Self {
    Self {
      store,
      max_age,
      generation: AtomicU64::new(0),
      snapshot: RwLock::new(None),
    }
  }

  /// Fold a fresh scan of the store, bypassing the memo.
  pub async fn compute_stats(&self) -> Result<DashboardStats> {
    let as_of = Utc::now();
    let counts = self.store.status_counts().await.map_err(Error::store)?;
    Ok(DashboardStats::fold(counts, as_of))
  }

  /// The memoised stats if still valid, otherwise a fresh fold.
  pub async fn stats(&self) -> Result<DashboardStats> {
    if let Some(stats) = self.cached() {
      return Ok(stats);
    }
    self.recompute().await
  }

  /// Mark the memo stale. Cheap; never touches the store.
  pub fn invalidate(&self) { self.generation.fetch_add(1, Ordering::AcqRel); }

  /// Invalidate, then fold and install a fresh snapshot.
  pub async fn refresh(&self) -> Result<DashboardStats> {
    self.invalidate();
    self.recompute().await
  }

  fn cached(&self) -> Option<DashboardStats> {
    let current = self.generation.load(Ordering::Acquire);
    let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
    guard
      .as_ref()
      .filter(|s| s.generation == current && s.taken_at.elapsed() <= self.max_age)
      .map(|s| s.stats.clone())
  }

  async fn recompute(&self) -> Result<DashboardStats> {
    let generation = self.generation.load(Ordering::Acquire);
    let taken_at = Instant::now();
    let stats = self.compute_stats().await?;

    let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
    if self.generation.load(Ordering::Acquire) == generation {
      *guard = Some(Snapshot { generation, taken_at, stats: stats.clone() });
    }

    Ok(stats)
  }
}
