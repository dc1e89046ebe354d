//! [`MemoryStore`] — an in-process [`SubmissionStore`].
//!
//! Each submission sits behind its own mutex; the index is only write-locked
//! to insert new submissions. Compare-and-set therefore contends only with
//! other writers to the same submission.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
  },
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  store::{CasOutcome, StatusCount, SubmissionStore},
  submission::{
    NewSubmission, ReviewStatus, StatusChange, Submission, SubmissionKind,
  },
};

struct Entry {
  /// Insertion sequence; breaks `created_at` ties.
  seq:        u64,
  submission: Mutex<Submission>,
}

impl Entry {
  fn lock(&self) -> MutexGuard<'_, Submission> {
    self.submission.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn snapshot(&self) -> Submission { self.lock().clone() }
}

type Index = HashMap<(SubmissionKind, Uuid), Arc<Entry>>;

/// A submission store held entirely in memory. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  index: Arc<RwLock<Index>>,
  seq:   Arc<AtomicU64>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn entry(&self, kind: SubmissionKind, id: Uuid) -> Option<Arc<Entry>> {
    self
      .index
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&(kind, id))
      .cloned()
  }

  fn entries_of(&self, kind: SubmissionKind) -> Vec<Arc<Entry>> {
    self
      .index
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .filter(|((k, _), _)| *k == kind)
      .map(|(_, entry)| entry.clone())
      .collect()
  }
}

impl SubmissionStore for MemoryStore {
  type Error = Infallible;

  async fn create(&self, input: NewSubmission) -> Result<Submission, Infallible> {
    let submission = Submission {
      id:             Uuid::new_v4(),
      kind:           input.kind(),
      owner_id:       input.owner_id,
      status:         ReviewStatus::Pending,
      payload:        input.payload,
      created_at:     Utc::now(),
      status_history: Vec::new(),
    };

    let entry = Arc::new(Entry {
      seq:        self.seq.fetch_add(1, Ordering::Relaxed),
      submission: Mutex::new(submission.clone()),
    });
    self
      .index
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert((submission.kind, submission.id), entry);

    Ok(submission)
  }

  async fn get(
    &self,
    kind: SubmissionKind,
    id: Uuid,
  ) -> Result<Option<Submission>, Infallible> {
    Ok(self.entry(kind, id).map(|entry| entry.snapshot()))
  }

  async fn list_by_status(
    &self,
    kind: SubmissionKind,
    status: ReviewStatus,
  ) -> Result<Vec<Submission>, Infallible> {
    let mut matching: Vec<(u64, Submission)> = self
      .entries_of(kind)
      .into_iter()
      .filter_map(|entry| {
        let submission = entry.lock();
        (submission.status == status).then(|| (entry.seq, submission.clone()))
      })
      .collect();

    matching.sort_by(|(seq_a, a), (seq_b, b)| {
      a.created_at.cmp(&b.created_at).then(seq_a.cmp(seq_b))
    });

    Ok(matching.into_iter().map(|(_, s)| s).collect())
  }

  async fn compare_and_set_status(
    &self,
    kind: SubmissionKind,
    id: Uuid,
    expected: ReviewStatus,
    new: ReviewStatus,
    actor_id: Uuid,
  ) -> Result<CasOutcome, Infallible> {
    let Some(entry) = self.entry(kind, id) else {
      return Ok(CasOutcome::NotFound);
    };

    let mut submission = entry.lock();
    if submission.status != expected {
      return Ok(CasOutcome::Conflict { current: submission.status });
    }
    if expected.is_terminal() {
      return Ok(CasOutcome::Terminal { current: submission.status });
    }

    submission.status = new;
    submission.status_history.push(StatusChange {
      status: new,
      actor_id,
      recorded_at: Utc::now(),
    });

    Ok(CasOutcome::Applied(submission.clone()))
  }

  async fn status_counts(&self) -> Result<Vec<StatusCount>, Infallible> {
    // Holding the index read lock keeps the population fixed; each entry is
    // counted exactly once in whatever status it holds when visited.
    let index = self.index.read().unwrap_or_else(PoisonError::into_inner);

    let mut counts: HashMap<(SubmissionKind, ReviewStatus), u64> = HashMap::new();
    for ((kind, _), entry) in index.iter() {
      let status = entry.lock().status;
      *counts.entry((*kind, status)).or_default() += 1;
    }

    Ok(
      counts
        .into_iter()
        .map(|((kind, status), count)| StatusCount { kind, status, count })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::submission::{BusinessPayload, SubmissionPayload};

  fn business(name: &str) -> NewSubmission {
    NewSubmission::new(
      Uuid::new_v4(),
      SubmissionPayload::Business(BusinessPayload {
        name:        name.into(),
        description: "Corner bakery".into(),
        category:    "food".into(),
        city:        "Ballarat".into(),
        state:       "VIC".into(),
        phone:       None,
        website:     None,
        image_url:   None,
      }),
    )
  }

  #[tokio::test]
  async fn create_starts_pending_with_empty_history() {
    let store = MemoryStore::new();
    let s = store.create(business("Crumbs")).await.unwrap();
    assert_eq!(s.kind, SubmissionKind::Business);
    assert_eq!(s.status, ReviewStatus::Pending);
    assert!(s.status_history.is_empty());
  }

  #[tokio::test]
  async fn get_is_scoped_by_kind() {
    let store = MemoryStore::new();
    let s = store.create(business("Crumbs")).await.unwrap();

    assert!(store.get(SubmissionKind::Business, s.id).await.unwrap().is_some());
    assert!(store.get(SubmissionKind::Artist, s.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn list_keeps_insertion_order() {
    let store = MemoryStore::new();
    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d"] {
      ids.push(store.create(business(name)).await.unwrap().id);
    }

    let listed: Vec<Uuid> = store
      .list_by_status(SubmissionKind::Business, ReviewStatus::Pending)
      .await
      .unwrap()
      .into_iter()
      .map(|s| s.id)
      .collect();
    assert_eq!(listed, ids);
  }

  #[tokio::test]
  async fn cas_conflicts_on_unexpected_status() {
    let store = MemoryStore::new();
    let s = store.create(business("Crumbs")).await.unwrap();
    let actor = Uuid::new_v4();

    let first = store
      .compare_and_set_status(
        s.kind,
        s.id,
        ReviewStatus::Pending,
        ReviewStatus::Approved,
        actor,
      )
      .await
      .unwrap();
    let applied = match first {
      CasOutcome::Applied(s) => s,
      other => panic!("expected Applied, got {other:?}"),
    };
    assert_eq!(applied.status_history.len(), 1);
    assert_eq!(applied.status_history[0].actor_id, actor);

    let second = store
      .compare_and_set_status(
        s.kind,
        s.id,
        ReviewStatus::Pending,
        ReviewStatus::Rejected,
        actor,
      )
      .await
      .unwrap();
    assert_eq!(second, CasOutcome::Conflict { current: ReviewStatus::Approved });

    let stored = store.get(s.kind, s.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReviewStatus::Approved);
    assert_eq!(stored.status_history.len(), 1);
  }

  #[tokio::test]
  async fn cas_never_leaves_a_terminal_status() {
    let store = MemoryStore::new();
    let s = store.create(business("Settled")).await.unwrap();
    store
      .compare_and_set_status(
        s.kind,
        s.id,
        ReviewStatus::Pending,
        ReviewStatus::Approved,
        Uuid::new_v4(),
      )
      .await
      .unwrap();

    let outcome = store
      .compare_and_set_status(
        s.kind,
        s.id,
        ReviewStatus::Approved,
        ReviewStatus::Pending,
        Uuid::new_v4(),
      )
      .await
      .unwrap();
    assert_eq!(outcome, CasOutcome::Terminal { current: ReviewStatus::Approved });

    let stored = store.get(s.kind, s.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReviewStatus::Approved);
    assert_eq!(stored.status_history.len(), 1);
  }

  #[tokio::test]
  async fn cas_on_missing_submission() {
    let store = MemoryStore::new();
    let outcome = store
      .compare_and_set_status(
        SubmissionKind::Artist,
        Uuid::new_v4(),
        ReviewStatus::Pending,
        ReviewStatus::Approved,
        Uuid::new_v4(),
      )
      .await
      .unwrap();
    assert_eq!(outcome, CasOutcome::NotFound);
  }
}
