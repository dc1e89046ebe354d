//! [`SqliteStore`] — the SQLite implementation of [`SubmissionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use moderation_core::{
  store::{CasOutcome, StatusCount, SubmissionStore},
  submission::{NewSubmission, ReviewStatus, Submission, SubmissionKind},
};

use crate::{
  Result,
  encode::{
    HISTORY_COLUMNS, RawChange, RawSubmission, SUBMISSION_COLUMNS, assemble,
    decode_count, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A submission store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
///
/// Every call, read or write, is queued on the one connection thread, so a
/// listing or stats scan waits behind any compare-and-set already queued.
/// WAL only keeps other processes' readers off the writer.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// What the compare-and-set transaction observed, before decoding.
enum RawCas {
  Applied(RawSubmission, Vec<RawChange>),
  Missed { current: Option<String> },
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Read one submission row and its history.
fn read_one(
  conn: &rusqlite::Connection,
  kind: &str,
  id: &str,
) -> rusqlite::Result<Option<(RawSubmission, Vec<RawChange>)>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions
         WHERE submission_id = ?1 AND kind = ?2"
      ),
      rusqlite::params![id, kind],
      RawSubmission::from_row,
    )
    .optional()?;

  let Some(raw) = raw else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(&format!(
    "SELECT {HISTORY_COLUMNS} FROM status_history
     WHERE submission_id = ?1
     ORDER BY recorded_at, rowid"
  ))?;
  let history = stmt
    .query_map(rusqlite::params![id], RawChange::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some((raw, history)))
}

// ─── SubmissionStore impl ────────────────────────────────────────────────────

impl SubmissionStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, input: NewSubmission) -> Result<Submission> {
    let submission = Submission {
      id:             Uuid::new_v4(),
      kind:           input.kind(),
      owner_id:       input.owner_id,
      status:         ReviewStatus::Pending,
      payload:        input.payload,
      created_at:     Utc::now(),
      status_history: Vec::new(),
    };

    let id_str      = encode_uuid(submission.id);
    let kind_str    = submission.kind.as_str();
    let owner_str   = encode_uuid(submission.owner_id);
    let status_str  = submission.status.as_str();
    let payload_str = submission.payload.to_data_json()?.to_string();
    let at_str      = encode_dt(submission.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO submissions
             (submission_id, kind, owner_id, status, payload_json, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            kind_str,
            owner_str,
            status_str,
            payload_str,
            at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(submission)
  }

  async fn get(
    &self,
    kind: SubmissionKind,
    id: Uuid,
  ) -> Result<Option<Submission>> {
    let id_str   = encode_uuid(id);
    let kind_str = kind.as_str();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let found = read_one(&tx, kind_str, &id_str)?;
        tx.commit()?;
        Ok(found)
      })
      .await?;

    found
      .map(|(raw, history)| raw.into_submission(history))
      .transpose()
  }

  async fn list_by_status(
    &self,
    kind: SubmissionKind,
    status: ReviewStatus,
  ) -> Result<Vec<Submission>> {
    let kind_str   = kind.as_str();
    let status_str = status.as_str();

    let (raws, history) = self
      .conn
      .call(move |conn| {
        // One read transaction so rows and their history agree.
        let tx = conn.transaction()?;

        let raws = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE kind = ?1 AND status = ?2
             ORDER BY created_at, seq"
          ))?;
          stmt
            .query_map(rusqlite::params![kind_str, status_str], RawSubmission::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let history = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM status_history
             WHERE submission_id IN (
               SELECT submission_id FROM submissions WHERE kind = ?1 AND status = ?2
             )
             ORDER BY recorded_at, rowid"
          ))?;
          stmt
            .query_map(rusqlite::params![kind_str, status_str], RawChange::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok((raws, history))
      })
      .await?;

    assemble(raws, history)
  }

  async fn compare_and_set_status(
    &self,
    kind: SubmissionKind,
    id: Uuid,
    expected: ReviewStatus,
    new: ReviewStatus,
    actor_id: Uuid,
  ) -> Result<CasOutcome> {
    let id_str       = encode_uuid(id);
    let kind_str     = kind.as_str();
    let expected_str = expected.as_str();
    let new_str      = new.as_str();
    let actor_str    = encode_uuid(actor_id);
    let history_str  = encode_uuid(Uuid::new_v4());
    let at_str       = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front so the conditional update
        // and the history append commit together or not at all.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
          "UPDATE submissions SET status = ?1
           WHERE submission_id = ?2 AND kind = ?3 AND status = ?4
             AND status = 'pending'",
          rusqlite::params![new_str, id_str, kind_str, expected_str],
        )?;

        if changed == 0 {
          let current: Option<String> = tx
            .query_row(
              "SELECT status FROM submissions WHERE submission_id = ?1 AND kind = ?2",
              rusqlite::params![id_str, kind_str],
              |r| r.get(0),
            )
            .optional()?;
          // Dropping the transaction rolls it back; nothing was written.
          return Ok(RawCas::Missed { current });
        }

        tx.execute(
          "INSERT INTO status_history
             (history_id, submission_id, status, actor_id, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![history_str, id_str, new_str, actor_str, at_str],
        )?;

        let applied = read_one(&tx, kind_str, &id_str)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;

        Ok(RawCas::Applied(applied.0, applied.1))
      })
      .await?;

    Ok(match raw {
      RawCas::Applied(raw, history) => {
        CasOutcome::Applied(raw.into_submission(history)?)
      }
      RawCas::Missed { current: Some(status) } => {
        // A matching status that still missed the update is terminal.
        let current: ReviewStatus = status.parse()?;
        if current == expected {
          CasOutcome::Terminal { current }
        } else {
          CasOutcome::Conflict { current }
        }
      }
      RawCas::Missed { current: None } => CasOutcome::NotFound,
    })
  }

  async fn status_counts(&self) -> Result<Vec<StatusCount>> {
    let rows: Vec<(String, String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT kind, status, COUNT(*) FROM submissions GROUP BY kind, status",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(kind, status, count)| {
        Ok(StatusCount {
          kind:   kind.parse()?,
          status: status.parse()?,
          count:  decode_count(count)?,
        })
      })
      .collect()
  }
}
