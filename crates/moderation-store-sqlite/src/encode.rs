//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that text
//! ordering matches time ordering. UUIDs are hyphenated lowercase strings.
//! Kinds and statuses use their lowercase names.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use moderation_core::submission::{
  StatusChange, Submission, SubmissionKind, SubmissionPayload,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn decode_count(count: i64) -> Result<u64> {
  u64::try_from(count).map_err(|_| Error::CorruptCount(count))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSubmission::from_row`].
pub const SUBMISSION_COLUMNS: &str =
  "submission_id, kind, owner_id, status, payload_json, created_at";

/// Column list matching [`RawChange::from_row`].
pub const HISTORY_COLUMNS: &str = "submission_id, status, actor_id, recorded_at";

/// Raw strings read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id: String,
  pub kind:          String,
  pub owner_id:      String,
  pub status:        String,
  pub payload_json:  String,
  pub created_at:    String,
}

impl RawSubmission {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id: row.get(0)?,
      kind:          row.get(1)?,
      owner_id:      row.get(2)?,
      status:        row.get(3)?,
      payload_json:  row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_submission(self, history: Vec<RawChange>) -> Result<Submission> {
    let kind: SubmissionKind = self.kind.parse()?;
    let data: serde_json::Value = serde_json::from_str(&self.payload_json)?;

    Ok(Submission {
      id: decode_uuid(&self.submission_id)?,
      kind,
      owner_id: decode_uuid(&self.owner_id)?,
      status: self.status.parse()?,
      payload: SubmissionPayload::from_parts(kind, data)?,
      created_at: decode_dt(&self.created_at)?,
      status_history: history
        .into_iter()
        .map(RawChange::into_change)
        .collect::<Result<_>>()?,
    })
  }
}

/// Raw strings read directly from a `status_history` row.
pub struct RawChange {
  pub submission_id: String,
  pub status:        String,
  pub actor_id:      String,
  pub recorded_at:   String,
}

impl RawChange {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id: row.get(0)?,
      status:        row.get(1)?,
      actor_id:      row.get(2)?,
      recorded_at:   row.get(3)?,
    })
  }

  pub fn into_change(self) -> Result<StatusChange> {
    Ok(StatusChange {
      status:      self.status.parse()?,
      actor_id:    decode_uuid(&self.actor_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Attach history rows (in any order of submissions, chronological within
/// each) to their submissions, preserving the submissions' order.
pub fn assemble(
  raws: Vec<RawSubmission>,
  history: Vec<RawChange>,
) -> Result<Vec<Submission>> {
  let mut by_id: HashMap<String, Vec<RawChange>> = HashMap::new();
  for change in history {
    by_id.entry(change.submission_id.clone()).or_default().push(change);
  }

  raws
    .into_iter()
    .map(|raw| {
      let changes = by_id.remove(&raw.submission_id).unwrap_or_default();
      raw.into_submission(changes)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let early = DateTime::parse_from_rfc3339("2026-03-01T09:00:00.5Z")
      .unwrap()
      .with_timezone(&Utc);
    let late = DateTime::parse_from_rfc3339("2026-03-01T09:00:00.25Z")
      .unwrap()
      .with_timezone(&Utc)
      + chrono::Duration::seconds(1);

    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(early)).unwrap(), early);
  }

  #[test]
  fn negative_count_is_corrupt() {
    assert_eq!(decode_count(3).unwrap(), 3);
    assert!(matches!(decode_count(-1), Err(Error::CorruptCount(-1))));
  }
}
