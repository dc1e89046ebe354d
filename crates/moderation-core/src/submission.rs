//! Submission types — the records moderators review.
//!
//! A submission is created `pending` by the intake layer and is decided at
//! most once. Everything except `status` and `status_history` is fixed at
//! creation; the descriptive payload is carried but never inspected.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The entity kind a submission describes. Fixed for the submission's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
  Organisation,
  Business,
  Artist,
}

impl SubmissionKind {
  /// Every kind, in dashboard tab order.
  pub const ALL: [SubmissionKind; 3] =
    [Self::Organisation, Self::Business, Self::Artist];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Organisation => "organisation",
      Self::Business => "business",
      Self::Artist => "artist",
    }
  }
}

impl fmt::Display for SubmissionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Accepts both the singular kind and the plural tab name
/// (`business` / `businesses`).
impl FromStr for SubmissionKind {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "organisation" | "organisations" => Ok(Self::Organisation),
      "business" | "businesses" => Ok(Self::Business),
      "artist" | "artists" => Ok(Self::Artist),
      other => Err(UnknownVariant::new("submission kind", other)),
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review status. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
  Pending,
  Approved,
  Rejected,
}

impl ReviewStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }

  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

impl fmt::Display for ReviewStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReviewStatus {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "approved" => Ok(Self::Approved),
      "rejected" => Ok(Self::Rejected),
      other => Err(UnknownVariant::new("review status", other)),
    }
  }
}

/// Returned when a stored or user-supplied discriminant is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value:?}")]
pub struct UnknownVariant {
  pub what:  &'static str,
  pub value: String,
}

impl UnknownVariant {
  pub(crate) fn new(what: &'static str, value: &str) -> Self {
    Self { what, value: value.to_owned() }
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationPayload {
  pub name:        String,
  pub description: String,
  pub city:        String,
  pub state:       String,
  #[serde(default)]
  pub categories:  Vec<String>,
  /// Free-text founding date as entered by the owner (e.g. "1998").
  pub established: Option<String>,
  pub image_url:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessPayload {
  pub name:        String,
  pub description: String,
  pub category:    String,
  pub city:        String,
  pub state:       String,
  pub phone:       Option<String>,
  pub website:     Option<String>,
  pub image_url:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistPayload {
  pub name:      String,
  pub genre:     String,
  pub bio:       String,
  pub city:      String,
  pub state:     String,
  pub image_url: Option<String>,
}

/// Kind-specific descriptive fields. The variant tag doubles as the
/// submission's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum SubmissionPayload {
  Organisation(OrganisationPayload),
  Business(BusinessPayload),
  Artist(ArtistPayload),
}

impl SubmissionPayload {
  pub fn kind(&self) -> SubmissionKind {
    match self {
      Self::Organisation(_) => SubmissionKind::Organisation,
      Self::Business(_) => SubmissionKind::Business,
      Self::Artist(_) => SubmissionKind::Artist,
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::Organisation(p) => &p.name,
      Self::Business(p) => &p.name,
      Self::Artist(p) => &p.name,
    }
  }

  /// The inner fields without the kind tag, for storage next to a separate
  /// kind column.
  pub fn to_data_json(&self) -> serde_json::Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Inverse of [`to_data_json`](Self::to_data_json).
  pub fn from_parts(
    kind: SubmissionKind,
    data: serde_json::Value,
  ) -> serde_json::Result<Self> {
    let wrapped = serde_json::json!({ "kind": kind.as_str(), "data": data });
    serde_json::from_value(wrapped)
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// One entry in a submission's append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
  pub status:      ReviewStatus,
  pub actor_id:    Uuid,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  pub id:             Uuid,
  pub kind:           SubmissionKind,
  pub owner_id:       Uuid,
  pub status:         ReviewStatus,
  pub payload:        SubmissionPayload,
  /// Store-assigned; defines queue order.
  pub created_at:     DateTime<Utc>,
  pub status_history: Vec<StatusChange>,
}

/// Input to [`crate::store::SubmissionStore::create`]. The kind comes from the
/// payload and the status is always `pending`.
#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub owner_id: Uuid,
  pub payload:  SubmissionPayload,
}

impl NewSubmission {
  pub fn new(owner_id: Uuid, payload: SubmissionPayload) -> Self {
    Self { owner_id, payload }
  }

  pub fn kind(&self) -> SubmissionKind { self.payload.kind() }
}
