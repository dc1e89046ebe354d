//! Handlers for `/admin` endpoints. Every route requires the admin role; the
//! gateway enforces it.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/stats` | Dashboard counts |
//! | `GET`  | `/admin/pending` | All three queues at once |
//! | `GET`  | `/admin/pending/:kind` | One queue, oldest first |
//! | `POST` | `/admin/:verb/:kind/:id` | `verb` is `approve` or `reject` |

use std::{str::FromStr, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
};
use moderation_core::{
  gateway::{Decision, ModerationGateway},
  stats::DashboardStats,
  store::SubmissionStore,
  submission::{Submission, SubmissionKind},
  transition::Verb,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{caller::TrustedCaller, error::ApiError};

/// Parse a path segment, rejecting it as a 400 with a JSON body.
fn segment<T>(raw: &str) -> Result<T, ApiError>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw.parse().map_err(|e: T::Err| ApiError::BadRequest(e.to_string()))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /admin/stats`
pub async fn stats<S>(
  State(gateway): State<Arc<ModerationGateway<S>>>,
  TrustedCaller(caller): TrustedCaller,
) -> Result<Json<DashboardStats>, ApiError>
where
  S: SubmissionStore,
{
  Ok(Json(gateway.get_stats(&caller).await?))
}

// ─── Pending queues ───────────────────────────────────────────────────────────

/// The three dashboard tabs.
#[derive(Debug, Serialize)]
pub struct PendingQueues {
  pub organisations: Vec<Submission>,
  pub businesses:    Vec<Submission>,
  pub artists:       Vec<Submission>,
}

/// `GET /admin/pending`
pub async fn pending_all<S>(
  State(gateway): State<Arc<ModerationGateway<S>>>,
  TrustedCaller(caller): TrustedCaller,
) -> Result<Json<PendingQueues>, ApiError>
where
  S: SubmissionStore,
{
  let (organisations, businesses, artists) = tokio::try_join!(
    gateway.list_pending(SubmissionKind::Organisation, &caller),
    gateway.list_pending(SubmissionKind::Business, &caller),
    gateway.list_pending(SubmissionKind::Artist, &caller),
  )?;
  Ok(Json(PendingQueues { organisations, businesses, artists }))
}

/// `GET /admin/pending/:kind` — `kind` may be singular or plural.
pub async fn pending<S>(
  State(gateway): State<Arc<ModerationGateway<S>>>,
  TrustedCaller(caller): TrustedCaller,
  Path(kind): Path<String>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: SubmissionStore,
{
  let kind: SubmissionKind = segment(&kind)?;
  Ok(Json(gateway.list_pending(kind, &caller).await?))
}

// ─── Decide ───────────────────────────────────────────────────────────────────

/// `POST /admin/:verb/:kind/:id`
///
/// Returns 200 with the [`Decision`] both for a fresh write and for a replay
/// of the decision already recorded.
pub async fn decide<S>(
  State(gateway): State<Arc<ModerationGateway<S>>>,
  TrustedCaller(caller): TrustedCaller,
  Path((verb, kind, id)): Path<(String, String, String)>,
) -> Result<Json<Decision>, ApiError>
where
  S: SubmissionStore,
{
  let verb: Verb = segment(&verb)?;
  let kind: SubmissionKind = segment(&kind)?;
  let id: Uuid = segment(&id)?;

  Ok(Json(gateway.decide(kind, id, verb, &caller).await?))
}
