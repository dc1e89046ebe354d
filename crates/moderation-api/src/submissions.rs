//! Handlers for `/submissions` endpoints — the intake side of the queue.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/submissions` | Body: `{"kind":"artist","data":{...}}`; returns 201 |
//! | `GET`  | `/submissions/:kind/:id` | Admin or owner; 404 otherwise |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use moderation_core::{
  gateway::ModerationGateway,
  store::SubmissionStore,
  submission::{NewSubmission, Submission, SubmissionKind, SubmissionPayload},
};
use tracing::info;
use uuid::Uuid;

use crate::{caller::TrustedCaller, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /submissions` — the caller becomes the owner.
pub async fn create<S>(
  State(gateway): State<Arc<ModerationGateway<S>>>,
  TrustedCaller(caller): TrustedCaller,
  body: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubmissionStore,
{
  let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let submission = gateway
    .store()
    .create(NewSubmission::new(caller.id, payload))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  // New pending work changes the dashboard counts.
  gateway.aggregator().invalidate();

  info!(
    kind = %submission.kind, submission_id = %submission.id,
    owner_id = %submission.owner_id, submission_name = submission.payload.name(),
    "submission received"
  );
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /submissions/:kind/:id`
pub async fn get_one<S>(
  State(gateway): State<Arc<ModerationGateway<S>>>,
  TrustedCaller(caller): TrustedCaller,
  Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Submission>, ApiError>
where
  S: SubmissionStore,
{
  let kind: SubmissionKind =
    kind.parse().map_err(|e| ApiError::BadRequest(format!("{e}")))?;
  let id: Uuid = id
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid id: {id}")))?;

  Ok(Json(gateway.get_submission(kind, id, &caller).await?))
}
