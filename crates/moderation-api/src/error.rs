//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use moderation_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Caller headers missing or malformed.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),

  /// A store failure outside the gateway (intake writes).
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Machine-readable code placed in the `error` field of the body.
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::Unauthorized(_) => "unauthorized",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Core(CoreError::Forbidden) => "forbidden",
      ApiError::Core(CoreError::NotFound { .. }) => "not_found",
      ApiError::Core(CoreError::AlreadyReviewed { .. }) => "already_reviewed",
      ApiError::Core(CoreError::Conflict { .. }) => "conflict",
      ApiError::Core(CoreError::Store(_)) | ApiError::Store(_) => "store",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(CoreError::Forbidden) => StatusCode::FORBIDDEN,
      ApiError::Core(CoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
      ApiError::Core(CoreError::AlreadyReviewed { .. }) => StatusCode::CONFLICT,
      ApiError::Core(CoreError::Conflict { .. }) => {
        StatusCode::SERVICE_UNAVAILABLE
      }
      ApiError::Core(CoreError::Store(_)) | ApiError::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let body = Json(json!({ "error": self.code(), "message": self.to_string() }));
    let mut res = (status, body).into_response();
    if matches!(self, ApiError::Core(CoreError::Conflict { .. })) {
      res
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }
    res
  }
}
