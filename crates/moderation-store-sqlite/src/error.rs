//! Error type for `moderation-store-sqlite`.

use moderation_core::submission::UnknownVariant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt count: {0}")]
  CorruptCount(i64),

  /// A stored kind or status column holds an unrecognised value.
  #[error("corrupt column: {0}")]
  UnknownVariant(#[from] UnknownVariant),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
