//! Caller extraction from trusted upstream headers.
//!
//! The auth collaborator in front of this API resolves the session and
//! injects the caller's identity as two headers. Nothing here verifies a
//! credential.

use axum::{extract::FromRequestParts, http::request::Parts};
use moderation_core::caller::{Caller, Role};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the caller's user id (UUID).
pub const CALLER_ID_HEADER: &str = "x-caller-id";
/// Header carrying the caller's role (`admin` or `user`).
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

/// Present in a handler means both caller headers were present and valid.
#[derive(Debug, Clone, Copy)]
pub struct TrustedCaller(pub Caller);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
  parts
    .headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {name} header")))
}

impl<S> FromRequestParts<S> for TrustedCaller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let id: Uuid = header(parts, CALLER_ID_HEADER)?
      .parse()
      .map_err(|_| ApiError::Unauthorized(format!("malformed {CALLER_ID_HEADER}")))?;
    let role: Role = header(parts, CALLER_ROLE_HEADER)?
      .parse()
      .map_err(|e| ApiError::Unauthorized(format!("{e}")))?;
    Ok(TrustedCaller(Caller { id, role }))
  }
}
