//! JSON REST API for the moderation queue.
//!
//! Exposes an axum [`Router`] backed by a [`ModerationGateway`] over any
//! [`SubmissionStore`]. Authentication happens upstream: the resolved caller
//! arrives in trusted request headers (see [`caller`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", moderation_api::api_router(gateway.clone()))
//! ```

pub mod admin;
pub mod caller;
pub mod error;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use moderation_core::{gateway::ModerationGateway, store::SubmissionStore};

pub use caller::TrustedCaller;
pub use error::ApiError;

/// Build a fully-materialised API router for `gateway`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(gateway: Arc<ModerationGateway<S>>) -> Router<()>
where
  S: SubmissionStore + 'static,
{
  Router::new()
    // Admin dashboard
    .route("/admin/stats", get(admin::stats::<S>))
    .route("/admin/pending", get(admin::pending_all::<S>))
    .route("/admin/pending/{kind}", get(admin::pending::<S>))
    .route("/admin/{verb}/{kind}/{id}", post(admin::decide::<S>))
    // Intake
    .route("/submissions", post(submissions::create::<S>))
    .route("/submissions/{kind}/{id}", get(submissions::get_one::<S>))
    .with_state(gateway)
}

#[cfg(test)]
mod tests;
