//! HTTP server assembly for the moderation queue.
//!
//! Wires a [`SubmissionStore`] into a [`ModerationGateway`], nests the JSON
//! API under `/api`, and layers request tracing on top.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use moderation_core::{gateway::ModerationGateway, store::SubmissionStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MODERATION_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Upper bound on how stale cached dashboard stats may be.
  pub stats_max_age_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               5300,
      store_path:         PathBuf::from("moderation.sqlite3"),
      stats_max_age_secs: 5,
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MODERATION").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn stats_max_age(&self) -> Duration {
    Duration::from_secs(self.stats_max_age_secs)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway for `store` using the configured stats bound.
pub fn gateway<S>(store: S, config: &ServerConfig) -> Arc<ModerationGateway<S>>
where
  S: SubmissionStore,
{
  Arc::new(ModerationGateway::new(Arc::new(store), config.stats_max_age()))
}

/// Build the full application router.
pub fn router<S>(gateway: Arc<ModerationGateway<S>>) -> Router
where
  S: SubmissionStore + 'static,
{
  Router::new()
    .nest("/api", moderation_api::api_router(gateway))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ────────────────────────────────────────────────────────
