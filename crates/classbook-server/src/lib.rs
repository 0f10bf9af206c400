//! HTTP server assembly for Classbook.
//!
//! Mounts the JSON API under `/api` and the photo files under `/photos`,
//! wrapped in a request tracing layer. The binary in `main.rs` loads
//! [`ServerConfig`], opens the store and serves [`app`].

use std::path::{Path, PathBuf};

use axum::Router;
use classbook_api::{AppState, api_router, photo_router};
use classbook_core::store::SchoolStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLASSBOOK_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Directory uploaded student photos are written to.
  pub photo_dir:         PathBuf,
  /// Prefix for photo URLs, e.g. `https://school.example`. Empty yields
  /// host-relative `/photos/...` URLs.
  pub public_url:        String,
  /// How long a login token stays valid.
  pub session_ttl_hours: u32,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      store_path:        PathBuf::from("classbook.db"),
      photo_dir:         PathBuf::from("photos"),
      public_url:        String::new(),
      session_ttl_hours: 24,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_ttl(&self) -> chrono::Duration {
    chrono::Duration::hours(i64::from(self.session_ttl_hours))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application: API, photo files and per-request tracing.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: SchoolStore + 'static,
{
  let photos = state.photos.clone();
  Router::new()
    .nest("/api", api_router(state))
    .merge(photo_router(photos))
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
