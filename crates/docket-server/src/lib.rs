//! HTTP server for the Docket register.
//!
//! Wires the JSON API of [`docket_api`] under `/api`, adds a health probe and
//! request tracing, and defines the server's configuration.

pub mod mail;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Json, Router,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
  routing::get,
};
use chrono::Utc;
use config::{Config, ConfigError, Environment, File};
use docket_api::AppState;
use docket_core::{notify::Notifier, store::EntryStore, team::TeamDirectory};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DOCKET_*` environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Team → leader address; teams not listed keep their default.
  pub teams:      TeamDirectory,
  pub email:      EmailConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_owned(),
      port:       5000,
      store_path: PathBuf::from("docket.sqlite3"),
      teams:      TeamDirectory::default(),
      email:      EmailConfig::default(),
    }
  }
}

/// Settings for the Resend e-mail API. Without an `api_key`, notifications
/// are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
  pub api_key:  Option<String>,
  pub from:     String,
  pub endpoint: String,
}

impl Default for EmailConfig {
  fn default() -> Self {
    Self {
      api_key:  None,
      from:     "Inward/Outward System <noreply@resend.dev>".to_owned(),
      endpoint: "https://api.resend.com/emails".to_owned(),
    }
  }
}

impl ServerConfig {
  /// Layer `DOCKET_*` environment variables (nested keys separated by `__`,
  /// e.g. `DOCKET_EMAIL__API_KEY`) over the optional TOML file at `path`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("DOCKET")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, N>(state: AppState<S, N>) -> Router
where
  S: EntryStore + 'static,
  N: Notifier + 'static,
{
  let store = Arc::clone(&state.store);
  let api = docket_api::api_router(state).route("/health", get(health::<S>).with_state(store));

  Router::new()
    .route("/", get(index))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn index() -> impl IntoResponse {
  Json(json!({
    "success": true,
    "message": "Inward/Outward API",
    "version": env!("CARGO_PKG_VERSION"),
    "endpoints": ["/api/inward", "/api/outward", "/api/dashboard", "/api/health"],
  }))
}

/// `GET /api/health`: probes the store with a cheap read.
async fn health<S: EntryStore>(State(store): State<Arc<S>>) -> impl IntoResponse {
  let timestamp = Utc::now();
  match store.dashboard_stats().await {
    Ok(_) => (
      StatusCode::OK,
      Json(json!({
        "success": true,
        "status": "ok",
        "database": "connected",
        "timestamp": timestamp,
      })),
    ),
    Err(e) => {
      tracing::error!(error = %e, "health check failed");
      (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
          "success": false,
          "status": "unavailable",
          "database": "unreachable",
          "message": e.to_string(),
          "timestamp": timestamp,
        })),
      )
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
