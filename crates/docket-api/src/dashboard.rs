//! Handlers for `/dashboard` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dashboard/stats` | Register-wide counts |
//! | `GET`  | `/dashboard/team/{team}` | `PG-PRO` (or `PG%2FPRO`) for `PG/PRO`; 400 on unknown team |
//! | `GET`  | `/dashboard/teams` | One row per team |

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
  response::IntoResponse,
};
use docket_core::{notify::Notifier, store::EntryStore, team::Team};
use serde_json::json;

use crate::{AppState, error::ApiError};

/// `GET /dashboard/stats`
pub async fn stats<S, N>(State(state): State<AppState<S, N>>) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let stats = state
    .store
    .dashboard_stats()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "stats": stats })))
}

/// `GET /dashboard/team/{team}`
pub async fn team<S, N>(
  State(state): State<AppState<S, N>>,
  team: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Path(team) = team?;
  let team = Team::parse(&team)?;
  let stats = state
    .store
    .team_stats(team)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "team": team, "stats": stats })))
}

/// `GET /dashboard/teams`
pub async fn teams<S, N>(State(state): State<AppState<S, N>>) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let summary = state
    .store
    .teams_summary()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "teamStats": summary })))
}
