//! JSON REST API for the Docket register.
//!
//! Exposes an axum [`Router`] backed by any [`EntryStore`] and [`Notifier`].
//! Every response body carries a `success` flag; failures add a `message`.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", docket_api::api_router(state.clone()))
//! ```

pub mod dashboard;
pub mod error;
pub mod inward;
pub mod notify;
pub mod outward;
pub mod params;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use docket_core::{notify::Notifier, store::EntryStore};

pub use error::ApiError;

/// Shared handler state: the register and the assignment notifier.
pub struct AppState<S, N> {
  pub store:    Arc<S>,
  pub notifier: Arc<N>,
}

impl<S, N> AppState<S, N> {
  pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self { Self { store, notifier } }
}

impl<S, N> Clone for AppState<S, N> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(state: AppState<S, N>) -> Router<()>
where
  S: EntryStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Inward
    .route("/inward", get(inward::list::<S, N>).post(inward::create::<S, N>))
    .route("/inward/{id}", get(inward::get_one::<S, N>))
    .route("/inward/{id}/assign", put(inward::assign::<S, N>))
    .route("/inward/{id}/status", put(inward::update_status::<S, N>))
    // Outward
    .route("/outward", get(outward::list::<S, N>).post(outward::create::<S, N>))
    .route("/outward/expenditure", get(outward::expenditure::<S, N>))
    .route("/outward/{id}", get(outward::get_one::<S, N>))
    // Dashboard
    .route("/dashboard/stats", get(dashboard::stats::<S, N>))
    .route("/dashboard/team/{team}", get(dashboard::team::<S, N>))
    .route("/dashboard/teams", get(dashboard::teams::<S, N>))
    .with_state(state)
}
