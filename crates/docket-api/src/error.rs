//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use docket_core::DomainError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request is well-formed but the entry's state forbids it.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error it wraps, if any.
  pub fn from_store<E>(err: E) -> Self
  where
    E: DomainError + Send + Sync + 'static,
  {
    match err.domain() {
      Some(domain) => Self::from_domain(domain),
      None => Self::Store(Box::new(err)),
    }
  }

  fn from_domain(err: &docket_core::Error) -> Self {
    use docket_core::Error as E;

    let message = err.to_string();
    match err {
      E::Validation(_) | E::InvalidStatus(_) | E::UnknownTeam(_) => Self::BadRequest(message),
      E::InwardNotFound(_) | E::OutwardNotFound(_) => Self::NotFound(message),
      E::IllegalTransition { .. } => Self::Conflict(message),
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<docket_core::Error> for ApiError {
  fn from(err: docket_core::Error) -> Self { Self::from_domain(&err) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Conflict(m) => m.clone(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        e.to_string()
      }
    };
    (status, Json(json!({ "success": false, "message": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use docket_core::status::AssignmentStatus;

  use super::*;

  #[test]
  fn domain_errors_map_to_status_codes() {
    let cases = [
      (docket_core::Error::validation("subject is required"), StatusCode::BAD_REQUEST),
      (docket_core::Error::InvalidStatus("Archived".into()), StatusCode::BAD_REQUEST),
      (docket_core::Error::UnknownTeam("MBA".into()), StatusCode::BAD_REQUEST),
      (docket_core::Error::InwardNotFound(3), StatusCode::NOT_FOUND),
      (docket_core::Error::OutwardNotFound(3), StatusCode::NOT_FOUND),
      (
        docket_core::Error::IllegalTransition {
          from: AssignmentStatus::Completed,
          to:   AssignmentStatus::Pending,
        },
        StatusCode::CONFLICT,
      ),
    ];
    for (err, expected) in cases {
      assert_eq!(ApiError::from(err).status(), expected);
    }
  }
}
