//! Error types for `docket-core`.

use thiserror::Error;

use crate::status::AssignmentStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed input, rejected before any write.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("inward entry not found: {0}")]
  InwardNotFound(i64),

  #[error("outward entry not found: {0}")]
  OutwardNotFound(i64),

  /// A status value outside the four-state enum.
  #[error("invalid status: {0:?}")]
  InvalidStatus(String),

  #[error("cannot move an entry from {from} to {to}")]
  IllegalTransition {
    from: AssignmentStatus,
    to:   AssignmentStatus,
  },

  #[error("unknown team: {0:?}")]
  UnknownTeam(String),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so that callers can recover the domain
/// error (if any) without knowing the concrete backend.
pub trait DomainError: std::error::Error {
  /// The wrapped domain error, or `None` for infrastructure failures.
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
