//! Assignment notifications.
//!
//! A [`Notifier`] is called after an assignment has been committed. Its
//! failure is advisory: callers turn the result into a
//! [`NotificationReport`] and never fail the write because of it.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{reference::ReferenceNo, team::Team};

/// Everything a notification needs to describe an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPayload {
  pub inward_id:    i64,
  pub reference_no: ReferenceNo,
  pub subject:      String,
  pub from_whom:    String,
  pub team:         Team,
  pub recipient:    String,
  pub instructions: Option<String>,
  pub due_date:     Option<NaiveDate>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("notification transport error: {0}")]
  Transport(String),

  #[error("notification rejected with status {status}: {body}")]
  Rejected { status: u16, body: String },

  #[error("notification could not be rendered: {0}")]
  Render(String),
}

/// A notifier's successful outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
  Sent { message_id: Option<String> },
  /// Nothing was sent, e.g. because no credentials are configured.
  Skipped { reason: String },
}

/// Sends assignment notifications.
pub trait Notifier: Send + Sync {
  fn notify<'a>(
    &'a self,
    payload: &'a AssignmentPayload,
  ) -> impl Future<Output = Result<Delivery, NotifyError>> + Send + 'a;
}

/// The advisory `notification` field of an assignment response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NotificationReport {
  Sent {
    recipient:  String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    message_id: Option<String>,
  },
  Skipped {
    reason: String,
  },
  Failed {
    recipient: String,
    reason:    String,
  },
}

impl NotificationReport {
  pub fn from_result(
    payload: &AssignmentPayload,
    result: Result<Delivery, NotifyError>,
  ) -> Self {
    match result {
      Ok(Delivery::Sent { message_id }) => Self::Sent {
        recipient: payload.recipient.clone(),
        message_id,
      },
      Ok(Delivery::Skipped { reason }) => Self::Skipped { reason },
      Err(e) => Self::Failed {
        recipient: payload.recipient.clone(),
        reason:    e.to_string(),
      },
    }
  }

  pub fn is_failure(&self) -> bool { matches!(self, Self::Failed { .. }) }
}
