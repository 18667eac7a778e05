//! Best-effort assignment notification, run after the write has committed.

use docket_core::{
  entry::InwardEntry,
  notify::{NotificationReport, Notifier},
};

/// Notify the assignee of `entry`, if it has one.
///
/// Never fails: the outcome is logged and returned as an advisory report.
/// Returns `None` when the entry is unassigned or has no recipient.
pub async fn dispatch<N: Notifier>(notifier: &N, entry: &InwardEntry) -> Option<NotificationReport> {
  let Some(payload) = entry.assignment_payload() else {
    tracing::debug!(reference = %entry.reference_no, "no assignee to notify");
    return None;
  };

  let report = NotificationReport::from_result(&payload, notifier.notify(&payload).await);
  match &report {
    NotificationReport::Sent { recipient, .. } => {
      tracing::info!(reference = %payload.reference_no, %recipient, "assignment notification sent");
    }
    NotificationReport::Skipped { reason } => {
      tracing::info!(reference = %payload.reference_no, %reason, "assignment notification skipped");
    }
    NotificationReport::Failed { recipient, reason } => {
      tracing::warn!(
        reference = %payload.reference_no,
        %recipient,
        %reason,
        "assignment notification failed",
      );
    }
  }
  Some(report)
}
