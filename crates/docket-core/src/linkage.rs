//! The linkage rule: creating an outward entry that answers an inward entry
//! completes that inward entry.
//!
//! The first linking outward entry is authoritative. Later links to an
//! already-completed entry change nothing, so the completion date always
//! reflects the first reply. An unassigned entry that gets answered is
//! attributed to the replying team, which keeps the "unassigned iff no team"
//! invariant intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{status::AssignmentStatus, team::Team};

/// What the linkage rule does to the referenced inward entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
  /// Mark `Completed` and stamp the completion date.
  Complete,
  /// As `Complete`, and record the replying team as the assignee.
  AdoptAndComplete,
  /// Already completed by an earlier link or update.
  AlreadyCompleted,
}

impl LinkChange {
  pub fn for_status(status: AssignmentStatus) -> Self {
    match status {
      AssignmentStatus::Unassigned => Self::AdoptAndComplete,
      AssignmentStatus::Pending | AssignmentStatus::InProgress => Self::Complete,
      AssignmentStatus::Completed => Self::AlreadyCompleted,
    }
  }
}

/// Advisory result of the linkage rule, reported alongside a successful
/// outward creation. A failure here never fails the outward write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LinkOutcome {
  Completed {
    inward_id:    i64,
    completed_at: DateTime<Utc>,
    /// Set when the inward entry was unassigned and took the replying team.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    adopted_team: Option<Team>,
  },
  AlreadyCompleted {
    inward_id:    i64,
    completed_at: Option<DateTime<Utc>>,
  },
  Failed {
    inward_id: i64,
    reason:    String,
  },
}

impl LinkOutcome {
  pub fn inward_id(&self) -> i64 {
    match self {
      Self::Completed { inward_id, .. }
      | Self::AlreadyCompleted { inward_id, .. }
      | Self::Failed { inward_id, .. } => *inward_id,
    }
  }

  pub fn is_failure(&self) -> bool { matches!(self, Self::Failed { .. }) }
}
