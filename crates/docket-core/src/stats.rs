//! Dashboard and reporting aggregates.

use serde::{Deserialize, Serialize};

use crate::team::Team;

/// Register-wide counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_inward:   u64,
  pub total_outward:  u64,
  /// `Pending` plus `In Progress`.
  pub pending_work:   u64,
  pub completed_work: u64,
  pub unassigned:     u64,
}

/// Counts for a single team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
  pub total_assigned: u64,
  pub pending:        u64,
  pub in_progress:    u64,
  pub completed:      u64,
  /// Outward entries sent by the team.
  pub total_outward:  u64,
}

impl TeamStats {
  pub fn new(pending: u64, in_progress: u64, completed: u64, total_outward: u64) -> Self {
    Self {
      total_assigned: pending + in_progress + completed,
      pending,
      in_progress,
      completed,
      total_outward,
    }
  }
}

/// One row of the all-teams summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
  pub team:        Team,
  pub total:       u64,
  pub pending:     u64,
  pub in_progress: u64,
  pub completed:   u64,
}

/// Postage totals over a set of outward entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expenditure {
  pub count:               u64,
  pub total_postal_tariff: f64,
}
