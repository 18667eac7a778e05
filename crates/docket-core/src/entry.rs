//! Inward and outward register entries.
//!
//! Field names are snake_case in Rust and in storage, camelCase on the wire
//! (`#[serde(rename_all = "camelCase")]`); there is no other transformation
//! between the two.

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  linkage::LinkOutcome,
  notify::AssignmentPayload,
  reference::ReferenceNo,
  status::AssignmentStatus,
  team::Team,
};

// ─── Inward ──────────────────────────────────────────────────────────────────

/// A record of incoming correspondence.
///
/// Invariants (also enforced by the store):
/// - `assignment_status == Unassigned` iff `assigned_team` is `None`;
/// - `assignment_status == Completed` iff `completion_date` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InwardEntry {
  pub id:                      i64,
  pub reference_no:            ReferenceNo,
  pub means:                   String,
  pub from_whom:               String,
  pub subject:                 String,
  pub received_at:             DateTime<Utc>,
  pub file_reference:          Option<String>,
  pub assigned_team:           Option<Team>,
  /// Recipient of assignment notifications; defaults to the team leader.
  pub assigned_to_email:       Option<String>,
  pub assignment_instructions: Option<String>,
  /// Set on every assignment or reassignment.
  pub assignment_date:         Option<DateTime<Utc>>,
  pub assignment_status:       AssignmentStatus,
  pub due_date:                Option<NaiveDate>,
  pub completion_date:         Option<DateTime<Utc>>,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              DateTime<Utc>,
}

impl InwardEntry {
  /// `true` if both status invariants hold.
  pub fn is_consistent(&self) -> bool {
    let unassigned = self.assignment_status == AssignmentStatus::Unassigned;
    let completed = self.assignment_status == AssignmentStatus::Completed;
    unassigned == self.assigned_team.is_none()
      && completed == self.completion_date.is_some()
  }

  /// The notification payload for the current assignment, if the entry is
  /// assigned and has a recipient.
  pub fn assignment_payload(&self) -> Option<AssignmentPayload> {
    Some(AssignmentPayload {
      inward_id:    self.id,
      reference_no: self.reference_no,
      subject:      self.subject.clone(),
      from_whom:    self.from_whom.clone(),
      team:         self.assigned_team?,
      recipient:    self.assigned_to_email.clone()?,
      instructions: self.assignment_instructions.clone(),
      due_date:     self.due_date,
    })
  }
}

/// An assignment (or reassignment) of an inward entry to a team.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
  pub team:         Team,
  /// Overrides the team directory when set.
  pub email:        Option<String>,
  pub instructions: Option<String>,
  pub due_date:     Option<NaiveDate>,
}

impl Assignment {
  pub fn to_team(team: Team) -> Self {
    Self { team, email: None, instructions: None, due_date: None }
  }
}

/// Input to [`crate::store::EntryStore::create_inward`].
/// The reference number, status and timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewInward {
  pub means:          String,
  pub from_whom:      String,
  pub subject:        String,
  pub received_at:    DateTime<Utc>,
  pub file_reference: Option<String>,
  pub assignment:     Option<Assignment>,
}

impl NewInward {
  pub fn validate(&self) -> Result<()> {
    require("means", &self.means)?;
    require("fromWhom", &self.from_whom)?;
    require("subject", &self.subject)?;
    four_digit_year("receivedAt", self.received_at)
  }
}

// ─── Outward ─────────────────────────────────────────────────────────────────

/// A record of correspondence sent out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutwardEntry {
  pub id:                i64,
  pub reference_no:      ReferenceNo,
  pub means:             String,
  pub to_whom:           String,
  pub subject:           String,
  pub sent_by:           String,
  pub sent_at:           DateTime<Utc>,
  pub file_reference:    Option<String>,
  /// Postage spent, in the office's currency. Never negative.
  pub postal_tariff:     f64,
  pub due_date:          Option<NaiveDate>,
  pub case_closed:       bool,
  pub linked_inward_id:  Option<i64>,
  pub created_by_team:   Team,
  pub team_member_email: Option<String>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

/// Input to [`crate::store::EntryStore::create_outward`].
#[derive(Debug, Clone)]
pub struct NewOutward {
  pub means:             String,
  pub to_whom:           String,
  pub subject:           String,
  pub sent_by:           String,
  pub sent_at:           DateTime<Utc>,
  pub file_reference:    Option<String>,
  pub postal_tariff:     f64,
  pub due_date:          Option<NaiveDate>,
  pub case_closed:       bool,
  pub linked_inward_id:  Option<i64>,
  pub created_by_team:   Team,
  pub team_member_email: Option<String>,
}

impl NewOutward {
  pub fn validate(&self) -> Result<()> {
    require("means", &self.means)?;
    require("toWhom", &self.to_whom)?;
    require("subject", &self.subject)?;
    require("sentBy", &self.sent_by)?;
    four_digit_year("sentAt", self.sent_at)?;
    if !self.postal_tariff.is_finite() || self.postal_tariff < 0.0 {
      return Err(Error::validation("postalTariff must be a non-negative number"));
    }
    Ok(())
  }
}

/// The id and reference number of the inward entry an outward entry answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InwardRef {
  pub id:           i64,
  pub reference_no: ReferenceNo,
}

/// An outward entry with its linked inward entry resolved inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutwardListing {
  #[serde(flatten)]
  pub entry:  OutwardEntry,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub inward: Option<InwardRef>,
}

/// Result of [`crate::store::EntryStore::create_outward`].
#[derive(Debug, Clone)]
pub struct CreatedOutward {
  pub entry:   OutwardEntry,
  /// Present when the entry links an inward entry.
  pub linkage: Option<LinkOutcome>,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    Err(Error::validation(format!("{field} is required")))
  } else {
    Ok(())
  }
}

/// Timestamps are stored as fixed-width RFC 3339, which has no room for a
/// sign or a fifth year digit.
pub fn four_digit_year(field: &str, at: DateTime<Utc>) -> Result<()> {
  if (0..=9999).contains(&at.year()) {
    Ok(())
  } else {
    Err(Error::validation(format!("{field} must fall between years 0000 and 9999")))
  }
}

/// Treat blank optional text as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}
