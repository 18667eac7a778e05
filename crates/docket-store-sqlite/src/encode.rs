//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order equals chronological order and range filters
//! can compare strings directly. Dates are `YYYY-MM-DD`. Teams and statuses
//! use their canonical names.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use docket_core::{
  entry::{InwardEntry, InwardRef, OutwardEntry, OutwardListing},
  reference::{EntryKind, ReferenceNo},
  status::AssignmentStatus,
  team::Team,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_kind(k: EntryKind) -> &'static str {
  match k {
    EntryKind::Inward => "inward",
    EntryKind::Outward => "outward",
  }
}

pub fn decode_team(column: &'static str, s: &str) -> Result<Team> {
  Team::parse(s).map_err(|_| Error::Corrupt { column, value: s.to_owned() })
}

pub fn decode_status(s: &str) -> Result<AssignmentStatus> {
  AssignmentStatus::parse(s).map_err(|_| Error::Corrupt {
    column: "assignment_status",
    value:  s.to_owned(),
  })
}

fn decode_reference(s: &str) -> Result<ReferenceNo> {
  ReferenceNo::parse(s).map_err(|_| Error::Corrupt { column: "reference_no", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawInward::from_row`].
pub const INWARD_COLUMNS: &str = "id, reference_no, means, from_whom, subject, received_at,
  file_reference, assigned_team, assigned_to_email, assignment_instructions,
  assignment_date, assignment_status, due_date, completion_date, created_at, updated_at";

/// Raw values read directly from an `inward` row.
pub struct RawInward {
  pub id:                      i64,
  pub reference_no:            String,
  pub means:                   String,
  pub from_whom:               String,
  pub subject:                 String,
  pub received_at:             String,
  pub file_reference:          Option<String>,
  pub assigned_team:           Option<String>,
  pub assigned_to_email:       Option<String>,
  pub assignment_instructions: Option<String>,
  pub assignment_date:         Option<String>,
  pub assignment_status:       String,
  pub due_date:                Option<String>,
  pub completion_date:         Option<String>,
  pub created_at:              String,
  pub updated_at:              String,
}

impl RawInward {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                      row.get(0)?,
      reference_no:            row.get(1)?,
      means:                   row.get(2)?,
      from_whom:               row.get(3)?,
      subject:                 row.get(4)?,
      received_at:             row.get(5)?,
      file_reference:          row.get(6)?,
      assigned_team:           row.get(7)?,
      assigned_to_email:       row.get(8)?,
      assignment_instructions: row.get(9)?,
      assignment_date:         row.get(10)?,
      assignment_status:       row.get(11)?,
      due_date:                row.get(12)?,
      completion_date:         row.get(13)?,
      created_at:              row.get(14)?,
      updated_at:              row.get(15)?,
    })
  }

  pub fn into_entry(self) -> Result<InwardEntry> {
    Ok(InwardEntry {
      id:                      self.id,
      reference_no:            decode_reference(&self.reference_no)?,
      means:                   self.means,
      from_whom:               self.from_whom,
      subject:                 self.subject,
      received_at:             decode_dt(&self.received_at)?,
      file_reference:          self.file_reference,
      assigned_team:           self
        .assigned_team
        .as_deref()
        .map(|t| decode_team("assigned_team", t))
        .transpose()?,
      assigned_to_email:       self.assigned_to_email,
      assignment_instructions: self.assignment_instructions,
      assignment_date:         decode_opt_dt(self.assignment_date)?,
      assignment_status:       decode_status(&self.assignment_status)?,
      due_date:                self.due_date.as_deref().map(decode_date).transpose()?,
      completion_date:         decode_opt_dt(self.completion_date)?,
      created_at:              decode_dt(&self.created_at)?,
      updated_at:              decode_dt(&self.updated_at)?,
    })
  }
}

/// Select list matching [`RawOutward::from_row`]; expects `outward o LEFT JOIN
/// inward i ON i.id = o.linked_inward_id`.
pub const OUTWARD_COLUMNS: &str = "o.id, o.reference_no, o.means, o.to_whom, o.subject,
  o.sent_by, o.sent_at, o.file_reference, o.postal_tariff, o.due_date, o.case_closed,
  o.linked_inward_id, o.created_by_team, o.team_member_email, o.created_at, o.updated_at,
  i.id, i.reference_no";

/// Raw values read from an `outward` row joined with its linked inward row.
pub struct RawOutward {
  pub id:                  i64,
  pub reference_no:        String,
  pub means:               String,
  pub to_whom:             String,
  pub subject:             String,
  pub sent_by:             String,
  pub sent_at:             String,
  pub file_reference:      Option<String>,
  pub postal_tariff:       f64,
  pub due_date:            Option<String>,
  pub case_closed:         bool,
  pub linked_inward_id:    Option<i64>,
  pub created_by_team:     String,
  pub team_member_email:   Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
  // inward join
  pub inward_id:           Option<i64>,
  pub inward_reference_no: Option<String>,
}

impl RawOutward {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      reference_no:        row.get(1)?,
      means:               row.get(2)?,
      to_whom:             row.get(3)?,
      subject:             row.get(4)?,
      sent_by:             row.get(5)?,
      sent_at:             row.get(6)?,
      file_reference:      row.get(7)?,
      postal_tariff:       row.get(8)?,
      due_date:            row.get(9)?,
      case_closed:         row.get(10)?,
      linked_inward_id:    row.get(11)?,
      created_by_team:     row.get(12)?,
      team_member_email:   row.get(13)?,
      created_at:          row.get(14)?,
      updated_at:          row.get(15)?,
      inward_id:           row.get(16)?,
      inward_reference_no: row.get(17)?,
    })
  }

  pub fn into_listing(self) -> Result<OutwardListing> {
    let inward = match (self.inward_id, self.inward_reference_no.as_deref()) {
      (Some(id), Some(r)) => Some(InwardRef { id, reference_no: decode_reference(r)? }),
      _ => None,
    };

    let entry = OutwardEntry {
      id:                self.id,
      reference_no:      decode_reference(&self.reference_no)?,
      means:             self.means,
      to_whom:           self.to_whom,
      subject:           self.subject,
      sent_by:           self.sent_by,
      sent_at:           decode_dt(&self.sent_at)?,
      file_reference:    self.file_reference,
      postal_tariff:     self.postal_tariff,
      due_date:          self.due_date.as_deref().map(decode_date).transpose()?,
      case_closed:       self.case_closed,
      linked_inward_id:  self.linked_inward_id,
      created_by_team:   decode_team("created_by_team", &self.created_by_team)?,
      team_member_email: self.team_member_email,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    };

    Ok(OutwardListing { entry, inward })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_sortable() {
    let a = Utc.with_ymd_and_hms(2025, 1, 9, 8, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(1500);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea, "2025-01-09T08:00:00.000000Z");
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn corrupt_enum_columns_are_reported() {
    assert!(matches!(
      decode_status("Archived"),
      Err(Error::Corrupt { column: "assignment_status", .. })
    ));
    assert!(decode_team("assigned_team", "MBA").is_err());
  }
}
