//! Parsing of loosely-typed request values (query strings and body fields)
//! into domain types.
//!
//! Bodies arrive from HTML forms, so text fields may be blank, timestamps may
//! lack a zone (`datetime-local`), and enum values may use any case.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use docket_core::{
  Error, Result,
  entry::{four_digit_year, non_blank},
  status::AssignmentStatus,
  store::DateRange,
  team::Team,
};
use serde::Deserialize;
use serde_json::Value;

/// Parse a timestamp: RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM[:SS]`
/// taken as UTC. The year must have four digits and no sign.
pub fn instant(field: &str, value: &str) -> Result<DateTime<Utc>> {
  let value = value.trim();
  let parsed = DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
    .or_else(|| {
      ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
    })
    .ok_or_else(|| Error::validation(format!("{field} is not a valid date-time: {value:?}")))?;
  four_digit_year(field, parsed)?;
  Ok(parsed)
}

/// Parse a `YYYY-MM-DD` date.
pub fn date(field: &str, value: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
    .map_err(|_| Error::validation(format!("{field} is not a valid date: {value:?}")))
}

/// A required text field; blank counts as missing.
pub fn required_text(field: &str, value: Option<String>) -> Result<String> {
  non_blank(value).ok_or_else(|| Error::validation(format!("{field} is required")))
}

/// A required timestamp field.
pub fn required_instant(field: &str, value: Option<String>) -> Result<DateTime<Utc>> {
  instant(field, &required_text(field, value)?)
}

/// An optional date field; blank counts as absent.
pub fn optional_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
  non_blank(value).map(|v| date(field, &v)).transpose()
}

pub fn optional_team(value: Option<String>) -> Result<Option<Team>> {
  non_blank(value).map(|v| Team::parse(&v)).transpose()
}

pub fn optional_status(value: Option<String>) -> Result<Option<AssignmentStatus>> {
  non_blank(value).map(|v| AssignmentStatus::parse(&v)).transpose()
}

/// A numeric field sent either as a JSON number or as form text.
pub fn optional_number(field: &str, value: Option<Value>) -> Result<Option<f64>> {
  let invalid = || Error::validation(format!("{field} must be a number"));
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(invalid),
    Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
    Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
    Some(_) => Err(invalid()),
  }
}

/// An entry id sent either as a JSON integer or as form text.
pub fn optional_id(field: &str, value: Option<Value>) -> Result<Option<i64>> {
  let invalid = || Error::validation(format!("{field} must be an entry id"));
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(invalid),
    Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
    Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
    Some(_) => Err(invalid()),
  }
}

// ─── Date range ──────────────────────────────────────────────────────────────

/// `?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`, both optional and inclusive.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
}

impl RangeParams {
  pub fn into_range(self) -> Result<DateRange> {
    DateRange::new(
      optional_date("startDate", self.start_date)?,
      optional_date("endDate", self.end_date)?,
    )
  }
}
