//! The `EntryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `docket-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::{
  Error, Result,
  entry::{Assignment, CreatedOutward, InwardEntry, NewInward, NewOutward, OutwardListing},
  error::DomainError,
  stats::{DashboardStats, Expenditure, TeamStats, TeamSummary},
  status::AssignmentStatus,
  team::Team,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// An inclusive range of calendar days (UTC). Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
  pub start: Option<NaiveDate>,
  pub end:   Option<NaiveDate>,
}

impl DateRange {
  pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
    if let (Some(s), Some(e)) = (start, end)
      && s > e
    {
      return Err(Error::validation(format!("startDate {s} is after endDate {e}")));
    }
    Ok(Self { start, end })
  }

  /// Half-open instant bounds `[from, until)`: midnight at the start of
  /// `start`, and midnight after `end`.
  pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc();
    let from = self.start.map(midnight);
    let until = self
      .end
      .and_then(|d| d.checked_add_days(Days::new(1)))
      .map(midnight);
    (from, until)
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    let (from, until) = self.bounds();
    from.is_none_or(|f| at >= f) && until.is_none_or(|u| at < u)
  }
}

/// Parameters for [`EntryStore::list_inward`]; all filters are optional.
#[derive(Debug, Clone, Default)]
pub struct InwardFilter {
  pub team:     Option<Team>,
  pub status:   Option<AssignmentStatus>,
  /// Applied to `received_at`.
  pub received: DateRange,
}

/// Parameters for [`EntryStore::list_outward`] and
/// [`EntryStore::outward_expenditure`].
#[derive(Debug, Clone, Default)]
pub struct OutwardFilter {
  /// Restrict to entries created by this team.
  pub team: Option<Team>,
  /// Applied to `sent_at`.
  pub sent: DateRange,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a register backend.
///
/// Entries are never deleted. Every write updates `updated_at`. Reference
/// numbers must be unique per kind even under concurrent creation.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EntryStore: Send + Sync {
  type Error: DomainError + Send + Sync + 'static;

  // ── Inward ────────────────────────────────────────────────────────────

  /// Validate and persist a new inward entry, minting its reference number.
  ///
  /// Starts `Pending` (with `assignment_date` set and the recipient resolved)
  /// if an assignment is supplied, `Unassigned` otherwise.
  fn create_inward(
    &self,
    input: NewInward,
  ) -> impl Future<Output = Result<InwardEntry, Self::Error>> + Send + '_;

  /// Fails with [`Error::InwardNotFound`] if absent.
  fn get_inward(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<InwardEntry, Self::Error>> + Send + '_;

  /// Entries matching `filter`, newest first.
  fn list_inward<'a>(
    &'a self,
    filter: &'a InwardFilter,
  ) -> impl Future<Output = Result<Vec<InwardEntry>, Self::Error>> + Send + 'a;

  /// Assign or reassign. Overwrites team, recipient, instructions and due
  /// date, stamps `assignment_date`, resets the status to `Pending` and clears
  /// any completion date, whatever the previous status.
  fn assign_inward(
    &self,
    id: i64,
    assignment: Assignment,
  ) -> impl Future<Output = Result<InwardEntry, Self::Error>> + Send + '_;

  /// Apply an explicit status update, as decided by
  /// [`AssignmentStatus::request`]. Moving into `Completed` stamps
  /// `completion_date`.
  fn update_inward_status(
    &self,
    id: i64,
    status: AssignmentStatus,
  ) -> impl Future<Output = Result<InwardEntry, Self::Error>> + Send + '_;

  // ── Outward ───────────────────────────────────────────────────────────

  /// Validate and persist a new outward entry, minting its reference number.
  ///
  /// Fails with [`Error::InwardNotFound`] (writing nothing) if
  /// `linked_inward_id` does not resolve. Otherwise, once the outward row is
  /// written, applies the linkage rule to the inward entry on a best-effort
  /// basis and reports the result in [`CreatedOutward::linkage`].
  fn create_outward(
    &self,
    input: NewOutward,
  ) -> impl Future<Output = Result<CreatedOutward, Self::Error>> + Send + '_;

  /// Fails with [`Error::OutwardNotFound`] if absent.
  fn get_outward(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<OutwardListing, Self::Error>> + Send + '_;

  /// Entries matching `filter`, newest first, with linked inward references
  /// resolved.
  fn list_outward<'a>(
    &'a self,
    filter: &'a OutwardFilter,
  ) -> impl Future<Output = Result<Vec<OutwardListing>, Self::Error>> + Send + 'a;

  /// Count and total postage of entries matching `filter`.
  fn outward_expenditure<'a>(
    &'a self,
    filter: &'a OutwardFilter,
  ) -> impl Future<Output = Result<Expenditure, Self::Error>> + Send + 'a;

  // ── Reporting ─────────────────────────────────────────────────────────

  fn dashboard_stats(
    &self,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + '_;

  fn team_stats(
    &self,
    team: Team,
  ) -> impl Future<Output = Result<TeamStats, Self::Error>> + Send + '_;

  /// One summary row per team, in [`Team::all`] order.
  fn teams_summary(
    &self,
  ) -> impl Future<Output = Result<Vec<TeamSummary>, Self::Error>> + Send + '_;
}
