//! [`SqliteStore`], the SQLite implementation of [`EntryStore`].

use std::{path::Path, sync::Arc, time::Duration};

use chrono::{DateTime, Datelike as _, Utc};
use rusqlite::{Connection, OptionalExtension as _, Transaction, TransactionBehavior};

use docket_core::{
  entry::{Assignment, CreatedOutward, InwardEntry, NewInward, NewOutward, OutwardListing},
  linkage::{LinkChange, LinkOutcome},
  reference::EntryKind,
  stats::{DashboardStats, Expenditure, TeamStats, TeamSummary},
  status::{AssignmentStatus, StatusChange},
  store::{EntryStore, InwardFilter, OutwardFilter},
  team::{Team, TeamDirectory},
};

use crate::{
  Error, Result,
  encode::{
    INWARD_COLUMNS, OUTWARD_COLUMNS, RawInward, RawOutward, decode_dt, decode_status,
    decode_team, encode_date, encode_dt,
  },
  schema::SCHEMA,
  sequence::next_reference,
};

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket register backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and directory are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  directory: Arc<TeamDirectory>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Use `directory` to fill in assignment recipients.
  pub fn with_directory(mut self, directory: TeamDirectory) -> Self {
    self.directory = Arc::new(directory);
    self
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, directory: Arc::new(TeamDirectory::default()) })
  }

  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn read_inward(conn: &Connection, id: i64) -> rusqlite::Result<RawInward> {
  conn.query_row(
    &format!("SELECT {INWARD_COLUMNS} FROM inward WHERE id = ?1"),
    [id],
    RawInward::from_row,
  )
}

fn read_outward(conn: &Connection, id: i64) -> rusqlite::Result<RawOutward> {
  conn.query_row(
    &format!(
      "SELECT {OUTWARD_COLUMNS}
       FROM outward o LEFT JOIN inward i ON i.id = o.linked_inward_id
       WHERE o.id = ?1"
    ),
    [id],
    RawOutward::from_row,
  )
}

fn read_status(conn: &Connection, id: i64) -> rusqlite::Result<Option<String>> {
  conn
    .query_row("SELECT assignment_status FROM inward WHERE id = ?1", [id], |r| r.get(0))
    .optional()
}

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> rusqlite::Result<u64> {
  conn.query_row(sql, params, |r| r.get::<_, i64>(0)).map(|n| n as u64)
}

fn immediate(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
  conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

// ─── Write transactions ──────────────────────────────────────────────────────
//
// Each runs on the connection thread inside one `BEGIN IMMEDIATE`
// transaction, so read-check-write sequences cannot interleave with another
// writer.

/// Column values for a new inward row, prepared outside the connection
/// thread.
struct InwardRow {
  means:             String,
  from_whom:         String,
  subject:           String,
  received_at:       String,
  file_reference:    Option<String>,
  assigned_team:     Option<&'static str>,
  assigned_to_email: Option<String>,
  instructions:      Option<String>,
  assignment_date:   Option<String>,
  status:            &'static str,
  due_date:          Option<String>,
}

fn insert_inward(conn: &mut Connection, row: InwardRow, now: DateTime<Utc>) -> Result<InwardEntry> {
  let tx = immediate(conn)?;
  let reference = next_reference(&tx, EntryKind::Inward, now.year())?;
  let now_str = encode_dt(now);

  tx.execute(
    "INSERT INTO inward (
       reference_no, means, from_whom, subject, received_at, file_reference,
       assigned_team, assigned_to_email, assignment_instructions, assignment_date,
       assignment_status, due_date, completion_date, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, NULL, ?13, ?13)",
    rusqlite::params![
      reference.to_string(),
      row.means,
      row.from_whom,
      row.subject,
      row.received_at,
      row.file_reference,
      row.assigned_team,
      row.assigned_to_email,
      row.instructions,
      row.assignment_date,
      row.status,
      row.due_date,
      now_str,
    ],
  )?;

  let entry = read_inward(&tx, tx.last_insert_rowid())?.into_entry()?;
  tx.commit()?;
  Ok(entry)
}

fn apply_status(
  conn: &mut Connection,
  id: i64,
  target: AssignmentStatus,
  now: DateTime<Utc>,
) -> Result<InwardEntry> {
  let tx = immediate(conn)?;
  let current = read_status(&tx, id)?
    .ok_or(docket_core::Error::InwardNotFound(id))?;

  if let StatusChange::To(status) = decode_status(&current)?.request(target)? {
    let now_str = encode_dt(now);
    let completion = (status == AssignmentStatus::Completed).then(|| now_str.clone());
    tx.execute(
      "UPDATE inward SET assignment_status = ?1, completion_date = ?2, updated_at = ?3
       WHERE id = ?4",
      rusqlite::params![status.as_str(), completion, now_str, id],
    )?;
  }

  let entry = read_inward(&tx, id)?.into_entry()?;
  tx.commit()?;
  Ok(entry)
}

/// Overwrite the assignment and restart the work cycle at `Pending`.
fn reassign(
  conn: &mut Connection,
  id: i64,
  team: &'static str,
  email: Option<String>,
  instructions: Option<String>,
  due_date: Option<String>,
  now: DateTime<Utc>,
) -> Result<InwardEntry> {
  let tx = immediate(conn)?;
  let changed = tx.execute(
    "UPDATE inward SET
       assigned_team = ?1, assigned_to_email = ?2, assignment_instructions = ?3,
       assignment_date = ?4, assignment_status = 'Pending', due_date = ?5,
       completion_date = NULL, updated_at = ?4
     WHERE id = ?6",
    rusqlite::params![team, email, instructions, encode_dt(now), due_date, id],
  )?;
  if changed == 0 {
    return Err(docket_core::Error::InwardNotFound(id).into());
  }
  let entry = read_inward(&tx, id)?.into_entry()?;
  tx.commit()?;
  Ok(entry)
}

/// Column values for a new outward row.
struct OutwardRow {
  means:             String,
  to_whom:           String,
  subject:           String,
  sent_by:           String,
  sent_at:           String,
  file_reference:    Option<String>,
  postal_tariff:     f64,
  due_date:          Option<String>,
  case_closed:       bool,
  linked_inward_id:  Option<i64>,
  created_by_team:   Team,
  team_member_email: Option<String>,
}

fn insert_outward(
  conn: &mut Connection,
  row: OutwardRow,
  leader: Option<String>,
  now: DateTime<Utc>,
) -> Result<(OutwardListing, Option<LinkOutcome>)> {
  let mut tx = immediate(conn)?;

  if let Some(inward_id) = row.linked_inward_id
    && read_status(&tx, inward_id)?.is_none()
  {
    return Err(docket_core::Error::InwardNotFound(inward_id).into());
  }

  let reference = next_reference(&tx, EntryKind::Outward, now.year())?;
  let now_str = encode_dt(now);

  tx.execute(
    "INSERT INTO outward (
       reference_no, means, to_whom, subject, sent_by, sent_at, file_reference,
       postal_tariff, due_date, case_closed, linked_inward_id, created_by_team,
       team_member_email, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
    rusqlite::params![
      reference.to_string(),
      row.means,
      row.to_whom,
      row.subject,
      row.sent_by,
      row.sent_at,
      row.file_reference,
      row.postal_tariff,
      row.due_date,
      row.case_closed,
      row.linked_inward_id,
      row.created_by_team.as_str(),
      row.team_member_email,
      now_str,
    ],
  )?;
  let id = tx.last_insert_rowid();

  let linkage = row.linked_inward_id.map(|inward_id| {
    complete_linked(&mut tx, inward_id, row.created_by_team, leader, now).unwrap_or_else(
      |e| LinkOutcome::Failed { inward_id, reason: e.to_string() },
    )
  });

  let listing = read_outward(&tx, id)?.into_listing()?;
  tx.commit()?;
  Ok((listing, linkage))
}

/// Apply the linkage rule inside a savepoint. On error only the savepoint is
/// rolled back; the enclosing outward insert stands.
fn complete_linked(
  tx: &mut Transaction<'_>,
  inward_id: i64,
  team: Team,
  leader: Option<String>,
  now: DateTime<Utc>,
) -> Result<LinkOutcome> {
  let sp = tx.savepoint()?;
  let current = read_status(&sp, inward_id)?
    .ok_or(docket_core::Error::InwardNotFound(inward_id))?;
  let now_str = encode_dt(now);

  let outcome = match LinkChange::for_status(decode_status(&current)?) {
    LinkChange::AlreadyCompleted => {
      let completed_at: Option<String> = sp.query_row(
        "SELECT completion_date FROM inward WHERE id = ?1",
        [inward_id],
        |r| r.get(0),
      )?;
      LinkOutcome::AlreadyCompleted {
        inward_id,
        completed_at: completed_at.as_deref().map(decode_dt).transpose()?,
      }
    }
    LinkChange::Complete => {
      sp.execute(
        "UPDATE inward SET assignment_status = 'Completed', completion_date = ?1,
           updated_at = ?1
         WHERE id = ?2",
        rusqlite::params![now_str, inward_id],
      )?;
      LinkOutcome::Completed { inward_id, completed_at: now, adopted_team: None }
    }
    LinkChange::AdoptAndComplete => {
      sp.execute(
        "UPDATE inward SET assigned_team = ?1, assigned_to_email = ?2,
           assignment_date = ?3, assignment_status = 'Completed',
           completion_date = ?3, updated_at = ?3
         WHERE id = ?4",
        rusqlite::params![team.as_str(), leader, now_str, inward_id],
      )?;
      LinkOutcome::Completed { inward_id, completed_at: now, adopted_team: Some(team) }
    }
  };

  sp.commit()?;
  Ok(outcome)
}

// ─── EntryStore impl ─────────────────────────────────────────────────────────

impl EntryStore for SqliteStore {
  type Error = Error;

  // ── Inward ────────────────────────────────────────────────────────────────

  async fn create_inward(&self, input: NewInward) -> Result<InwardEntry> {
    input.validate()?;

    let now = Utc::now();
    let team = input.assignment.as_ref().map(|a| a.team);
    let assignment = input.assignment.as_ref();

    let row = InwardRow {
      means:             input.means.trim().to_owned(),
      from_whom:         input.from_whom.trim().to_owned(),
      subject:           input.subject.trim().to_owned(),
      received_at:       encode_dt(input.received_at),
      file_reference:    input.file_reference,
      assigned_team:     team.map(Team::as_str),
      assigned_to_email: assignment
        .and_then(|a| self.directory.resolve(a.team, a.email.as_deref())),
      instructions:      assignment.and_then(|a| a.instructions.clone()),
      assignment_date:   team.map(|_| encode_dt(now)),
      status:            AssignmentStatus::initial(team).as_str(),
      due_date:          assignment.and_then(|a| a.due_date).map(encode_date),
    };

    self
      .conn
      .call(move |conn| Ok(insert_inward(conn, row, now)))
      .await?
  }

  async fn get_inward(&self, id: i64) -> Result<InwardEntry> {
    let raw: Option<RawInward> = self
      .conn
      .call(move |conn| Ok(read_inward(conn, id).optional()?))
      .await?;

    raw
      .ok_or(docket_core::Error::InwardNotFound(id))?
      .into_entry()
  }

  async fn list_inward(&self, filter: &InwardFilter) -> Result<Vec<InwardEntry>> {
    let team = filter.team.map(Team::as_str);
    let status = filter.status.map(AssignmentStatus::as_str);
    let (from, until) = filter.received.bounds();
    let from = from.map(encode_dt);
    let until = until.map(encode_dt);

    let raws: Vec<RawInward> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INWARD_COLUMNS} FROM inward
           WHERE (?1 IS NULL OR assigned_team = ?1)
             AND (?2 IS NULL OR assignment_status = ?2)
             AND (?3 IS NULL OR received_at >= ?3)
             AND (?4 IS NULL OR received_at < ?4)
           ORDER BY id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![team, status, from, until], RawInward::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInward::into_entry).collect()
  }

  async fn assign_inward(&self, id: i64, assignment: Assignment) -> Result<InwardEntry> {
    let now = Utc::now();
    let team = assignment.team.as_str();
    let email = self
      .directory
      .resolve(assignment.team, assignment.email.as_deref());
    let instructions = assignment.instructions;
    let due_date = assignment.due_date.map(encode_date);

    self
      .conn
      .call(move |conn| Ok(reassign(conn, id, team, email, instructions, due_date, now)))
      .await?
  }

  async fn update_inward_status(
    &self,
    id: i64,
    status: AssignmentStatus,
  ) -> Result<InwardEntry> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(apply_status(conn, id, status, now)))
      .await?
  }

  // ── Outward ───────────────────────────────────────────────────────────────

  async fn create_outward(&self, input: NewOutward) -> Result<CreatedOutward> {
    input.validate()?;

    let now = Utc::now();
    let leader = self.directory.leader(input.created_by_team).map(str::to_owned);
    let row = OutwardRow {
      means:             input.means.trim().to_owned(),
      to_whom:           input.to_whom.trim().to_owned(),
      subject:           input.subject.trim().to_owned(),
      sent_by:           input.sent_by.trim().to_owned(),
      sent_at:           encode_dt(input.sent_at),
      file_reference:    input.file_reference,
      postal_tariff:     input.postal_tariff,
      due_date:          input.due_date.map(encode_date),
      case_closed:       input.case_closed,
      linked_inward_id:  input.linked_inward_id,
      created_by_team:   input.created_by_team,
      team_member_email: input.team_member_email,
    };

    let (listing, linkage) = self
      .conn
      .call(move |conn| Ok(insert_outward(conn, row, leader, now)))
      .await??;

    Ok(CreatedOutward { entry: listing.entry, linkage })
  }

  async fn get_outward(&self, id: i64) -> Result<OutwardListing> {
    let raw: Option<RawOutward> = self
      .conn
      .call(move |conn| Ok(read_outward(conn, id).optional()?))
      .await?;

    raw
      .ok_or(docket_core::Error::OutwardNotFound(id))?
      .into_listing()
  }

  async fn list_outward(&self, filter: &OutwardFilter) -> Result<Vec<OutwardListing>> {
    let team = filter.team.map(Team::as_str);
    let (from, until) = filter.sent.bounds();
    let from = from.map(encode_dt);
    let until = until.map(encode_dt);

    let raws: Vec<RawOutward> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {OUTWARD_COLUMNS}
           FROM outward o LEFT JOIN inward i ON i.id = o.linked_inward_id
           WHERE (?1 IS NULL OR o.created_by_team = ?1)
             AND (?2 IS NULL OR o.sent_at >= ?2)
             AND (?3 IS NULL OR o.sent_at < ?3)
           ORDER BY o.id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![team, from, until], RawOutward::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOutward::into_listing).collect()
  }

  async fn outward_expenditure(&self, filter: &OutwardFilter) -> Result<Expenditure> {
    let team = filter.team.map(Team::as_str);
    let (from, until) = filter.sent.bounds();
    let from = from.map(encode_dt);
    let until = until.map(encode_dt);

    let (count, total): (i64, f64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(postal_tariff), 0.0) FROM outward
           WHERE (?1 IS NULL OR created_by_team = ?1)
             AND (?2 IS NULL OR sent_at >= ?2)
             AND (?3 IS NULL OR sent_at < ?3)",
          rusqlite::params![team, from, until],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(Expenditure { count: count as u64, total_postal_tariff: total })
  }

  // ── Reporting ─────────────────────────────────────────────────────────────

  async fn dashboard_stats(&self) -> Result<DashboardStats> {
    let stats = self
      .conn
      .call(|conn| {
        Ok(DashboardStats {
          total_inward:   count(conn, "SELECT COUNT(*) FROM inward", [])?,
          total_outward:  count(conn, "SELECT COUNT(*) FROM outward", [])?,
          pending_work:   count(
            conn,
            "SELECT COUNT(*) FROM inward
             WHERE assignment_status IN ('Pending', 'In Progress')",
            [],
          )?,
          completed_work: count(
            conn,
            "SELECT COUNT(*) FROM inward WHERE assignment_status = 'Completed'",
            [],
          )?,
          unassigned:     count(
            conn,
            "SELECT COUNT(*) FROM inward
             WHERE assignment_status = 'Unassigned' OR assigned_team IS NULL",
            [],
          )?,
        })
      })
      .await?;
    Ok(stats)
  }

  async fn team_stats(&self, team: Team) -> Result<TeamStats> {
    let team = team.as_str();

    let stats = self
      .conn
      .call(move |conn| {
        let by_status = |status: AssignmentStatus| {
          count(
            conn,
            "SELECT COUNT(*) FROM inward WHERE assigned_team = ?1 AND assignment_status = ?2",
            rusqlite::params![team, status.as_str()],
          )
        };
        let pending = by_status(AssignmentStatus::Pending)?;
        let in_progress = by_status(AssignmentStatus::InProgress)?;
        let completed = by_status(AssignmentStatus::Completed)?;
        let outward = count(
          conn,
          "SELECT COUNT(*) FROM outward WHERE created_by_team = ?1",
          [team],
        )?;
        Ok(TeamStats::new(pending, in_progress, completed, outward))
      })
      .await?;
    Ok(stats)
  }

  async fn teams_summary(&self) -> Result<Vec<TeamSummary>> {
    let groups: Vec<(String, String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT assigned_team, assignment_status, COUNT(*) FROM inward
           WHERE assigned_team IS NOT NULL
           GROUP BY assigned_team, assignment_status",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut summary: Vec<TeamSummary> = Team::all()
      .map(|team| TeamSummary { team, total: 0, pending: 0, in_progress: 0, completed: 0 })
      .collect();

    for (team, status, n) in groups {
      let team = decode_team("assigned_team", &team)?;
      let n = n as u64;
      let Some(row) = summary.iter_mut().find(|s| s.team == team) else { continue };
      row.total += n;
      match decode_status(&status)? {
        AssignmentStatus::Pending => row.pending += n,
        AssignmentStatus::InProgress => row.in_progress += n,
        AssignmentStatus::Completed => row.completed += n,
        AssignmentStatus::Unassigned => {}
      }
    }

    Ok(summary)
  }
}
