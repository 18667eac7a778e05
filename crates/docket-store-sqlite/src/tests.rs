//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use chrono::{DateTime, Datelike as _, NaiveDate, TimeZone as _, Utc};
use docket_core::{
  entry::{Assignment, NewInward, NewOutward},
  linkage::LinkOutcome,
  reference::EntryKind,
  status::AssignmentStatus,
  store::{DateRange, EntryStore, InwardFilter, OutwardFilter},
  team::{Team, TeamDirectory},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn letter(subject: &str) -> NewInward {
  NewInward {
    means:          "Post".into(),
    from_whom:      "University Registrar".into(),
    subject:        subject.into(),
    received_at:    at(2025, 3, 10, 9),
    file_reference: None,
    assignment:     None,
  }
}

fn reply(team: Team) -> NewOutward {
  NewOutward {
    means:             "Courier".into(),
    to_whom:           "University Registrar".into(),
    subject:           "Reply".into(),
    sent_by:           "Front desk".into(),
    sent_at:           at(2025, 3, 12, 14),
    file_reference:    None,
    postal_tariff:     0.0,
    due_date:          None,
    case_closed:       false,
    linked_inward_id:  None,
    created_by_team:   team,
    team_member_email: None,
  }
}

fn is_inward_missing(result: Result<impl std::fmt::Debug, Error>, id: i64) -> bool {
  matches!(result, Err(Error::Core(docket_core::Error::InwardNotFound(n))) if n == id)
}

// ─── Inward creation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_inward_unassigned() {
  let s = store().await;
  let entry = s.create_inward(letter("Fee query")).await.unwrap();

  assert_eq!(entry.assignment_status, AssignmentStatus::Unassigned);
  assert!(entry.assigned_team.is_none());
  assert!(entry.assignment_date.is_none());
  assert!(entry.completion_date.is_none());
  assert_eq!(entry.received_at, at(2025, 3, 10, 9));
  assert_eq!(entry.reference_no.kind, EntryKind::Inward);
  assert_eq!(entry.reference_no.year, Utc::now().year());
  assert_eq!(entry.created_at, entry.updated_at);
  assert!(entry.is_consistent());
}

#[tokio::test]
async fn create_inward_with_assignment_starts_pending() {
  let s = store().await;
  let mut input = letter("Thesis extension");
  input.assignment = Some(Assignment {
    team:         Team::Phd,
    email:        None,
    instructions: Some("Check with the supervisor".into()),
    due_date:     Some(day(2025, 4, 1)),
  });

  let entry = s.create_inward(input).await.unwrap();
  assert_eq!(entry.assignment_status, AssignmentStatus::Pending);
  assert_eq!(entry.assigned_team, Some(Team::Phd));
  assert_eq!(entry.assigned_to_email.as_deref(), Some("phd.lead@office.example"));
  assert_eq!(entry.assignment_instructions.as_deref(), Some("Check with the supervisor"));
  assert_eq!(entry.due_date, Some(day(2025, 4, 1)));
  assert!(entry.assignment_date.is_some());
  assert!(entry.is_consistent());
}

#[tokio::test]
async fn create_inward_rejects_blank_fields() {
  let s = store().await;
  let mut input = letter("x");
  input.from_whom = "   ".into();

  let result = s.create_inward(input).await;
  assert!(matches!(result, Err(Error::Core(docket_core::Error::Validation(_)))));
  assert!(s.list_inward(&InwardFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_inward_missing() {
  let s = store().await;
  assert!(is_inward_missing(s.get_inward(42).await, 42));
}

#[tokio::test]
async fn list_inward_newest_first() {
  let s = store().await;
  let a = s.create_inward(letter("first")).await.unwrap();
  let b = s.create_inward(letter("second")).await.unwrap();

  let all = s.list_inward(&InwardFilter::default()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![b.id, a.id]);
}

#[tokio::test]
async fn list_inward_filters() {
  let s = store().await;
  let mut march = letter("march");
  march.assignment = Some(Assignment::to_team(Team::Ug));
  let march = s.create_inward(march).await.unwrap();

  let mut april = letter("april");
  april.received_at = at(2025, 4, 2, 10);
  let april = s.create_inward(april).await.unwrap();

  let ug = s
    .list_inward(&InwardFilter { team: Some(Team::Ug), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(ug.len(), 1);
  assert_eq!(ug[0].id, march.id);

  let unassigned = s
    .list_inward(&InwardFilter {
      status: Some(AssignmentStatus::Unassigned),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(unassigned.len(), 1);
  assert_eq!(unassigned[0].id, april.id);

  // endDate is inclusive of the whole day
  let range = DateRange::new(Some(day(2025, 3, 1)), Some(day(2025, 3, 10))).unwrap();
  let in_march = s
    .list_inward(&InwardFilter { received: range, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(in_march.len(), 1);
  assert_eq!(in_march[0].id, march.id);
}

// ─── Reference numbers ───────────────────────────────────────────────────────

#[tokio::test]
async fn references_increment_per_kind() {
  let s = store().await;
  let first = s.create_inward(letter("a")).await.unwrap();
  let second = s.create_inward(letter("b")).await.unwrap();
  let out = s.create_outward(reply(Team::Ug)).await.unwrap();

  assert_eq!(first.reference_no.seq, 1);
  assert_eq!(second.reference_no.seq, 2);
  assert_eq!(out.entry.reference_no.kind, EntryKind::Outward);
  assert_eq!(out.entry.reference_no.seq, 1);
  assert!(second.reference_no.to_string().starts_with("INW/"));
  assert!(out.entry.reference_no.to_string().ends_with("/001"));
}

#[tokio::test]
async fn failed_insert_does_not_consume_a_number() {
  let s = store().await;
  let mut bad = reply(Team::Ug);
  bad.linked_inward_id = Some(99);
  assert!(is_inward_missing(s.create_outward(bad).await, 99));

  let out = s.create_outward(reply(Team::Ug)).await.unwrap();
  assert_eq!(out.entry.reference_no.seq, 1);
  assert!(s.list_outward(&OutwardFilter::default()).await.unwrap().len() == 1);
}

#[tokio::test]
async fn out_of_range_years_are_rejected_before_writing() {
  let s = store().await;
  let mut input = letter("Far future");
  input.received_at = NaiveDate::from_ymd_opt(10000, 1, 1)
    .unwrap()
    .and_hms_opt(0, 0, 0)
    .unwrap()
    .and_utc();
  assert!(matches!(
    s.create_inward(input).await,
    Err(Error::Core(docket_core::Error::Validation(_)))
  ));

  let mut out = reply(Team::Ug);
  out.sent_at = NaiveDate::from_ymd_opt(-1, 1, 1)
    .unwrap()
    .and_hms_opt(0, 0, 0)
    .unwrap()
    .and_utc();
  assert!(matches!(
    s.create_outward(out).await,
    Err(Error::Core(docket_core::Error::Validation(_)))
  ));

  assert!(s.list_inward(&InwardFilter::default()).await.unwrap().is_empty());
  assert!(s.list_outward(&OutwardFilter::default()).await.unwrap().is_empty());
  let entry = s.create_inward(letter("Next")).await.unwrap();
  assert_eq!(entry.reference_no.seq, 1);
}

#[tokio::test]
async fn unreadable_row_rolls_the_insert_back() {
  let s = store().await;
  s.execute_raw(
    "CREATE TRIGGER garble_received AFTER INSERT ON inward
     BEGIN UPDATE inward SET received_at = 'not a time' WHERE id = NEW.id; END;",
  )
  .await
  .unwrap();

  assert!(matches!(s.create_inward(letter("Garbled")).await, Err(Error::DateParse(_))));

  s.execute_raw("DROP TRIGGER garble_received;").await.unwrap();
  assert!(s.list_inward(&InwardFilter::default()).await.unwrap().is_empty());
  let entry = s.create_inward(letter("Clean")).await.unwrap();
  assert_eq!(entry.reference_no.seq, 1);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_references() {
  let s = store().await;

  let handles: Vec<_> = (0..20)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move { s.create_inward(letter(&format!("letter {i}"))).await })
    })
    .collect();

  let mut refs = HashSet::new();
  for handle in handles {
    let entry = handle.await.unwrap().unwrap();
    assert!(refs.insert(entry.reference_no.to_string()));
  }
  assert_eq!(refs.len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn separate_connections_share_the_counter() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("docket.sqlite3");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  let handles: Vec<_> = (0..10)
    .map(|i| {
      let s = if i % 2 == 0 { a.clone() } else { b.clone() };
      tokio::spawn(async move { s.create_outward(reply(Team::PgPro)).await })
    })
    .collect();

  let mut seqs = Vec::new();
  for handle in handles {
    seqs.push(handle.await.unwrap().unwrap().entry.reference_no.seq);
  }
  seqs.sort_unstable();
  assert_eq!(seqs, (1..=10).collect::<Vec<_>>());
}

// ─── Assignment ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_uses_directory_leader() {
  let s = store()
    .await
    .with_directory(TeamDirectory::default().with_leader(Team::Ug, "ug.desk@college.example"));
  let entry = s.create_inward(letter("Admission")).await.unwrap();

  let assigned = s.assign_inward(entry.id, Assignment::to_team(Team::Ug)).await.unwrap();
  assert_eq!(assigned.assignment_status, AssignmentStatus::Pending);
  assert_eq!(assigned.assigned_to_email.as_deref(), Some("ug.desk@college.example"));
  assert!(assigned.assignment_date.is_some());
  assert!(assigned.updated_at >= entry.updated_at);
}

#[tokio::test]
async fn assign_explicit_email_wins() {
  let s = store().await;
  let entry = s.create_inward(letter("Admission")).await.unwrap();

  let mut assignment = Assignment::to_team(Team::PgPro);
  assignment.email = Some("clerk@office.example".into());
  let assigned = s.assign_inward(entry.id, assignment).await.unwrap();
  assert_eq!(assigned.assigned_to_email.as_deref(), Some("clerk@office.example"));
}

#[tokio::test]
async fn assign_missing_entry() {
  let s = store().await;
  assert!(is_inward_missing(s.assign_inward(7, Assignment::to_team(Team::Ug)).await, 7));
}

#[tokio::test]
async fn reassign_resets_to_pending() {
  let s = store().await;
  let entry = s.create_inward(letter("Scholarship")).await.unwrap();
  let first = s.assign_inward(entry.id, Assignment::to_team(Team::Ug)).await.unwrap();
  s.update_inward_status(entry.id, AssignmentStatus::InProgress)
    .await
    .unwrap();

  let second = s.assign_inward(entry.id, Assignment::to_team(Team::Phd)).await.unwrap();
  assert_eq!(second.assignment_status, AssignmentStatus::Pending);
  assert_eq!(second.assigned_team, Some(Team::Phd));
  assert!(second.assignment_date >= first.assignment_date);
}

#[tokio::test]
async fn reassign_completed_clears_completion() {
  let s = store().await;
  let entry = s.create_inward(letter("Transcript")).await.unwrap();
  s.assign_inward(entry.id, Assignment::to_team(Team::Ug)).await.unwrap();
  let done = s
    .update_inward_status(entry.id, AssignmentStatus::Completed)
    .await
    .unwrap();
  assert!(done.completion_date.is_some());

  let reopened = s.assign_inward(entry.id, Assignment::to_team(Team::Ug)).await.unwrap();
  assert_eq!(reopened.assignment_status, AssignmentStatus::Pending);
  assert!(reopened.completion_date.is_none());
  assert!(reopened.is_consistent());
}

// ─── Status updates ──────────────────────────────────────────────────────────

#[tokio::test]
async fn status_moves_forward_and_stamps_completion() {
  let s = store().await;
  let mut input = letter("Internship");
  input.assignment = Some(Assignment::to_team(Team::PgPro));
  let entry = s.create_inward(input).await.unwrap();

  let working = s
    .update_inward_status(entry.id, AssignmentStatus::InProgress)
    .await
    .unwrap();
  assert_eq!(working.assignment_status, AssignmentStatus::InProgress);
  assert!(working.completion_date.is_none());

  let done = s
    .update_inward_status(entry.id, AssignmentStatus::Completed)
    .await
    .unwrap();
  assert_eq!(done.assignment_status, AssignmentStatus::Completed);
  assert!(done.completion_date.is_some());

  // repeated completion keeps the original date
  let again = s
    .update_inward_status(entry.id, AssignmentStatus::Completed)
    .await
    .unwrap();
  assert_eq!(again.completion_date, done.completion_date);
}

#[tokio::test]
async fn illegal_transitions_leave_entry_untouched() {
  let s = store().await;
  let entry = s.create_inward(letter("Hostel")).await.unwrap();

  let result = s
    .update_inward_status(entry.id, AssignmentStatus::InProgress)
    .await;
  assert!(matches!(
    result,
    Err(Error::Core(docket_core::Error::IllegalTransition {
      from: AssignmentStatus::Unassigned,
      to:   AssignmentStatus::InProgress,
    }))
  ));

  s.assign_inward(entry.id, Assignment::to_team(Team::Ug)).await.unwrap();
  s.update_inward_status(entry.id, AssignmentStatus::Completed)
    .await
    .unwrap();
  let result = s
    .update_inward_status(entry.id, AssignmentStatus::Pending)
    .await;
  assert!(matches!(
    result,
    Err(Error::Core(docket_core::Error::IllegalTransition { .. }))
  ));

  let fetched = s.get_inward(entry.id).await.unwrap();
  assert_eq!(fetched.assignment_status, AssignmentStatus::Completed);
  assert!(fetched.completion_date.is_some());
}

#[tokio::test]
async fn status_update_missing_entry() {
  let s = store().await;
  assert!(is_inward_missing(
    s.update_inward_status(3, AssignmentStatus::Completed).await,
    3
  ));
}

// ─── Outward and linkage ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_outward_without_link() {
  let s = store().await;
  let mut input = reply(Team::Ug);
  input.postal_tariff = 42.5;
  let created = s.create_outward(input).await.unwrap();

  assert!(created.linkage.is_none());
  assert_eq!(created.entry.postal_tariff, 42.5);
  assert_eq!(created.entry.sent_at, at(2025, 3, 12, 14));

  let fetched = s.get_outward(created.entry.id).await.unwrap();
  assert_eq!(fetched.entry, created.entry);
  assert!(fetched.inward.is_none());
}

#[tokio::test]
async fn create_outward_rejects_negative_tariff() {
  let s = store().await;
  let mut input = reply(Team::Ug);
  input.postal_tariff = -1.0;
  assert!(matches!(
    s.create_outward(input).await,
    Err(Error::Core(docket_core::Error::Validation(_)))
  ));
}

#[tokio::test]
async fn get_outward_missing() {
  let s = store().await;
  assert!(matches!(
    s.get_outward(5).await,
    Err(Error::Core(docket_core::Error::OutwardNotFound(5)))
  ));
}

#[tokio::test]
async fn linked_outward_completes_inward() {
  let s = store().await;
  let mut input = letter("Degree certificate");
  input.assignment = Some(Assignment::to_team(Team::Ug));
  let inward = s.create_inward(input).await.unwrap();

  let mut out = reply(Team::Ug);
  out.linked_inward_id = Some(inward.id);
  let created = s.create_outward(out).await.unwrap();

  let Some(LinkOutcome::Completed { inward_id, adopted_team, .. }) = created.linkage else {
    panic!("expected completion, got {:?}", created.linkage);
  };
  assert_eq!(inward_id, inward.id);
  assert_eq!(adopted_team, None);

  let after = s.get_inward(inward.id).await.unwrap();
  assert_eq!(after.assignment_status, AssignmentStatus::Completed);
  assert!(after.completion_date.is_some());
  assert_eq!(after.assigned_team, Some(Team::Ug));

  let listing = s.get_outward(created.entry.id).await.unwrap();
  let linked = listing.inward.expect("inward ref");
  assert_eq!(linked.id, inward.id);
  assert_eq!(linked.reference_no, inward.reference_no);
}

#[tokio::test]
async fn linking_completed_inward_is_a_no_op() {
  let s = store().await;
  let mut input = letter("Fee refund");
  input.assignment = Some(Assignment::to_team(Team::PgPro));
  let inward = s.create_inward(input).await.unwrap();
  let done = s
    .update_inward_status(inward.id, AssignmentStatus::Completed)
    .await
    .unwrap();

  let mut out = reply(Team::Ug);
  out.linked_inward_id = Some(inward.id);
  let created = s.create_outward(out).await.unwrap();

  assert!(matches!(
    created.linkage,
    Some(LinkOutcome::AlreadyCompleted { completed_at, .. }) if completed_at == done.completion_date
  ));
  let after = s.get_inward(inward.id).await.unwrap();
  assert_eq!(after.assigned_team, Some(Team::PgPro));
  assert_eq!(after.completion_date, done.completion_date);
  assert_eq!(after.updated_at, done.updated_at);
}

#[tokio::test]
async fn linking_unassigned_inward_adopts_outward_team() {
  let s = store().await;
  let inward = s.create_inward(letter("Walk-in request")).await.unwrap();

  let mut out = reply(Team::Phd);
  out.linked_inward_id = Some(inward.id);
  let created = s.create_outward(out).await.unwrap();

  assert!(matches!(
    created.linkage,
    Some(LinkOutcome::Completed { adopted_team: Some(Team::Phd), .. })
  ));
  let after = s.get_inward(inward.id).await.unwrap();
  assert_eq!(after.assignment_status, AssignmentStatus::Completed);
  assert_eq!(after.assigned_team, Some(Team::Phd));
  assert_eq!(after.assigned_to_email.as_deref(), Some("phd.lead@office.example"));
  assert!(after.is_consistent());
}

#[tokio::test]
async fn linkage_failure_keeps_the_outward() {
  let s = store().await;
  let mut input = letter("Locked record");
  input.assignment = Some(Assignment::to_team(Team::Ug));
  let inward = s.create_inward(input).await.unwrap();

  s.execute_raw(
    "CREATE TRIGGER freeze_inward BEFORE UPDATE ON inward
     BEGIN SELECT RAISE(ABORT, 'inward is frozen'); END;",
  )
  .await
  .unwrap();

  let mut out = reply(Team::Ug);
  out.linked_inward_id = Some(inward.id);
  let created = s.create_outward(out).await.unwrap();

  let Some(LinkOutcome::Failed { inward_id, reason }) = created.linkage else {
    panic!("expected failure, got {:?}", created.linkage);
  };
  assert_eq!(inward_id, inward.id);
  assert!(reason.contains("frozen"));

  assert!(s.get_outward(created.entry.id).await.is_ok());
  let after = s.get_inward(inward.id).await.unwrap();
  assert_eq!(after.assignment_status, AssignmentStatus::Pending);
}

// ─── Outward queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn list_outward_filters_and_expenditure() {
  let s = store().await;

  let mut a = reply(Team::Ug);
  a.postal_tariff = 10.0;
  s.create_outward(a).await.unwrap();

  let mut b = reply(Team::Ug);
  b.postal_tariff = 5.5;
  b.sent_at = at(2025, 5, 1, 8);
  let b = s.create_outward(b).await.unwrap();

  let mut c = reply(Team::Phd);
  c.postal_tariff = 2.0;
  s.create_outward(c).await.unwrap();

  let ug = OutwardFilter { team: Some(Team::Ug), ..Default::default() };
  let listed = s.list_outward(&ug).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].entry.id, b.entry.id);

  let spent = s.outward_expenditure(&ug).await.unwrap();
  assert_eq!(spent.count, 2);
  assert!((spent.total_postal_tariff - 15.5).abs() < 1e-9);

  let may = OutwardFilter {
    sent: DateRange::new(Some(day(2025, 5, 1)), Some(day(2025, 5, 1))).unwrap(),
    ..Default::default()
  };
  let spent = s.outward_expenditure(&may).await.unwrap();
  assert_eq!(spent.count, 1);
  assert!((spent.total_postal_tariff - 5.5).abs() < 1e-9);
}

#[tokio::test]
async fn expenditure_of_nothing_is_zero() {
  let s = store().await;
  let spent = s.outward_expenditure(&OutwardFilter::default()).await.unwrap();
  assert_eq!(spent.count, 0);
  assert_eq!(spent.total_postal_tariff, 0.0);
}

// ─── Reporting ───────────────────────────────────────────────────────────────

async fn seeded() -> SqliteStore {
  let s = store().await;
  s.create_inward(letter("unassigned")).await.unwrap();

  for (team, status) in [
    (Team::Ug, None),
    (Team::Ug, Some(AssignmentStatus::InProgress)),
    (Team::Ug, Some(AssignmentStatus::Completed)),
    (Team::Phd, None),
  ] {
    let mut input = letter("assigned");
    input.assignment = Some(Assignment::to_team(team));
    let entry = s.create_inward(input).await.unwrap();
    if let Some(status) = status {
      s.update_inward_status(entry.id, status).await.unwrap();
    }
  }

  s.create_outward(reply(Team::Ug)).await.unwrap();
  s.create_outward(reply(Team::PgPro)).await.unwrap();
  s
}

#[tokio::test]
async fn dashboard_counts() {
  let s = seeded().await;
  let stats = s.dashboard_stats().await.unwrap();
  assert_eq!(stats.total_inward, 5);
  assert_eq!(stats.total_outward, 2);
  assert_eq!(stats.pending_work, 3);
  assert_eq!(stats.completed_work, 1);
  assert_eq!(stats.unassigned, 1);
}

#[tokio::test]
async fn team_counts() {
  let s = seeded().await;
  let ug = s.team_stats(Team::Ug).await.unwrap();
  assert_eq!(ug.total_assigned, 3);
  assert_eq!(ug.pending, 1);
  assert_eq!(ug.in_progress, 1);
  assert_eq!(ug.completed, 1);
  assert_eq!(ug.total_outward, 1);

  let pg = s.team_stats(Team::PgPro).await.unwrap();
  assert_eq!(pg.total_assigned, 0);
  assert_eq!(pg.total_outward, 1);
}

#[tokio::test]
async fn summary_covers_every_team() {
  let s = seeded().await;
  let summary = s.teams_summary().await.unwrap();

  let teams: Vec<_> = summary.iter().map(|r| r.team).collect();
  assert_eq!(teams, Team::all().collect::<Vec<_>>());

  let ug = &summary[0];
  assert_eq!((ug.total, ug.pending, ug.in_progress, ug.completed), (3, 1, 1, 1));
  let pg = &summary[1];
  assert_eq!(pg.total, 0);
  let phd = &summary[2];
  assert_eq!((phd.total, phd.pending), (1, 1));
}
