//! Handlers for `/inward` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/inward` | Optional `?team`, `status`, `startDate`, `endDate` (on `receivedAt`) |
//! | `POST` | `/inward` | Body: [`CreateInwardBody`]; returns 201 + the entry |
//! | `GET`  | `/inward/{id}` | 404 if not found |
//! | `PUT`  | `/inward/{id}/assign` | Body: [`AssignBody`]; resets the status to `Pending` |
//! | `PUT`  | `/inward/{id}/status` | Body: `{"assignmentStatus":"In Progress"}` |
//!
//! Creating an assigned entry and every (re)assignment trigger a notification
//! whose outcome is reported in the `notification` field.

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  Error,
  entry::{Assignment, NewInward, non_blank},
  notify::Notifier,
  store::{EntryStore, InwardFilter},
  team::Team,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  error::ApiError,
  notify::dispatch,
  params::{
    RangeParams, optional_date, optional_status, optional_team, required_instant, required_text,
  },
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub team:   Option<String>,
  pub status: Option<String>,
  #[serde(flatten)]
  pub range:  RangeParams,
}

impl TryFrom<ListParams> for InwardFilter {
  type Error = Error;

  fn try_from(p: ListParams) -> Result<Self, Error> {
    Ok(InwardFilter {
      team:     optional_team(p.team)?,
      status:   optional_status(p.status)?,
      received: p.range.into_range()?,
    })
  }
}

/// `GET /inward[?team=..][&status=..][&startDate=..][&endDate=..]`
pub async fn list<S, N>(
  State(state): State<AppState<S, N>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Query(params) = params?;
  let filter = InwardFilter::try_from(params)?;
  let entries = state
    .store
    .list_inward(&filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "entries": entries })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /inward/{id}`
pub async fn get_one<S, N>(
  State(state): State<AppState<S, N>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Path(id) = id?;
  let entry = state
    .store
    .get_inward(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "entry": entry })))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /inward`.
///
/// The field names of the earlier form (`particularsFromWhom`,
/// `signReceiptDateTime`) are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInwardBody {
  pub means:                   Option<String>,
  #[serde(alias = "particularsFromWhom")]
  pub from_whom:               Option<String>,
  pub subject:                 Option<String>,
  #[serde(alias = "signReceiptDateTime")]
  pub received_at:             Option<String>,
  pub file_reference:          Option<String>,
  pub assigned_team:           Option<String>,
  pub assigned_to_email:       Option<String>,
  pub assignment_instructions: Option<String>,
  pub due_date:                Option<String>,
}

impl TryFrom<CreateInwardBody> for NewInward {
  type Error = Error;

  fn try_from(b: CreateInwardBody) -> Result<Self, Error> {
    let assignment = optional_team(b.assigned_team)?
      .map(|team| -> Result<Assignment, Error> {
        Ok(Assignment {
          team,
          email: non_blank(b.assigned_to_email),
          instructions: non_blank(b.assignment_instructions),
          due_date: optional_date("dueDate", b.due_date)?,
        })
      })
      .transpose()?;

    Ok(NewInward {
      means: required_text("means", b.means)?,
      from_whom: required_text("fromWhom", b.from_whom)?,
      subject: required_text("subject", b.subject)?,
      received_at: required_instant("receivedAt", b.received_at)?,
      file_reference: non_blank(b.file_reference),
      assignment,
    })
  }
}

/// `POST /inward` returns 201 + the stored entry.
pub async fn create<S, N>(
  State(state): State<AppState<S, N>>,
  body: Result<Json<CreateInwardBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Json(body) = body?;
  let input = NewInward::try_from(body)?;
  let entry = state
    .store
    .create_inward(input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(reference = %entry.reference_no, status = %entry.assignment_status, "inward entry created");

  let notification = dispatch(state.notifier.as_ref(), &entry).await;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "message": "Inward entry created successfully",
      "id": entry.id,
      "referenceNo": entry.reference_no,
      "entry": entry,
      "notification": notification,
    })),
  ))
}

// ─── Assign ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /inward/{id}/assign`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
  pub assigned_team:           Option<String>,
  /// Overrides the team leader's address when non-blank.
  pub assigned_to_email:       Option<String>,
  pub assignment_instructions: Option<String>,
  pub due_date:                Option<String>,
}

impl TryFrom<AssignBody> for Assignment {
  type Error = Error;

  fn try_from(b: AssignBody) -> Result<Self, Error> {
    let team = non_blank(b.assigned_team)
      .ok_or_else(|| Error::validation("assignedTeam is required"))?;
    Ok(Assignment {
      team:         Team::parse(&team)?,
      email:        non_blank(b.assigned_to_email),
      instructions: non_blank(b.assignment_instructions),
      due_date:     optional_date("dueDate", b.due_date)?,
    })
  }
}

/// `PUT /inward/{id}/assign`
pub async fn assign<S, N>(
  State(state): State<AppState<S, N>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<AssignBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let assignment = Assignment::try_from(body)?;
  let team = assignment.team;

  let entry = state
    .store
    .assign_inward(id, assignment)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(reference = %entry.reference_no, %team, "inward entry assigned");

  let notification = dispatch(state.notifier.as_ref(), &entry).await;
  Ok(Json(json!({
    "success": true,
    "message": format!("Entry assigned to {team} team"),
    "entry": entry,
    "notification": notification,
  })))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /inward/{id}/status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
  #[serde(alias = "status")]
  pub assignment_status: Option<String>,
}

/// `PUT /inward/{id}/status`
pub async fn update_status<S, N>(
  State(state): State<AppState<S, N>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let status = optional_status(body.assignment_status)?
    .ok_or_else(|| Error::validation("assignmentStatus is required"))?;

  let entry = state
    .store
    .update_inward_status(id, status)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(reference = %entry.reference_no, %status, "inward status updated");

  Ok(Json(json!({
    "success": true,
    "message": "Status updated successfully",
    "entry": entry,
  })))
}
