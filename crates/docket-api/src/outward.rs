//! Handlers for `/outward` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/outward` | Optional `?team`, `startDate`, `endDate` (on `sentAt`) |
//! | `POST` | `/outward` | Body: [`CreateOutwardBody`]; returns 201 + the entry |
//! | `GET`  | `/outward/expenditure` | Same filters as the list; count and total postage |
//! | `GET`  | `/outward/{id}` | 404 if not found |
//!
//! A `linkedInwardId` that does not resolve rejects the whole request. Once
//! the outward entry is written, the linked inward entry is completed on a
//! best-effort basis and the result is reported in the `linkage` field.

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
  entry::{NewOutward, non_blank},
  notify::Notifier,
  store::{EntryStore, OutwardFilter},
  team::Team,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  error::ApiError,
  params::{
    RangeParams, optional_date, optional_id, optional_number, optional_team, required_instant,
    required_text,
  },
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub team:  Option<String>,
  #[serde(flatten)]
  pub range: RangeParams,
}

impl TryFrom<ListParams> for OutwardFilter {
  type Error = Error;

  fn try_from(p: ListParams) -> Result<Self, Error> {
    Ok(OutwardFilter { team: optional_team(p.team)?, sent: p.range.into_range()? })
  }
}

/// `GET /outward[?team=..][&startDate=..][&endDate=..]`
pub async fn list<S, N>(
  State(state): State<AppState<S, N>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Query(params) = params?;
  let filter = OutwardFilter::try_from(params)?;
  let entries = state
    .store
    .list_outward(&filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "entries": entries })))
}

/// `GET /outward/expenditure[?team=..][&startDate=..][&endDate=..]`
pub async fn expenditure<S, N>(
  State(state): State<AppState<S, N>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Query(params) = params?;
  let filter = OutwardFilter::try_from(params)?;
  let expenditure = state
    .store
    .outward_expenditure(&filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "expenditure": expenditure })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /outward/{id}`
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
    .get_outward(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "entry": entry })))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /outward`.
///
/// `postalTariff` and `linkedInwardId` may be numbers or numeric text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutwardBody {
  pub means:             Option<String>,
  pub to_whom:           Option<String>,
  pub subject:           Option<String>,
  pub sent_by:           Option<String>,
  #[serde(alias = "signReceiptDateTime")]
  pub sent_at:           Option<String>,
  pub file_reference:    Option<String>,
  pub postal_tariff:     Option<Value>,
  pub due_date:          Option<String>,
  #[serde(default)]
  pub case_closed:       bool,
  pub linked_inward_id:  Option<Value>,
  pub created_by_team:   Option<String>,
  pub team_member_email: Option<String>,
}

impl TryFrom<CreateOutwardBody> for NewOutward {
  type Error = Error;

  fn try_from(b: CreateOutwardBody) -> Result<Self, Error> {
    let team = required_text("createdByTeam", b.created_by_team)?;
    Ok(NewOutward {
      means:             required_text("means", b.means)?,
      to_whom:           required_text("toWhom", b.to_whom)?,
      subject:           required_text("subject", b.subject)?,
      sent_by:           required_text("sentBy", b.sent_by)?,
      sent_at:           required_instant("sentAt", b.sent_at)?,
      file_reference:    non_blank(b.file_reference),
      postal_tariff:     optional_number("postalTariff", b.postal_tariff)?.unwrap_or(0.0),
      due_date:          optional_date("dueDate", b.due_date)?,
      case_closed:       b.case_closed,
      linked_inward_id:  optional_id("linkedInwardId", b.linked_inward_id)?,
      created_by_team:   Team::parse(&team)?,
      team_member_email: non_blank(b.team_member_email),
    })
  }
}

/// `POST /outward` returns 201 + the stored entry and any linkage outcome.
pub async fn create<S, N>(
  State(state): State<AppState<S, N>>,
  body: Result<Json<CreateOutwardBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
  N: Notifier,
{
  let Json(body) = body?;
  let input = NewOutward::try_from(body)?;
  let created = state
    .store
    .create_outward(input)
    .await
    .map_err(ApiError::from_store)?;
  let entry = created.entry;
  tracing::info!(reference = %entry.reference_no, team = %entry.created_by_team, "outward entry created");

  if let Some(outcome) = &created.linkage {
    if outcome.is_failure() {
      tracing::warn!(reference = %entry.reference_no, inward_id = outcome.inward_id(), ?outcome, "linked inward entry not completed");
    } else {
      tracing::info!(reference = %entry.reference_no, inward_id = outcome.inward_id(), ?outcome, "linked inward entry");
    }
  }

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "message": "Outward entry created successfully",
      "id": entry.id,
      "referenceNo": entry.reference_no,
      "entry": entry,
      "linkage": created.linkage,
    })),
  ))
}
