//! Handlers for the teacher's daily attendance sheet.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/attendance/sheet?subject_id=&date=` | Unmarked students default to absent |
//! | `PUT`  | `/attendance` | Bulk upsert keyed on (date, subject, student) |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use classbook_core::{
  attendance::{AttendanceEntry, AttendanceStatus, AttendanceTally, StatusDisplay},
  school::Subject,
  store::{AttendanceQuery, SchoolStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Teacher, error::ApiError, grades::Saved, subjects};

// ─── Sheet ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SheetParams {
  pub subject_id: Uuid,
  pub date:       NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SheetRow {
  pub student_id:     Uuid,
  pub student_number: String,
  pub full_name:      String,
  pub status:         AttendanceStatus,
  pub display:        StatusDisplay,
  /// False when the status is the absent default rather than a stored entry.
  pub recorded:       bool,
}

#[derive(Debug, Serialize)]
pub struct AttendanceSheet {
  pub subject: Subject,
  pub date:    NaiveDate,
  pub rows:    Vec<SheetRow>,
  pub tally:   AttendanceTally,
}

/// `GET /attendance/sheet?subject_id=<uuid>&date=YYYY-MM-DD`
pub async fn sheet<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Query(params): Query<SheetParams>,
) -> Result<Json<AttendanceSheet>, ApiError>
where
  S: SchoolStore + 'static,
{
  let subject = subjects::require(state.store.as_ref(), params.subject_id).await?;

  let students = state
    .store
    .list_students(Some(subject.subject_id))
    .await
    .map_err(ApiError::store)?;
  let query = AttendanceQuery {
    subject_id: Some(subject.subject_id),
    date: Some(params.date),
    ..Default::default()
  };
  let entries = state
    .store
    .list_attendance(&query)
    .await
    .map_err(ApiError::store)?;

  let rows: Vec<SheetRow> = students
    .into_iter()
    .map(|s| {
      let stored = entries
        .iter()
        .find(|e| e.student_id == s.student_id)
        .map(|e| e.status);
      let status = stored.unwrap_or_default();
      SheetRow {
        student_id:     s.student_id,
        student_number: s.student_number,
        full_name:      s.full_name,
        status,
        display:        status.display(),
        recorded:       stored.is_some(),
      }
    })
    .collect();

  let mut tally = AttendanceTally::default();
  for row in &rows {
    tally.add(row.status);
  }

  Ok(Json(AttendanceSheet {
    subject,
    date: params.date,
    rows,
    tally,
  }))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecordInput {
  pub student_id: Uuid,
  pub status:     AttendanceStatus,
}

#[derive(Debug, Deserialize)]
pub struct SaveBody {
  pub subject_id: Uuid,
  pub date:       NaiveDate,
  pub records:    Vec<RecordInput>,
}

/// `PUT /attendance`
pub async fn save<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Json(body): Json<SaveBody>,
) -> Result<Json<Saved>, ApiError>
where
  S: SchoolStore + 'static,
{
  subjects::require(state.store.as_ref(), body.subject_id).await?;

  let entries: Vec<AttendanceEntry> = body
    .records
    .into_iter()
    .map(|r| AttendanceEntry {
      student_id: r.student_id,
      subject_id: body.subject_id,
      date:       body.date,
      status:     r.status,
    })
    .collect();

  let saved = entries.len();
  state
    .store
    .upsert_attendance(entries)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(subject_id = %body.subject_id, date = %body.date, saved, "saved attendance");
  Ok(Json(Saved { saved }))
}
