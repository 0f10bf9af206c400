//! Handlers for the teacher's grade sheet.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/grades/sheet?subject_id=` | Enrolled students with raw, cumulative and status |
//! | `PUT`  | `/grades` | Bulk upsert keyed on (subject, student, term) |

use axum::{
  Json,
  extract::{Query, State},
};
use classbook_core::{
  grade::{GradeEntry, GradeStatus, Term, TermGrades, summarize, validate_raw_grade},
  school::Subject,
  store::{GradeQuery, SchoolStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Teacher, error::ApiError, subjects};

// ─── Sheet ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SheetParams {
  pub subject_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SheetRow {
  pub student_id:     Uuid,
  pub student_number: String,
  pub full_name:      String,
  pub raw:            TermGrades,
  pub cumulative:     TermGrades,
  pub status:         GradeStatus,
}

#[derive(Debug, Serialize)]
pub struct GradeSheet {
  pub subject: Subject,
  pub rows:    Vec<SheetRow>,
}

/// `GET /grades/sheet?subject_id=<uuid>`
pub async fn sheet<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Query(params): Query<SheetParams>,
) -> Result<Json<GradeSheet>, ApiError>
where
  S: SchoolStore + 'static,
{
  let subject = subjects::require(state.store.as_ref(), params.subject_id).await?;

  let students = state
    .store
    .list_students(Some(subject.subject_id))
    .await
    .map_err(ApiError::store)?;
  let query = GradeQuery {
    subject_id: Some(subject.subject_id),
    ..Default::default()
  };
  let entries = state.store.list_grades(&query).await.map_err(ApiError::store)?;

  let rows = students
    .into_iter()
    .map(|s| {
      let raw = TermGrades::from_entries(entries.iter().filter(|e| e.student_id == s.student_id));
      let summary = summarize(raw);
      SheetRow {
        student_id:     s.student_id,
        student_number: s.student_number,
        full_name:      s.full_name,
        raw:            summary.raw,
        cumulative:     summary.cumulative,
        status:         summary.status,
      }
    })
    .collect();

  tracing::debug!(subject_id = %subject.subject_id, "grade sheet");
  Ok(Json(GradeSheet { subject, rows }))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GradeInput {
  pub student_id: Uuid,
  pub term:       Term,
  pub grade:      f64,
}

#[derive(Debug, Deserialize)]
pub struct SaveBody {
  pub subject_id: Uuid,
  pub grades:     Vec<GradeInput>,
}

#[derive(Debug, Serialize)]
pub struct Saved {
  pub saved: usize,
}

/// `PUT /grades`. Every grade is validated before any is written.
pub async fn save<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Json(body): Json<SaveBody>,
) -> Result<Json<Saved>, ApiError>
where
  S: SchoolStore + 'static,
{
  subjects::require(state.store.as_ref(), body.subject_id).await?;

  let entries = body
    .grades
    .into_iter()
    .map(|g| {
      Ok(GradeEntry {
        student_id: g.student_id,
        subject_id: body.subject_id,
        term:       g.term,
        grade:      validate_raw_grade(g.grade)?,
      })
    })
    .collect::<Result<Vec<_>, classbook_core::Error>>()?;

  let saved = entries.len();
  state.store.upsert_grades(entries).await.map_err(ApiError::store)?;

  tracing::info!(subject_id = %body.subject_id, saved, "saved grades");
  Ok(Json(Saved { saved }))
}
