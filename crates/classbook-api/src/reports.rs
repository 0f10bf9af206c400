//! Report downloads for one subject. Teacher only.
//!
//! CSV files are served as attachments named `{code}_attendance.csv` /
//! `{code}_grades.csv`; HTML reports are served inline, ready to print.

use axum::{
  extract::{Path, State},
  http::header,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use classbook_core::{
  school::{Student, Subject},
  store::{AttendanceQuery, GradeQuery, SchoolStore},
};
use classbook_export::ReportKind;
use uuid::Uuid;

use crate::{AppState, auth::Teacher, error::ApiError, subjects};

fn csv_download(subject: &Subject, kind: ReportKind, body: String) -> Response {
  let name = classbook_export::file_name(subject, kind, "csv");
  let headers = [
    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
    (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
  ];
  (headers, body).into_response()
}

fn html_page(subject: &Subject, kind: ReportKind, body: String) -> Response {
  let name = classbook_export::file_name(subject, kind, "html");
  let headers = [
    (header::CONTENT_TYPE, "text/html; charset=utf-8".to_owned()),
    (header::CONTENT_DISPOSITION, format!("inline; filename=\"{name}\"")),
  ];
  (headers, body).into_response()
}

/// The subject and its enrolled students.
async fn roster<S: SchoolStore>(
  store: &S,
  subject_id: Uuid,
) -> Result<(Subject, Vec<Student>), ApiError> {
  let subject = subjects::require(store, subject_id).await?;
  let students = store
    .list_students(Some(subject_id))
    .await
    .map_err(ApiError::store)?;
  Ok((subject, students))
}

fn attendance_query(subject_id: Uuid) -> AttendanceQuery {
  AttendanceQuery {
    subject_id: Some(subject_id),
    ..Default::default()
  }
}

fn grade_query(subject_id: Uuid) -> GradeQuery {
  GradeQuery {
    subject_id: Some(subject_id),
    ..Default::default()
  }
}

/// `GET /reports/{subject_id}/attendance.csv`
pub async fn attendance_csv<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: SchoolStore + 'static,
{
  let (subject, students) = roster(state.store.as_ref(), subject_id).await?;
  let entries = state
    .store
    .list_attendance(&attendance_query(subject_id))
    .await
    .map_err(ApiError::store)?;

  let body = classbook_export::attendance_csv(subject_id, &students, &entries);
  tracing::info!(code = %subject.code, "exported attendance csv");
  Ok(csv_download(&subject, ReportKind::Attendance, body))
}

/// `GET /reports/{subject_id}/grades.csv`
pub async fn grades_csv<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: SchoolStore + 'static,
{
  let (subject, students) = roster(state.store.as_ref(), subject_id).await?;
  let entries = state
    .store
    .list_grades(&grade_query(subject_id))
    .await
    .map_err(ApiError::store)?;

  let body = classbook_export::grades_csv(subject_id, &students, &entries);
  tracing::info!(code = %subject.code, "exported grades csv");
  Ok(csv_download(&subject, ReportKind::Grades, body))
}

/// `GET /reports/{subject_id}/attendance.html`
pub async fn attendance_html<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: SchoolStore + 'static,
{
  let (subject, students) = roster(state.store.as_ref(), subject_id).await?;
  let entries = state
    .store
    .list_attendance(&attendance_query(subject_id))
    .await
    .map_err(ApiError::store)?;

  let body = classbook_export::attendance_html(&subject, &students, &entries, Utc::now())?;
  Ok(html_page(&subject, ReportKind::Attendance, body))
}

/// `GET /reports/{subject_id}/grades.html`
pub async fn grades_html<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(subject_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: SchoolStore + 'static,
{
  let (subject, students) = roster(state.store.as_ref(), subject_id).await?;
  let entries = state
    .store
    .list_grades(&grade_query(subject_id))
    .await
    .map_err(ApiError::store)?;

  let body = classbook_export::grades_html(&subject, &students, &entries, Utc::now())?;
  Ok(html_page(&subject, ReportKind::Grades, body))
}
