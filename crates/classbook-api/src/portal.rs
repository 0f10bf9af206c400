//! The signed-in student's own views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/student/dashboard` | Enrolled subject and attendance record counts |
//! | `GET`  | `/student/subjects` | Enrolled subjects |
//! | `GET`  | `/student/grades` | Optional `?subject_id=`; raw, cumulative, status |
//! | `GET`  | `/student/attendance` | Optional `?subject_id=`; date ascending, with tally |
//! | `GET`  | `/student/profile` | |
//! | `PUT`  | `/student/profile/photo` | Raw `image/*` body, at most 2 MiB |

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, header},
};
use bytes::Bytes;
use chrono::NaiveDate;
use classbook_core::{
  attendance::{AttendanceStatus, AttendanceTally, StatusDisplay},
  grade::{GradeSummary, TermGrades, summarize},
  school::{Student, Subject},
  store::{AttendanceQuery, GradeQuery, SchoolStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::StudentUser, error::ApiError};

/// The caller's student row; a login whose row is gone gets 404.
async fn own_record<S: SchoolStore>(store: &S, user: &StudentUser) -> Result<Student, ApiError> {
  store
    .get_student(user.student_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("student record not found".into()))
}

/// Enrolled subjects, optionally narrowed to one. Asking for a subject the
/// student is not enrolled in is a 404.
async fn enrolled_subjects<S: SchoolStore>(
  store: &S,
  student: &Student,
  only: Option<Uuid>,
) -> Result<Vec<Subject>, ApiError> {
  let ids: Vec<Uuid> = match only {
    Some(id) if student.is_enrolled(id) => vec![id],
    Some(id) => return Err(ApiError::NotFound(format!("not enrolled in subject {id}"))),
    None => student.subjects.clone(),
  };

  let mut subjects = Vec::with_capacity(ids.len());
  for id in ids {
    if let Some(subject) = store.get_subject(id).await.map_err(ApiError::store)? {
      subjects.push(subject);
    }
  }
  Ok(subjects)
}

#[derive(Debug, Deserialize)]
pub struct SubjectFilter {
  pub subject_id: Option<Uuid>,
}

// ─── Dashboard / subjects ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Dashboard {
  pub student_number:     String,
  pub full_name:          String,
  pub enrolled_subjects:  usize,
  pub attendance_records: usize,
}

/// `GET /student/dashboard`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  user: StudentUser,
) -> Result<Json<Dashboard>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = own_record(state.store.as_ref(), &user).await?;
  let query = AttendanceQuery {
    student_id: Some(student.student_id),
    subject_ids: student.subjects.clone(),
    ..Default::default()
  };
  let records = if student.subjects.is_empty() {
    0
  } else {
    state
      .store
      .list_attendance(&query)
      .await
      .map_err(ApiError::store)?
      .len()
  };

  Ok(Json(Dashboard {
    enrolled_subjects: student.subjects.len(),
    attendance_records: records,
    student_number: student.student_number,
    full_name: student.full_name,
  }))
}

/// `GET /student/subjects`
pub async fn subjects<S>(
  State(state): State<AppState<S>>,
  user: StudentUser,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = own_record(state.store.as_ref(), &user).await?;
  let subjects = enrolled_subjects(state.store.as_ref(), &student, None).await?;
  Ok(Json(subjects))
}

// ─── Grades ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubjectGrades {
  pub subject: Subject,
  #[serde(flatten)]
  pub summary: GradeSummary,
}

/// `GET /student/grades[?subject_id=<uuid>]`
pub async fn grades<S>(
  State(state): State<AppState<S>>,
  user: StudentUser,
  Query(filter): Query<SubjectFilter>,
) -> Result<Json<Vec<SubjectGrades>>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = own_record(state.store.as_ref(), &user).await?;
  let subjects = enrolled_subjects(state.store.as_ref(), &student, filter.subject_id).await?;
  if subjects.is_empty() {
    return Ok(Json(Vec::new()));
  }

  let query = GradeQuery {
    student_id: Some(student.student_id),
    subject_ids: subjects.iter().map(|s| s.subject_id).collect(),
    ..Default::default()
  };
  let entries = state.store.list_grades(&query).await.map_err(ApiError::store)?;

  let rows = subjects
    .into_iter()
    .map(|subject| {
      let raw =
        TermGrades::from_entries(entries.iter().filter(|e| e.subject_id == subject.subject_id));
      SubjectGrades {
        summary: summarize(raw),
        subject,
      }
    })
    .collect();
  Ok(Json(rows))
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AttendanceRecord {
  pub subject_id:   Uuid,
  pub subject_code: String,
  pub date:         NaiveDate,
  pub status:       AttendanceStatus,
  pub display:      StatusDisplay,
}

#[derive(Debug, Serialize)]
pub struct AttendanceHistory {
  pub records: Vec<AttendanceRecord>,
  pub tally:   AttendanceTally,
}

/// `GET /student/attendance[?subject_id=<uuid>]`
pub async fn attendance<S>(
  State(state): State<AppState<S>>,
  user: StudentUser,
  Query(filter): Query<SubjectFilter>,
) -> Result<Json<AttendanceHistory>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = own_record(state.store.as_ref(), &user).await?;
  let subjects = enrolled_subjects(state.store.as_ref(), &student, filter.subject_id).await?;
  if subjects.is_empty() {
    return Ok(Json(AttendanceHistory {
      records: Vec::new(),
      tally:   AttendanceTally::default(),
    }));
  }

  let query = AttendanceQuery {
    student_id: Some(student.student_id),
    subject_ids: subjects.iter().map(|s| s.subject_id).collect(),
    ..Default::default()
  };
  let entries = state
    .store
    .list_attendance(&query)
    .await
    .map_err(ApiError::store)?;

  let tally = AttendanceTally::from_entries(&entries);
  let records = entries
    .into_iter()
    .map(|e| AttendanceRecord {
      subject_code: subjects
        .iter()
        .find(|s| s.subject_id == e.subject_id)
        .map(|s| s.code.clone())
        .unwrap_or_default(),
      subject_id:   e.subject_id,
      date:         e.date,
      display:      e.status.display(),
      status:       e.status,
    })
    .collect();

  Ok(Json(AttendanceHistory { records, tally }))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Profile {
  pub student_id:     Uuid,
  pub student_number: String,
  pub full_name:      String,
  pub email:          String,
  pub photo:          Option<String>,
  /// Shown in place of a missing photo.
  pub initials:       String,
}

impl From<Student> for Profile {
  fn from(s: Student) -> Self {
    Profile {
      initials:       s.initials(),
      student_id:     s.student_id,
      student_number: s.student_number,
      full_name:      s.full_name,
      email:          s.email,
      photo:          s.photo,
    }
  }
}

/// `GET /student/profile`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  user: StudentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = own_record(state.store.as_ref(), &user).await?;
  Ok(Json(Profile::from(student)))
}

/// `PUT /student/profile/photo`. The body is the image itself.
pub async fn upload_photo<S>(
  State(state): State<AppState<S>>,
  user: StudentUser,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Profile>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = own_record(state.store.as_ref(), &user).await?;
  let content_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("");

  let url = state
    .photos
    .save(&student.student_number, content_type, &body)
    .await?;

  let updated = match state
    .store
    .set_student_photo(student.student_id, Some(url.clone()))
    .await
  {
    Ok(Some(updated)) => updated,
    Ok(None) => {
      state.photos.remove(&url).await;
      return Err(ApiError::NotFound("student record not found".into()));
    }
    Err(e) => {
      state.photos.remove(&url).await;
      return Err(ApiError::store(e));
    }
  };

  if let Some(old) = &student.photo {
    state.photos.remove(old).await;
  }

  tracing::info!(student_id = %student.student_id, %url, "updated profile photo");
  Ok(Json(Profile::from(updated)))
}
