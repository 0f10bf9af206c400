//! Handlers for `/subjects` endpoints. Teacher only.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Newest first |
//! | `POST`   | `/subjects` | Body: `{"code","name","semester"?,"school_year"?}` |
//! | `GET`    | `/subjects/{id}` | 404 if not found |
//! | `PUT`    | `/subjects/{id}` | Full replacement |
//! | `DELETE` | `/subjects/{id}` | Also drops its grades, attendance and enrollments |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use classbook_core::{
  school::{Subject, SubjectInput},
  store::SchoolStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Teacher, error::ApiError};

pub(crate) fn not_found(id: Uuid) -> ApiError {
  ApiError::NotFound(format!("subject {id} not found"))
}

/// Fetch a subject or fail with 404.
pub(crate) async fn require<S: SchoolStore>(store: &S, id: Uuid) -> Result<Subject, ApiError> {
  store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: SchoolStore + 'static,
{
  let subjects = state.store.list_subjects().await.map_err(ApiError::store)?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Json(body): Json<SubjectInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let subject = state.store.add_subject(body).await.map_err(ApiError::store)?;
  tracing::info!(subject_id = %subject.subject_id, code = %subject.code, "created subject");
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get / update / delete ────────────────────────────────────────────────────

/// `GET /subjects/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(require(state.store.as_ref(), id).await?))
}

/// `PUT /subjects/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(id): Path<Uuid>,
  Json(body): Json<SubjectInput>,
) -> Result<Json<Subject>, ApiError>
where
  S: SchoolStore + 'static,
{
  let subject = state
    .store
    .update_subject(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  tracing::info!(subject_id = %id, "updated subject");
  Ok(Json(subject))
}

/// `DELETE /subjects/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore + 'static,
{
  if !state.store.delete_subject(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }
  tracing::info!(subject_id = %id, "deleted subject");
  Ok(StatusCode::NO_CONTENT)
}
