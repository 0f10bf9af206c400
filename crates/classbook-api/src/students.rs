//! Handlers for `/students` endpoints. Teacher only.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | Optional `?subject_id=<uuid>` |
//! | `POST`   | `/students` | Also creates the student's login; returns the credentials once |
//! | `GET`    | `/students/{id}` | 404 if not found |
//! | `PUT`    | `/students/{id}` | Name, email, enrollment, photo; login email follows |
//! | `DELETE` | `/students/{id}` | Cascades to grades, attendance, login and sessions |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use classbook_core::{
  account::{NewAccount, Role},
  school::{NewStudent, Student, StudentUpdate},
  store::SchoolStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Teacher, hash_password},
  error::ApiError,
  session::{check_email, normalize_email},
};

/// Password given to student logins created without an explicit one.
pub const DEFAULT_STUDENT_PASSWORD: &str = "password";

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("student {id} not found")) }

/// Every login email is unique, teachers included.
async fn ensure_login_free<S: SchoolStore>(store: &S, email: &str) -> Result<(), ApiError> {
  let taken = store
    .find_account_by_email(email)
    .await
    .map_err(ApiError::store)?
    .is_some();
  if taken {
    return Err(ApiError::Conflict(format!("a login for {email} already exists")));
  }
  Ok(())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subject_id: Option<Uuid>,
}

/// `GET /students[?subject_id=<uuid>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Student>>, ApiError>
where
  S: SchoolStore + 'static,
{
  let students = state
    .store
    .list_students(params.subject_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(students))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub student_number: String,
  pub full_name:      String,
  pub email:          String,
  #[serde(default)]
  pub subjects:       Vec<Uuid>,
  /// Photo URL, or a `data:image/...;base64,` URL to store.
  pub photo:          Option<String>,
  /// Initial login password; [`DEFAULT_STUDENT_PASSWORD`] when absent.
  pub password:       Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
  pub student:     Student,
  pub credentials: Credentials,
}

/// `POST /students`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let email = normalize_email(&body.email);
  check_email(&email)?;
  let password = body
    .password
    .filter(|p| !p.is_empty())
    .unwrap_or_else(|| DEFAULT_STUDENT_PASSWORD.to_owned());

  let input = NewStudent {
    student_number: body.student_number,
    full_name: body.full_name,
    email: email.clone(),
    photo: None,
    subjects: body.subjects,
  };
  input.validate()?;
  ensure_login_free(state.store.as_ref(), &email).await?;

  let photo = state.photos.resolve(input.student_number.trim(), body.photo).await?;
  let student = match state.store.add_student(NewStudent { photo: photo.clone(), ..input }).await {
    Ok(student) => student,
    Err(e) => {
      if let Some(url) = &photo {
        state.photos.remove(url).await;
      }
      return Err(ApiError::store(e));
    }
  };

  let account = state
    .store
    .add_account(NewAccount {
      email: email.clone(),
      password_hash: hash_password(&password)?,
      role: Role::Student,
      student_id: Some(student.student_id),
    })
    .await;

  if let Err(e) = account {
    // Without a login the student row is unusable; undo it.
    if let Err(cleanup) = state.store.delete_student(student.student_id).await {
      tracing::warn!(error = %cleanup, "failed to roll back student row");
    }
    if let Some(url) = &student.photo {
      state.photos.remove(url).await;
    }
    return Err(ApiError::store(e));
  }

  tracing::info!(
    student_id = %student.student_id,
    number = %student.student_number,
    "created student"
  );
  Ok((
    StatusCode::CREATED,
    Json(CreateResponse {
      student,
      credentials: Credentials { email, password },
    }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = state
    .store
    .get_student(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(student))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub full_name: String,
  pub email:     String,
  /// Omitted keeps the current enrollment; `[]` unenrolls from everything.
  pub subjects:  Option<Vec<Uuid>>,
  /// Omitted keeps the current photo; `""` clears it; a data URL replaces it.
  pub photo:     Option<String>,
}

/// `PUT /students/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Student>, ApiError>
where
  S: SchoolStore + 'static,
{
  let current = state
    .store
    .get_student(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  let email = normalize_email(&body.email);
  check_email(&email)?;
  if body.full_name.trim().is_empty() {
    return Err(classbook_core::Error::MissingField("full_name").into());
  }

  let stores_new_photo = body.photo.as_deref().is_some_and(|p| p.starts_with("data:"));
  let photo = match body.photo {
    Some(p) => state.photos.resolve(&current.student_number, Some(p)).await?,
    None => current.photo.clone(),
  };

  // The store moves the login email in the same transaction.
  let result = state
    .store
    .update_student(id, StudentUpdate {
      full_name: body.full_name,
      email,
      photo: photo.clone(),
      subjects: body.subjects.unwrap_or_else(|| current.subjects.clone()),
    })
    .await;

  let updated = match result {
    Ok(Some(updated)) => updated,
    failed => {
      if let Some(url) = photo.as_ref().filter(|_| stores_new_photo) {
        state.photos.remove(url).await;
      }
      return Err(match failed {
        Err(e) => ApiError::store(e),
        Ok(_) => not_found(id),
      });
    }
  };

  if let Some(old) = current.photo.as_ref().filter(|old| updated.photo.as_ref() != Some(*old)) {
    state.photos.remove(old).await;
  }

  tracing::info!(student_id = %id, "updated student");
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /students/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  _teacher: Teacher,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore + 'static,
{
  let student = state
    .store
    .get_student(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  if !state.store.delete_student(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }
  if let Some(url) = &student.photo {
    state.photos.remove(url).await;
  }

  tracing::info!(student_id = %id, "deleted student");
  Ok(StatusCode::NO_CONTENT)
}
