//! JSON REST API for Classbook.
//!
//! Exposes an axum [`Router`] backed by any [`classbook_core::store::SchoolStore`].
//! Callers authenticate with `Authorization: Bearer <token>` obtained from
//! `/auth/login`; teacher and student routes are gated by role.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .nest("/api", classbook_api::api_router(state.clone()))
//!   .merge(classbook_api::photo_router(state.photos.clone()))
//! ```

pub mod attendance;
pub mod auth;
pub mod error;
pub mod grades;
pub mod photos;
pub mod portal;
pub mod reports;
pub mod session;
pub mod students;
pub mod subjects;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{DefaultBodyLimit, State},
  routing::{get, post, put},
};
use classbook_core::store::{Counts, SchoolStore};

pub use error::ApiError;
pub use photos::PhotoStore;

use auth::Teacher;
use photos::MAX_PHOTO_BYTES;

/// Student create/update bodies may carry a base64 data-URL photo.
const STUDENT_BODY_LIMIT: usize = MAX_PHOTO_BYTES * 2;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S: SchoolStore> {
  pub store:       Arc<S>,
  pub photos:      Arc<PhotoStore>,
  /// Sessions older than this no longer authenticate.
  pub session_ttl: chrono::Duration,
}

impl<S: SchoolStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      photos:      Arc::clone(&self.photos),
      session_ttl: self.session_ttl,
    }
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SchoolStore + 'static,
{
  Router::new()
    // Session
    .route("/auth/register", post(session::register::<S>))
    .route("/auth/login", post(session::login::<S>))
    .route("/auth/logout", post(session::logout::<S>))
    .route("/auth/me", get(session::me::<S>))
    // Teacher
    .route("/teacher/dashboard", get(dashboard::<S>))
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .put(subjects::update::<S>)
        .delete(subjects::delete::<S>),
    )
    .route(
      "/students",
      get(students::list::<S>)
        .post(students::create::<S>)
        .layer(DefaultBodyLimit::max(STUDENT_BODY_LIMIT)),
    )
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .put(students::update::<S>)
        .delete(students::delete::<S>)
        .layer(DefaultBodyLimit::max(STUDENT_BODY_LIMIT)),
    )
    .route("/grades/sheet", get(grades::sheet::<S>))
    .route("/grades", put(grades::save::<S>))
    .route("/attendance/sheet", get(attendance::sheet::<S>))
    .route("/attendance", put(attendance::save::<S>))
    .route("/reports/{subject_id}/attendance.csv", get(reports::attendance_csv::<S>))
    .route("/reports/{subject_id}/grades.csv", get(reports::grades_csv::<S>))
    .route("/reports/{subject_id}/attendance.html", get(reports::attendance_html::<S>))
    .route("/reports/{subject_id}/grades.html", get(reports::grades_html::<S>))
    // Student
    .route("/student/dashboard", get(portal::dashboard::<S>))
    .route("/student/subjects", get(portal::subjects::<S>))
    .route("/student/grades", get(portal::grades::<S>))
    .route("/student/attendance", get(portal::attendance::<S>))
    .route("/student/profile", get(portal::profile::<S>))
    .route(
      "/student/profile/photo",
      put(portal::upload_photo::<S>).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
    )
    .with_state(state)
}

/// Serves stored photos at `/photos/{file}`. Public, like the URLs it backs.
pub fn photo_router(photos: Arc<PhotoStore>) -> Router<()> {
  Router::new()
    .route("/photos/{file}", get(photos::serve))
    .with_state(photos)
}

// ─── Teacher dashboard ───────────────────────────────────────────────────────

/// `GET /teacher/dashboard`: row counts across the school.
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  Teacher(principal): Teacher,
) -> Result<Json<Counts>, ApiError>
where
  S: SchoolStore + 'static,
{
  let counts = state.store.counts().await.map_err(ApiError::store)?;
  tracing::debug!(teacher = %principal.username, ?counts, "dashboard");
  Ok(Json(counts))
}
