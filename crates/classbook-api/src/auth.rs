//! Bearer-token authentication: password hashing, session tokens, and the
//! extractors that gate routes by role.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use classbook_core::{
  account::{Principal, Role},
  store::SchoolStore,
};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Passwords and tokens ────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

/// A fresh bearer token: 32 random bytes, hex-encoded.
pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The form a token is stored in. Only the digest ever reaches the database.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  let missing = || ApiError::Unauthorized("missing bearer token".into());
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(missing)?;
  value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(missing)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Any signed-in caller.
pub struct CurrentUser {
  pub principal:  Principal,
  /// Digest of the presented token, for closing the session.
  pub token_hash: String,
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: SchoolStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token_hash = token_digest(bearer_token(&parts.headers)?);
    let issued_after = Utc::now() - state.session_ttl;

    let account = state
      .store
      .resolve_session(&token_hash, issued_after)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| {
        tracing::warn!("rejected unknown or expired session token");
        ApiError::Unauthorized("invalid or expired session".into())
      })?;

    Ok(CurrentUser {
      principal: Principal::from(account),
      token_hash,
    })
  }
}

/// A signed-in teacher.
pub struct Teacher(pub Principal);

impl<S> FromRequestParts<AppState<S>> for Teacher
where
  S: SchoolStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser { principal, .. } =
      CurrentUser::from_request_parts(parts, state).await?;
    if principal.role != Role::Teacher {
      tracing::warn!(email = %principal.email, "student attempted a teacher route");
      return Err(ApiError::Forbidden("teacher access required".into()));
    }
    Ok(Teacher(principal))
  }
}

/// A signed-in student, with the linked student row.
pub struct StudentUser {
  pub principal:  Principal,
  pub student_id: Uuid,
}

impl<S> FromRequestParts<AppState<S>> for StudentUser
where
  S: SchoolStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser { principal, .. } =
      CurrentUser::from_request_parts(parts, state).await?;
    match (principal.role, principal.student_id) {
      (Role::Student, Some(student_id)) => Ok(StudentUser { principal, student_id }),
      _ => Err(ApiError::Forbidden("student access required".into())),
    }
  }
}
