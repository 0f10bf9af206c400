//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Teacher sign-up; `password` must equal `confirm_password` |
//! | `POST` | `/auth/login` | Returns a bearer token and the role's landing page |
//! | `POST` | `/auth/logout` | Closes the presented session |
//! | `GET`  | `/auth/me` | The signed-in principal |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use classbook_core::{
  account::{Account, NewAccount, Principal, Role},
  store::SchoolStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{CurrentUser, hash_password, new_token, token_digest, verify_password},
  error::ApiError,
};

/// Emails are compared case-insensitively by storing them lowercased.
pub(crate) fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

pub(crate) fn check_email(email: &str) -> Result<(), ApiError> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(ApiError::BadRequest(format!("invalid email {email:?}"))),
  }
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:            String,
  pub password:         String,
  pub confirm_password: String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let email = normalize_email(&body.email);
  check_email(&email)?;
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  if body.password != body.confirm_password {
    return Err(ApiError::BadRequest("passwords do not match".into()));
  }

  let account: Account = state
    .store
    .add_account(NewAccount {
      email,
      password_hash: hash_password(&body.password)?,
      role: Role::Teacher,
      student_id: None,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(email = %account.email, "registered teacher account");
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:    String,
  pub role:     Role,
  /// Where the client should navigate next.
  pub redirect: &'static str,
  pub user:     Principal,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: SchoolStore + 'static,
{
  let email = normalize_email(&body.email);
  let rejected = || {
    tracing::warn!(%email, "failed login");
    ApiError::Unauthorized("invalid email or password".into())
  };

  let account = state
    .store
    .find_account_by_email(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(rejected)?;

  if !verify_password(&body.password, &account.password_hash) {
    return Err(rejected());
  }

  let token = new_token();
  state
    .store
    .open_session(account.account_id, token_digest(&token))
    .await
    .map_err(ApiError::store)?;

  // Expired rows are only ever rejected; sweep them while we are writing.
  if let Err(e) = state.store.prune_sessions(Utc::now() - state.session_ttl).await {
    tracing::warn!(error = %e, "failed to prune expired sessions");
  }

  let role = account.role;
  tracing::info!(email = %account.email, %role, "signed in");
  Ok(Json(LoginResponse {
    token,
    role,
    redirect: role.home_path(),
    user: Principal::from(account),
  }))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore + 'static,
{
  state
    .store
    .close_session(&user.token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me<S>(
  State(_state): State<AppState<S>>,
  user: CurrentUser,
) -> Json<Principal>
where
  S: SchoolStore + 'static,
{
  Json(user.principal)
}
