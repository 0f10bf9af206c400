//! Error type for `classbook-store-sqlite`.

use classbook_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] classbook_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A UNIQUE constraint rejected the write (duplicate email, student number).
  #[error("conflict: {0}")]
  Conflict(String),

  /// A write referenced a student or subject that does not exist.
  #[error("unknown reference: {0}")]
  MissingReference(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Translate SQLite constraint failures into [`Error::Conflict`] or
  /// [`Error::MissingReference`]; everything else passes through.
  pub(crate) fn from_write(err: tokio_rusqlite::Error, what: &str) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      ref failure,
      _,
    )) = err
    {
      match failure.extended_code {
        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
          return Error::Conflict(format!("{what} already exists"));
        }
        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
          return Error::MissingReference(what.to_owned());
        }
        _ => {}
      }
    }
    Error::Database(err)
  }
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Error::Conflict(_) => StoreErrorKind::Conflict,
      Error::MissingReference(_) => StoreErrorKind::MissingReference,
      Error::Core(_) => StoreErrorKind::Invalid,
      Error::Database(_)
      | Error::Json(_)
      | Error::Uuid(_)
      | Error::DateParse(_) => StoreErrorKind::Internal,
    }
  }
}
