//! Error types for `classbook-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("grade {0} is outside the accepted range (0 or 1.0 to 5.0)")]
  GradeOutOfRange(f64),

  #[error("unknown term: {0:?}")]
  UnknownTerm(String),

  #[error("unknown attendance status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
