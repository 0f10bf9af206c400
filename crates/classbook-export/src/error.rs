//! Error types for report rendering.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTML write error: {0}")]
  Html(String),

  #[error("rendered document is not UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
