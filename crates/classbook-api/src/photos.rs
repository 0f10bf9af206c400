//! On-disk storage for student profile photos.
//!
//! Files live flat under one directory as `{student_number}-{unix_millis}.{ext}`
//! and are served back at `{url_prefix}/{file}`.

use std::{path::PathBuf, sync::Arc};

use axum::{
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Utc;

use crate::error::ApiError;

/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Where photos are written and the URL prefix they are served under.
#[derive(Debug, Clone)]
pub struct PhotoStore {
  dir:        PathBuf,
  url_prefix: String,
}

/// File extension for a supported image content type.
fn extension_for(content_type: &str) -> Option<&'static str> {
  let mime = content_type.split(';').next().unwrap_or("").trim();
  match mime.to_ascii_lowercase().as_str() {
    "image/png" => Some("png"),
    "image/jpeg" | "image/jpg" => Some("jpg"),
    "image/gif" => Some("gif"),
    "image/webp" => Some("webp"),
    "image/bmp" => Some("bmp"),
    _ => None,
  }
}

fn content_type_for(file: &str) -> &'static str {
  match file.rsplit_once('.').map(|(_, ext)| ext) {
    Some("png") => "image/png",
    Some("jpg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    Some("bmp") => "image/bmp",
    _ => "application/octet-stream",
  }
}

/// Flat file names only: no separators, no leading dot, no `..`.
pub fn is_safe_file_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('.')
    && !name.contains("..")
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Reduce a student number to characters that are safe in a file name.
fn file_stem(student_number: &str) -> String {
  student_number
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
    .collect()
}

impl PhotoStore {
  /// `public_url` is prepended to `/photos`; pass `""` for host-relative URLs.
  pub fn new(dir: impl Into<PathBuf>, public_url: &str) -> Self {
    Self {
      dir:        dir.into(),
      url_prefix: format!("{}/photos", public_url.trim_end_matches('/')),
    }
  }

  pub fn dir(&self) -> &std::path::Path { &self.dir }

  /// Validate and write an uploaded image; returns its public URL.
  pub async fn save(
    &self,
    student_number: &str,
    content_type: &str,
    bytes: &[u8],
  ) -> Result<String, ApiError> {
    if !content_type.trim_start().to_ascii_lowercase().starts_with("image/") {
      return Err(ApiError::BadRequest(format!(
        "expected an image, got {content_type:?}"
      )));
    }
    let ext = extension_for(content_type).ok_or_else(|| {
      ApiError::BadRequest(format!("unsupported image type {content_type:?}"))
    })?;
    if bytes.is_empty() {
      return Err(ApiError::BadRequest("empty photo".into()));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
      return Err(ApiError::PayloadTooLarge(format!(
        "photo exceeds {MAX_PHOTO_BYTES} bytes"
      )));
    }

    let file = format!(
      "{}-{}.{ext}",
      file_stem(student_number),
      Utc::now().timestamp_millis()
    );

    tokio::fs::create_dir_all(&self.dir)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    tokio::fs::write(self.dir.join(&file), bytes)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

    tracing::info!(%file, size = bytes.len(), "stored photo");
    Ok(format!("{}/{file}", self.url_prefix))
  }

  /// Decode a `data:image/...;base64,` URL and store it like an upload.
  pub async fn save_data_url(
    &self,
    student_number: &str,
    data_url: &str,
  ) -> Result<String, ApiError> {
    let malformed = || ApiError::BadRequest("malformed data URL".into());

    let rest = data_url.strip_prefix("data:").ok_or_else(malformed)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(malformed)?;
    let content_type = meta.strip_suffix(";base64").ok_or_else(malformed)?;

    let bytes = B64.decode(payload.trim()).map_err(|_| malformed())?;
    self.save(student_number, content_type, &bytes).await
  }

  /// Turn the `photo` field of an incoming request into what gets persisted:
  /// data URLs are stored on disk, anything else is kept as given.
  pub async fn resolve(
    &self,
    student_number: &str,
    photo: Option<String>,
  ) -> Result<Option<String>, ApiError> {
    match photo {
      Some(p) if p.starts_with("data:") => {
        Ok(Some(self.save_data_url(student_number, &p).await?))
      }
      Some(p) if p.trim().is_empty() => Ok(None),
      other => Ok(other),
    }
  }

  /// Delete the file behind `url` if it is one of ours. Failures are logged.
  pub async fn remove(&self, url: &str) {
    let Some(file) = url
      .strip_prefix(&self.url_prefix)
      .and_then(|rest| rest.strip_prefix('/'))
    else {
      return;
    };
    if !is_safe_file_name(file) {
      return;
    }
    if let Err(e) = tokio::fs::remove_file(self.dir.join(file)).await {
      tracing::warn!(%file, error = %e, "failed to remove photo");
    }
  }

  /// Read a stored photo by file name.
  pub async fn read(&self, file: &str) -> Result<(&'static str, Vec<u8>), ApiError> {
    let not_found = || ApiError::NotFound(format!("photo {file} not found"));
    if !is_safe_file_name(file) {
      return Err(not_found());
    }
    match tokio::fs::read(self.dir.join(file)).await {
      Ok(bytes) => Ok((content_type_for(file), bytes)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
      Err(e) => Err(ApiError::Store(Box::new(e))),
    }
  }
}

/// `GET /photos/{file}`
pub async fn serve(
  State(photos): State<Arc<PhotoStore>>,
  Path(file): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let (content_type, bytes) = photos.read(&file).await?;
  Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
