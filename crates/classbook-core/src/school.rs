//! Subjects and students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Semester assigned when a subject is created without one.
pub const DEFAULT_SEMESTER: &str = "1st";

// ─── Subject ─────────────────────────────────────────────────────────────────

/// A subject offering for one semester of one school year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:  Uuid,
  /// Short catalogue code, e.g. `CS101`. Used in export file names.
  pub code:        String,
  pub name:        String,
  pub semester:    String,
  pub school_year: String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::SchoolStore::add_subject`] and
/// [`crate::store::SchoolStore::update_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectInput {
  pub code:        String,
  pub name:        String,
  #[serde(default = "default_semester")]
  pub semester:    String,
  #[serde(default)]
  pub school_year: String,
}

fn default_semester() -> String { DEFAULT_SEMESTER.to_owned() }

impl SubjectInput {
  /// Code and name are required; whitespace-only counts as missing.
  pub fn validate(&self) -> Result<()> {
    if self.code.trim().is_empty() {
      return Err(Error::MissingField("code"));
    }
    if self.name.trim().is_empty() {
      return Err(Error::MissingField("name"));
    }
    Ok(())
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id:     Uuid,
  /// Institution-assigned student number (not the row identifier).
  pub student_number: String,
  pub full_name:      String,
  pub email:          String,
  /// URL of the profile photo, if one was uploaded.
  pub photo:          Option<String>,
  /// Enrolled subject identifiers.
  pub subjects:       Vec<Uuid>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Student {
  pub fn is_enrolled(&self, subject_id: Uuid) -> bool {
    self.subjects.contains(&subject_id)
  }

  /// First letter of each name part, e.g. "Maria Clara Santos" → "MCS".
  pub fn initials(&self) -> String {
    self
      .full_name
      .split_whitespace()
      .filter_map(|part| part.chars().next())
      .collect()
  }
}

/// Input to [`crate::store::SchoolStore::add_student`].
#[derive(Debug, Clone)]
pub struct NewStudent {
  pub student_number: String,
  pub full_name:      String,
  pub email:          String,
  pub photo:          Option<String>,
  pub subjects:       Vec<Uuid>,
}

impl NewStudent {
  pub fn validate(&self) -> Result<()> {
    if self.student_number.trim().is_empty() {
      return Err(Error::MissingField("student_number"));
    }
    if self.full_name.trim().is_empty() {
      return Err(Error::MissingField("full_name"));
    }
    if self.email.trim().is_empty() {
      return Err(Error::MissingField("email"));
    }
    Ok(())
  }
}

/// Full replacement of a student's editable fields. The student number is
/// fixed at creation.
#[derive(Debug, Clone)]
pub struct StudentUpdate {
  pub full_name: String,
  pub email:     String,
  pub photo:     Option<String>,
  pub subjects:  Vec<Uuid>,
}
