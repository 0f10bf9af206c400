//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, attendance dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings, and enrollment lists are compact JSON.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use classbook_core::{
  account::{Account, Role},
  attendance::{AttendanceEntry, AttendanceStatus},
  grade::{GradeEntry, Term},
  school::{Student, Subject},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Fixed-width so that text ordering matches chronological ordering.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

pub fn encode_subject_ids(ids: &[Uuid]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_subject_ids(s: &str) -> Result<Vec<Uuid>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSubject`]'s field order.
pub const SUBJECT_COLUMNS: &str =
  "subject_id, code, name, semester, school_year, created_at";

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:  String,
  pub code:        String,
  pub name:        String,
  pub semester:    String,
  pub school_year: String,
  pub created_at:  String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawSubject {
      subject_id:  row.get(0)?,
      code:        row.get(1)?,
      name:        row.get(2)?,
      semester:    row.get(3)?,
      school_year: row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:  decode_uuid(&self.subject_id)?,
      code:        self.code,
      name:        self.name,
      semester:    self.semester,
      school_year: self.school_year,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawStudent`]'s field order.
pub const STUDENT_COLUMNS: &str = "student_id, student_number, full_name, \
                                   email, photo, subjects, created_at, \
                                   updated_at";

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub student_id:     String,
  pub student_number: String,
  pub full_name:      String,
  pub email:          String,
  pub photo:          Option<String>,
  pub subjects:       String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawStudent {
      student_id:     row.get(0)?,
      student_number: row.get(1)?,
      full_name:      row.get(2)?,
      email:          row.get(3)?,
      photo:          row.get(4)?,
      subjects:       row.get(5)?,
      created_at:     row.get(6)?,
      updated_at:     row.get(7)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id:     decode_uuid(&self.student_id)?,
      student_number: self.student_number,
      full_name:      self.full_name,
      email:          self.email,
      photo:          self.photo,
      subjects:       decode_subject_ids(&self.subjects)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `grades` row.
pub struct RawGrade {
  pub student_id: String,
  pub subject_id: String,
  pub term:       String,
  pub grade:      f64,
}

impl RawGrade {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawGrade {
      student_id: row.get(0)?,
      subject_id: row.get(1)?,
      term:       row.get(2)?,
      grade:      row.get(3)?,
    })
  }

  pub fn into_entry(self) -> Result<GradeEntry> {
    Ok(GradeEntry {
      student_id: decode_uuid(&self.student_id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      term:       Term::parse(&self.term)?,
      grade:      self.grade,
    })
  }
}

/// Raw strings read from an `attendance` row.
pub struct RawAttendance {
  pub student_id: String,
  pub subject_id: String,
  pub date:       String,
  pub status:     String,
}

impl RawAttendance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAttendance {
      student_id: row.get(0)?,
      subject_id: row.get(1)?,
      date:       row.get(2)?,
      status:     row.get(3)?,
    })
  }

  pub fn into_entry(self) -> Result<AttendanceEntry> {
    Ok(AttendanceEntry {
      student_id: decode_uuid(&self.student_id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      date:       decode_date(&self.date)?,
      status:     AttendanceStatus::parse(&self.status)?,
    })
  }
}

/// Column list matching [`RawAccount`]'s field order.
pub const ACCOUNT_COLUMNS: &str =
  "account_id, email, password_hash, role, student_id, created_at";

/// Raw strings read from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub student_id:    Option<String>,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAccount {
      account_id:    row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      role:          row.get(3)?,
      student_id:    row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      role:          Role::parse(&self.role)?,
      student_id:    self.student_id.as_deref().map(decode_uuid).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
