//! Report rendering for Classbook.
//!
//! Turns one subject's students, grades and attendance into downloadable CSV
//! or a standalone printable HTML document. Pure synchronous; no HTTP or
//! database dependencies.
//!
//! Only students enrolled in the subject appear in a report.

mod csv;
pub mod error;
mod html;
mod sheet;

pub use csv::{attendance_csv, grades_csv};
pub use error::{Error, Result};
pub use html::{attendance_html, grades_html};
pub use sheet::{AttendanceRow, AttendanceSheet, GradeRow, GradeSheet};

use classbook_core::school::Subject;

/// What a report covers; decides the download file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
  Attendance,
  Grades,
}

impl ReportKind {
  fn suffix(self) -> &'static str {
    match self {
      ReportKind::Attendance => "attendance",
      ReportKind::Grades => "grades",
    }
  }
}

/// Download name for a report, e.g. `CS101_attendance.csv`.
///
/// Characters that are unsafe in a `Content-Disposition` file name are
/// replaced with `_`.
pub fn file_name(subject: &Subject, kind: ReportKind, extension: &str) -> String {
  let code: String = subject
    .code
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
        c
      } else {
        '_'
      }
    })
    .collect();
  format!("{code}_{}.{extension}", kind.suffix())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn file_name_uses_subject_code() {
    let subject = Subject {
      subject_id:  Uuid::new_v4(),
      code:        "CS 101/\"A\"".into(),
      name:        "Intro".into(),
      semester:    "1st".into(),
      school_year: "2024-2025".into(),
      created_at:  Utc::now(),
    };
    assert_eq!(
      file_name(&subject, ReportKind::Grades, "csv"),
      "CS_101__A__grades.csv"
    );
    assert_eq!(
      file_name(&subject, ReportKind::Attendance, "html"),
      "CS_101__A__attendance.html"
    );
  }
}
