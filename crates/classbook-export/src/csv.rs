//! CSV rendering. Rows end in `\n`; student names are always quoted.

use classbook_core::{
  attendance::AttendanceEntry,
  grade::{GradeEntry, Term, TermGrades},
  school::Student,
};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::sheet::{AttendanceSheet, GradeSheet};

/// Cell written where a student has no attendance entry for a date.
const MISSING: &str = "N/A";

/// Quote `s` unconditionally, doubling embedded quotes.
fn quoted(s: &str) -> String { format!("\"{}\"", s.replace('"', "\"\"")) }

/// Quote `s` only if it would otherwise break the row.
fn field(s: &str) -> String {
  if s.contains([',', '"', '\n', '\r']) {
    quoted(s)
  } else {
    s.to_owned()
  }
}

/// `Student ID,Student Name,<date>...`, one row per enrolled student; each
/// cell holds the lowercase status or `N/A`.
pub fn attendance_csv(
  subject_id: Uuid,
  students: &[Student],
  entries: &[AttendanceEntry],
) -> String {
  let sheet = AttendanceSheet::build(subject_id, students, entries);

  let mut out = String::from("Student ID,Student Name");
  for date in &sheet.dates {
    out.push(',');
    out.push_str(&date.format("%Y-%m-%d").to_string());
  }
  out.push('\n');

  for row in &sheet.rows {
    out.push_str(&field(&row.student_number));
    out.push(',');
    out.push_str(&quoted(&row.full_name));
    for cell in &row.cells {
      out.push(',');
      out.push_str(match cell {
        Some(status) => status.as_ref(),
        None => MISSING,
      });
    }
    out.push('\n');
  }
  out
}

fn push_terms(out: &mut String, grades: &TermGrades, fmt: impl Fn(f64) -> String) {
  for term in Term::iter() {
    out.push(',');
    out.push_str(&fmt(grades.get(term)));
  }
}

/// Raw grades, cumulative grades (two decimals) and the verdict for every
/// enrolled student.
pub fn grades_csv(
  subject_id: Uuid,
  students: &[Student],
  entries: &[GradeEntry],
) -> String {
  let sheet = GradeSheet::build(subject_id, students, entries);

  let mut out = String::from("Student ID,Student Name");
  for term in Term::iter() {
    out.push_str(&format!(",{} Raw", term.heading()));
  }
  for term in Term::iter() {
    out.push_str(&format!(",{} Cumulative", term.heading()));
  }
  out.push_str(",Status\n");

  for row in &sheet.rows {
    out.push_str(&field(&row.student_number));
    out.push(',');
    out.push_str(&quoted(&row.full_name));
    push_terms(&mut out, &row.summary.raw, |g| g.to_string());
    push_terms(&mut out, &row.summary.cumulative, |g| format!("{g:.2}"));
    out.push(',');
    out.push_str(row.summary.status.label());
    out.push('\n');
  }
  out
}
