//! Tabular views of one subject, shared by the CSV and HTML renderers.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use classbook_core::{
  attendance::{AttendanceEntry, AttendanceStatus},
  grade::{GradeEntry, GradeSummary, TermGrades, summarize},
  school::Student,
};
use uuid::Uuid;

// ─── Attendance ──────────────────────────────────────────────────────────────

pub struct AttendanceRow {
  pub student_number: String,
  pub full_name:      String,
  /// One cell per [`AttendanceSheet::dates`]; `None` where nothing was
  /// recorded.
  pub cells:          Vec<Option<AttendanceStatus>>,
}

/// Students down, recorded dates across.
pub struct AttendanceSheet {
  /// Every date with at least one entry for the subject, ascending.
  pub dates: Vec<NaiveDate>,
  pub rows:  Vec<AttendanceRow>,
}

impl AttendanceSheet {
  /// Entries for other subjects and students not enrolled in `subject_id`
  /// are ignored.
  pub fn build(
    subject_id: Uuid,
    students: &[Student],
    entries: &[AttendanceEntry],
  ) -> Self {
    let entries: Vec<&AttendanceEntry> =
      entries.iter().filter(|e| e.subject_id == subject_id).collect();

    let dates: Vec<NaiveDate> = entries
      .iter()
      .map(|e| e.date)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let by_key: HashMap<(Uuid, NaiveDate), AttendanceStatus> = entries
      .iter()
      .map(|e| ((e.student_id, e.date), e.status))
      .collect();

    let rows = students
      .iter()
      .filter(|s| s.is_enrolled(subject_id))
      .map(|s| AttendanceRow {
        student_number: s.student_number.clone(),
        full_name:      s.full_name.clone(),
        cells:          dates
          .iter()
          .map(|d| by_key.get(&(s.student_id, *d)).copied())
          .collect(),
      })
      .collect();

    AttendanceSheet { dates, rows }
  }
}

// ─── Grades ──────────────────────────────────────────────────────────────────

pub struct GradeRow {
  pub student_number: String,
  pub full_name:      String,
  pub summary:        GradeSummary,
}

pub struct GradeSheet {
  pub rows: Vec<GradeRow>,
}

impl GradeSheet {
  pub fn build(subject_id: Uuid, students: &[Student], entries: &[GradeEntry]) -> Self {
    let rows = students
      .iter()
      .filter(|s| s.is_enrolled(subject_id))
      .map(|s| {
        let raw = TermGrades::from_entries(entries.iter().filter(|e| {
          e.subject_id == subject_id && e.student_id == s.student_id
        }));
        GradeRow {
          student_number: s.student_number.clone(),
          full_name:      s.full_name.clone(),
          summary:        summarize(raw),
        }
      })
      .collect();

    GradeSheet { rows }
  }
}
