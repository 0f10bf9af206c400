//! Attendance entries and their display classification.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  Present,
  /// Unmarked students on a fresh attendance sheet start out absent.
  #[default]
  Absent,
  Late,
  Excused,
}

impl AttendanceStatus {
  pub fn parse(s: &str) -> Result<Self> {
    AttendanceStatus::from_str(s).map_err(|_| Error::UnknownStatus(s.to_owned()))
  }

  pub fn display(self) -> StatusDisplay { classify(self.as_ref()) }
}

/// Colour family used to render a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
  Green,
  Red,
  Yellow,
  Blue,
}

/// Label and colour for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
  pub label: &'static str,
  pub color: ColorCategory,
}

/// Map a status string to its display. Any unrecognised value renders the
/// same way as `absent`.
pub fn classify(status: &str) -> StatusDisplay {
  match status {
    "present" => StatusDisplay { label: "Present", color: ColorCategory::Green },
    "late" => StatusDisplay { label: "Late", color: ColorCategory::Yellow },
    "excused" => StatusDisplay { label: "Excused", color: ColorCategory::Blue },
    _ => StatusDisplay { label: "Absent", color: ColorCategory::Red },
  }
}

// ─── AttendanceEntry ─────────────────────────────────────────────────────────

/// At most one entry exists per (student, subject, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
  pub student_id: Uuid,
  pub subject_id: Uuid,
  pub date:       NaiveDate,
  pub status:     AttendanceStatus,
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Entry counts grouped by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceTally {
  pub present: usize,
  pub absent:  usize,
  pub late:    usize,
  pub excused: usize,
}

impl AttendanceTally {
  pub fn from_entries<'a>(
    entries: impl IntoIterator<Item = &'a AttendanceEntry>,
  ) -> Self {
    let mut tally = Self::default();
    for entry in entries {
      tally.add(entry.status);
    }
    tally
  }

  pub fn add(&mut self, status: AttendanceStatus) {
    match status {
      AttendanceStatus::Present => self.present += 1,
      AttendanceStatus::Absent => self.absent += 1,
      AttendanceStatus::Late => self.late += 1,
      AttendanceStatus::Excused => self.excused += 1,
    }
  }

  pub fn total(&self) -> usize {
    self.present + self.absent + self.late + self.excused
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn late_is_labelled_late() {
    let display = classify("late");
    assert_eq!(display.label, "Late");
    assert_eq!(display.color, ColorCategory::Yellow);
  }

  #[test]
  fn unknown_falls_back_to_absent() {
    assert_eq!(classify("unknown-value"), classify("absent"));
    assert_eq!(classify(""), AttendanceStatus::Absent.display());
    // Matching is exact; the stored form is lowercase.
    assert_eq!(classify("Present").color, ColorCategory::Red);
  }

  #[test]
  fn every_status_has_a_distinct_color() {
    let colors: Vec<ColorCategory> =
      AttendanceStatus::iter().map(|s| s.display().color).collect();
    assert_eq!(colors, [
      ColorCategory::Green,
      ColorCategory::Red,
      ColorCategory::Yellow,
      ColorCategory::Blue,
    ]);
  }

  #[test]
  fn parse_rejects_unknown() {
    assert_eq!(AttendanceStatus::parse("excused").unwrap(), AttendanceStatus::Excused);
    assert!(matches!(
      AttendanceStatus::parse("tardy"),
      Err(Error::UnknownStatus(s)) if s == "tardy"
    ));
  }

  #[test]
  fn tally_counts_by_status() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let entries: Vec<AttendanceEntry> = [
      AttendanceStatus::Present,
      AttendanceStatus::Present,
      AttendanceStatus::Late,
      AttendanceStatus::Absent,
    ]
    .into_iter()
    .map(|status| AttendanceEntry {
      student_id: Uuid::new_v4(),
      subject_id: Uuid::nil(),
      date,
      status,
    })
    .collect();

    let tally = AttendanceTally::from_entries(&entries);
    assert_eq!(tally, AttendanceTally { present: 2, absent: 1, late: 1, excused: 0 });
    assert_eq!(tally.total(), 4);
  }
}
