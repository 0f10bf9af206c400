//! Grade aggregation.
//!
//! Raw grades are recorded per term on an inverted 1.0–5.0 scale where lower
//! is better and anything up to 3.0 passes. Cumulative grades are a cascading
//! running average: each term's cumulative value is the mean of the previous
//! cumulative value and the term's raw grade.
//!
//! A term with no recorded grade counts as `0.0`. That zero takes part in the
//! cascade like any other value, so ungraded later terms pull the cumulative
//! figures towards zero. This is the established grading behaviour and is
//! reproduced exactly; a stored `0.0` and a missing entry are indistinguishable.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Highest grade (inclusive) that still passes.
pub const PASSING_THRESHOLD: f64 = 3.0;

/// Accepted bounds for a recorded, non-zero raw grade.
pub const MIN_GRADE: f64 = 1.0;
pub const MAX_GRADE: f64 = 5.0;

// ─── Term ────────────────────────────────────────────────────────────────────

/// One of the four grading periods of a subject offering, in order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Term {
  Prelim,
  Midterm,
  Semifinal,
  Final,
}

impl Term {
  /// Parse the stored discriminant, mapping failures onto [`Error`].
  pub fn parse(s: &str) -> Result<Self> {
    Term::from_str(s).map_err(|_| Error::UnknownTerm(s.to_owned()))
  }

  /// Column heading used in reports ("Semi-Final" keeps its hyphen).
  pub fn heading(self) -> &'static str {
    match self {
      Term::Prelim => "Prelim",
      Term::Midterm => "Midterm",
      Term::Semifinal => "Semi-Final",
      Term::Final => "Final",
    }
  }
}

// ─── GradeEntry ──────────────────────────────────────────────────────────────

/// A single raw grade. At most one exists per (student, subject, term).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
  pub student_id: Uuid,
  pub subject_id: Uuid,
  pub term:       Term,
  pub grade:      f64,
}

// ─── TermGrades ──────────────────────────────────────────────────────────────

/// One value per term. Used for both raw and cumulative grades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TermGrades {
  pub prelim:    f64,
  pub midterm:   f64,
  pub semifinal: f64,
  pub r#final:   f64,
}

impl TermGrades {
  pub fn new(prelim: f64, midterm: f64, semifinal: f64, r#final: f64) -> Self {
    Self { prelim, midterm, semifinal, r#final }
  }

  pub fn get(&self, term: Term) -> f64 {
    match term {
      Term::Prelim => self.prelim,
      Term::Midterm => self.midterm,
      Term::Semifinal => self.semifinal,
      Term::Final => self.r#final,
    }
  }

  pub fn set(&mut self, term: Term, value: f64) {
    match term {
      Term::Prelim => self.prelim = value,
      Term::Midterm => self.midterm = value,
      Term::Semifinal => self.semifinal = value,
      Term::Final => self.r#final = value,
    }
  }

  /// Fold entries into a zero-filled raw record. Entries are not filtered by
  /// student or subject; callers pass the entries of one pairing. A later
  /// entry for the same term overwrites an earlier one.
  pub fn from_entries<'a>(
    entries: impl IntoIterator<Item = &'a GradeEntry>,
  ) -> Self {
    let mut raw = Self::default();
    for entry in entries {
      raw.set(entry.term, entry.grade);
    }
    raw
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Convert raw per-term grades into cumulative grades.
pub fn compute_cumulative(raw: &TermGrades) -> TermGrades {
  let prelim = raw.prelim;
  let midterm = (prelim + raw.midterm) / 2.0;
  let semifinal = (midterm + raw.semifinal) / 2.0;
  let r#final = (semifinal + raw.r#final) / 2.0;
  TermGrades { prelim, midterm, semifinal, r#final }
}

/// `0.0` means "not yet graded" and is never passing.
pub fn is_passing(grade: f64) -> bool {
  grade > 0.0 && grade <= PASSING_THRESHOLD
}

/// Reject grades that cannot have come from the grade sheet. `0.0` clears a
/// term and is accepted.
pub fn validate_raw_grade(grade: f64) -> Result<f64> {
  if grade == 0.0 || (grade.is_finite() && (MIN_GRADE..=MAX_GRADE).contains(&grade)) {
    Ok(grade)
  } else {
    Err(Error::GradeOutOfRange(grade))
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// The verdict derived from a cumulative final grade.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GradeStatus {
  Passed,
  Failed,
  Pending,
}

impl GradeStatus {
  pub fn from_final(final_grade: f64) -> Self {
    if final_grade == 0.0 {
      GradeStatus::Pending
    } else if is_passing(final_grade) {
      GradeStatus::Passed
    } else {
      GradeStatus::Failed
    }
  }

  /// Capitalised form shown in reports.
  pub fn label(self) -> &'static str {
    match self {
      GradeStatus::Passed => "Passed",
      GradeStatus::Failed => "Failed",
      GradeStatus::Pending => "Pending",
    }
  }
}

/// Raw grades, the cascade computed from them, and the resulting verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
  pub raw:        TermGrades,
  pub cumulative: TermGrades,
  pub status:     GradeStatus,
}

pub fn summarize(raw: TermGrades) -> GradeSummary {
  let cumulative = compute_cumulative(&raw);
  GradeSummary {
    raw,
    cumulative,
    status: GradeStatus::from_final(cumulative.r#final),
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  fn entry(term: Term, grade: f64) -> GradeEntry {
    GradeEntry {
      student_id: Uuid::nil(),
      subject_id: Uuid::nil(),
      term,
      grade,
    }
  }

  #[test]
  fn all_zero_is_pending() {
    let summary = summarize(TermGrades::default());
    assert_eq!(summary.cumulative, TermGrades::default());
    assert_eq!(summary.status, GradeStatus::Pending);
  }

  #[test]
  fn prelim_only_is_averaged_against_zero() {
    let cum = compute_cumulative(&TermGrades::new(2.0, 0.0, 0.0, 0.0));
    assert_eq!(cum, TermGrades::new(2.0, 1.0, 0.5, 0.25));
    assert_eq!(GradeStatus::from_final(cum.r#final), GradeStatus::Passed);
  }

  #[test]
  fn uniform_five_fails() {
    let summary = summarize(TermGrades::new(5.0, 5.0, 5.0, 5.0));
    assert_eq!(summary.cumulative, TermGrades::new(5.0, 5.0, 5.0, 5.0));
    assert_eq!(summary.status, GradeStatus::Failed);
  }

  #[test]
  fn three_is_passing_boundary() {
    let summary = summarize(TermGrades::new(3.0, 3.0, 3.0, 3.0));
    assert_eq!(summary.cumulative, TermGrades::new(3.0, 3.0, 3.0, 3.0));
    assert_eq!(summary.status, GradeStatus::Passed);
    assert!(!is_passing(3.01));
  }

  #[test]
  fn cascade_weights_later_terms_more() {
    let cum = compute_cumulative(&TermGrades::new(1.0, 2.0, 3.0, 4.0));
    assert_eq!(cum.midterm, 1.5);
    assert_eq!(cum.semifinal, 2.25);
    assert_eq!(cum.r#final, 3.125);
    assert_eq!(GradeStatus::from_final(cum.r#final), GradeStatus::Failed);
  }

  #[test]
  fn prelim_is_identity() {
    for prelim in [0.0, 1.0, 1.75, 2.5, 3.0, 4.2, 5.0] {
      let raw = TermGrades::new(prelim, 4.0, 1.0, 2.0);
      assert_eq!(compute_cumulative(&raw).prelim, prelim);
    }
  }

  #[test]
  fn zero_is_never_passing() {
    assert!(!is_passing(0.0));
    assert!(is_passing(0.25));
  }

  #[test]
  fn from_entries_zero_fills_and_last_wins() {
    let raw = TermGrades::from_entries(&[
      entry(Term::Midterm, 2.0),
      entry(Term::Prelim, 1.5),
      entry(Term::Midterm, 2.5),
    ]);
    assert_eq!(raw, TermGrades::new(1.5, 2.5, 0.0, 0.0));
  }

  #[test]
  fn validate_accepts_zero_and_scale() {
    assert!(validate_raw_grade(0.0).is_ok());
    assert!(validate_raw_grade(1.0).is_ok());
    assert!(validate_raw_grade(5.0).is_ok());
    assert!(matches!(validate_raw_grade(0.5), Err(Error::GradeOutOfRange(_))));
    assert!(matches!(validate_raw_grade(5.1), Err(Error::GradeOutOfRange(_))));
    assert!(validate_raw_grade(f64::NAN).is_err());
  }

  #[test]
  fn term_strings_match_storage_form() {
    let names: Vec<String> = Term::iter().map(|t| t.to_string()).collect();
    assert_eq!(names, ["prelim", "midterm", "semifinal", "final"]);
    assert_eq!(Term::parse("semifinal").unwrap(), Term::Semifinal);
    assert!(matches!(Term::parse("finals"), Err(Error::UnknownTerm(_))));
  }

  #[test]
  fn term_grades_serialize_final_without_prefix() {
    let json = serde_json::to_value(TermGrades::new(1.0, 2.0, 3.0, 4.0)).unwrap();
    assert_eq!(json["final"], 4.0);
  }
}
