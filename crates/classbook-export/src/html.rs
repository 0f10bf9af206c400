//! Printable HTML reports.
//!
//! Each report is a standalone document: subject details, one table, and a
//! generated-at footer. Generated with `quick-xml`'s writer so every piece of
//! text is escaped on the way out.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use classbook_core::{
  attendance::AttendanceEntry,
  grade::{GradeEntry, Term},
  school::{Student, Subject},
};
use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};
use strum::IntoEnumIterator as _;

use crate::{
  error::{Error, Result},
  sheet::{AttendanceSheet, GradeSheet},
};

const ATTENDANCE_STYLE: &str = "
body { font-family: Arial, sans-serif; margin: 20px; }
.header { text-align: center; margin-bottom: 30px; }
.subject-info { background: #f8f9fa; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; font-size: 12px; }
th { background-color: #f2f2f2; font-weight: bold; }
.present { background-color: #d4edda; }
.absent { background-color: #f8d7da; }
.late { background-color: #fff3cd; }
.excused { background-color: #d1ecf1; }
.footer { margin-top: 30px; text-align: center; font-size: 10px; color: #666; }
";

const GRADES_STYLE: &str = "
body { font-family: Arial, sans-serif; margin: 20px; }
.header { text-align: center; margin-bottom: 30px; }
.subject-info { background: #f8f9fa; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: center; font-size: 11px; }
th { background-color: #f2f2f2; font-weight: bold; }
.student-name { text-align: left; }
.passed { background-color: #d4edda; color: #155724; font-weight: bold; }
.failed { background-color: #f8d7da; color: #721c24; font-weight: bold; }
.pending { background-color: #e2e3e5; color: #383d41; }
.footer { margin-top: 30px; text-align: center; font-size: 10px; color: #666; }
";

// ─── Document writer ─────────────────────────────────────────────────────────

struct Doc {
  writer: Writer<Cursor<Vec<u8>>>,
}

fn html_err(e: impl std::fmt::Display) -> Error { Error::Html(e.to_string()) }

impl Doc {
  fn new() -> Self {
    Self {
      writer: Writer::new(Cursor::new(Vec::new())),
    }
  }

  fn start(&mut self, tag: &str) -> Result<()> {
    self
      .writer
      .write_event(Event::Start(BytesStart::new(tag)))
      .map_err(html_err)
  }

  fn start_class(&mut self, tag: &str, class: &str) -> Result<()> {
    let mut el = BytesStart::new(tag);
    el.push_attribute(("class", class));
    self.writer.write_event(Event::Start(el)).map_err(html_err)
  }

  fn end(&mut self, tag: &str) -> Result<()> {
    self
      .writer
      .write_event(Event::End(BytesEnd::new(tag)))
      .map_err(html_err)
  }

  fn text(&mut self, text: &str) -> Result<()> {
    self
      .writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(html_err)
  }

  fn text_elem(&mut self, tag: &str, text: &str) -> Result<()> {
    self.start(tag)?;
    self.text(text)?;
    self.end(tag)
  }

  fn text_elem_class(&mut self, tag: &str, class: &str, text: &str) -> Result<()> {
    self.start_class(tag, class)?;
    self.text(text)?;
    self.end(tag)
  }

  /// `<p><strong>{label}:</strong> {value}</p>`
  fn info_line(&mut self, label: &str, value: &str) -> Result<()> {
    self.start("p")?;
    self.text_elem("strong", &format!("{label}:"))?;
    self.text(&format!(" {value}"))?;
    self.end("p")
  }

  fn finish(self) -> Result<String> {
    Ok(String::from_utf8(self.writer.into_inner().into_inner())?)
  }
}

/// Everything up to and including `<body>` plus the subject banner.
fn open_report(
  doc: &mut Doc,
  title: &str,
  style: &str,
  subject: &Subject,
  student_count: usize,
) -> Result<()> {
  doc.start("html")?;
  doc.start("head")?;
  doc.text_elem("title", &format!("{title} - {}", subject.code))?;
  doc.text_elem("style", style)?;
  doc.end("head")?;
  doc.start("body")?;

  doc.start_class("div", "header")?;
  doc.text_elem("h1", title)?;
  doc.text_elem("h2", &format!("{} - {}", subject.code, subject.name))?;
  doc.end("div")?;

  doc.start_class("div", "subject-info")?;
  doc.info_line("Subject", &format!("{} ({})", subject.name, subject.code))?;
  doc.info_line("Semester", &subject.semester)?;
  doc.info_line("School Year", &subject.school_year)?;
  doc.info_line("Total Students", &student_count.to_string())?;
  doc.end("div")
}

fn close_report(doc: &mut Doc, generated_at: DateTime<Utc>) -> Result<()> {
  doc.start_class("div", "footer")?;
  doc.text_elem(
    "p",
    &format!(
      "Generated on {}",
      generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ),
  )?;
  doc.end("div")?;
  doc.end("body")?;
  doc.end("html")
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Attendance grid for enrolled students; each cell is classed by status
/// (`present`, `absent`, `late`, `excused`, or `missing`).
pub fn attendance_html(
  subject: &Subject,
  students: &[Student],
  entries: &[AttendanceEntry],
  generated_at: DateTime<Utc>,
) -> Result<String> {
  let sheet = AttendanceSheet::build(subject.subject_id, students, entries);
  let mut doc = Doc::new();

  open_report(&mut doc, "Attendance Report", ATTENDANCE_STYLE, subject, sheet.rows.len())?;

  doc.start("table")?;
  doc.start("thead")?;
  doc.start("tr")?;
  doc.text_elem("th", "Student ID")?;
  doc.text_elem("th", "Student Name")?;
  for date in &sheet.dates {
    doc.text_elem("th", &date.format("%Y-%m-%d").to_string())?;
  }
  doc.end("tr")?;
  doc.end("thead")?;

  doc.start("tbody")?;
  for row in &sheet.rows {
    doc.start("tr")?;
    doc.text_elem("td", &row.student_number)?;
    doc.text_elem("td", &row.full_name)?;
    for cell in &row.cells {
      match cell {
        Some(status) => {
          doc.text_elem_class("td", status.as_ref(), status.display().label)?
        }
        None => doc.text_elem_class("td", "missing", "N/A")?,
      }
    }
    doc.end("tr")?;
  }
  doc.end("tbody")?;
  doc.end("table")?;

  close_report(&mut doc, generated_at)?;
  doc.finish()
}

/// Grade table for enrolled students with raw and cumulative grades; the
/// status cell is classed `passed`, `failed` or `pending`.
pub fn grades_html(
  subject: &Subject,
  students: &[Student],
  entries: &[GradeEntry],
  generated_at: DateTime<Utc>,
) -> Result<String> {
  let sheet = GradeSheet::build(subject.subject_id, students, entries);
  let mut doc = Doc::new();

  open_report(&mut doc, "Grade Report", GRADES_STYLE, subject, sheet.rows.len())?;

  doc.start("table")?;
  doc.start("thead")?;
  doc.start("tr")?;
  doc.text_elem("th", "Student ID")?;
  doc.text_elem("th", "Student Name")?;
  for term in Term::iter() {
    doc.text_elem("th", &format!("{} Raw", term.heading()))?;
  }
  for term in Term::iter() {
    doc.text_elem("th", &format!("{} Cumulative", term.heading()))?;
  }
  doc.text_elem("th", "Status")?;
  doc.end("tr")?;
  doc.end("thead")?;

  doc.start("tbody")?;
  for row in &sheet.rows {
    let summary = &row.summary;
    doc.start("tr")?;
    doc.text_elem("td", &row.student_number)?;
    doc.text_elem_class("td", "student-name", &row.full_name)?;
    for term in Term::iter() {
      doc.text_elem("td", &summary.raw.get(term).to_string())?;
    }
    for term in Term::iter() {
      doc.text_elem("td", &format!("{:.2}", summary.cumulative.get(term)))?;
    }
    doc.text_elem_class("td", summary.status.as_ref(), summary.status.label())?;
    doc.end("tr")?;
  }
  doc.end("tbody")?;
  doc.end("table")?;

  close_report(&mut doc, generated_at)?;
  doc.finish()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;
  use classbook_core::attendance::AttendanceStatus;
  use uuid::Uuid;

  use super::*;
  use crate::sheet::fixtures::{day, student};

  fn subject() -> Subject {
    Subject {
      subject_id:  Uuid::new_v4(),
      code:        "CS101".into(),
      name:        "Data & Algorithms".into(),
      semester:    "1st".into(),
      school_year: "2024-2025".into(),
      created_at:  Utc::now(),
    }
  }

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 9, 30, 8, 0, 0).unwrap() }

  #[test]
  fn attendance_report_escapes_and_classes_cells() {
    let subject = subject();
    let a = student("1", "<b>Ana</b>", vec![subject.subject_id]);
    let b = student("2", "Ben", vec![subject.subject_id]);
    let entries = vec![AttendanceEntry {
      student_id: a.student_id,
      subject_id: subject.subject_id,
      date:       day(4),
      status:     AttendanceStatus::Late,
    }];

    let html = attendance_html(&subject, &[a, b], &entries, at()).unwrap();
    assert!(html.contains("<title>Attendance Report - CS101</title>"));
    assert!(html.contains("Data &amp; Algorithms"));
    assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
    assert!(!html.contains("<b>Ana"));
    assert!(html.contains("<th>2024-09-04</th>"));
    assert!(html.contains(r#"<td class="late">Late</td>"#));
    assert!(html.contains(r#"<td class="missing">N/A</td>"#));
    assert!(html.contains("Generated on 2024-09-30 08:00:00 UTC"));
  }

  #[test]
  fn grade_report_marks_verdicts() {
    let subject = subject();
    let a = student("1", "Ana", vec![subject.subject_id]);
    let b = student("2", "Ben", vec![subject.subject_id]);
    let c = student("3", "Cy", vec![]);
    let entries: Vec<GradeEntry> = Term::iter()
      .map(|term| GradeEntry {
        student_id: b.student_id,
        subject_id: subject.subject_id,
        term,
        grade: 5.0,
      })
      .collect();

    let html = grades_html(&subject, &[a, b, c], &entries, at()).unwrap();
    assert!(html.contains(r#"<td class="pending">Pending</td>"#));
    assert!(html.contains(r#"<td class="failed">Failed</td>"#));
    assert!(html.contains("<td>5.00</td>"));
    assert!(html.contains("Total Students:</strong> 2"));
    assert!(!html.contains("Cy"));
  }
}
