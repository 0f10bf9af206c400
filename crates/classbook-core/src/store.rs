//! The `SchoolStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `classbook-store-sqlite`). The HTTP layer receives a store handle at
//! construction time and depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, Session},
  attendance::AttendanceEntry,
  grade::GradeEntry,
  school::{NewStudent, Student, StudentUpdate, Subject, SubjectInput},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Filters for [`SchoolStore::list_grades`]. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct GradeQuery {
  pub student_id:  Option<Uuid>,
  pub subject_id:  Option<Uuid>,
  /// Restrict to these subjects (membership filter). Ignored when empty.
  pub subject_ids: Vec<Uuid>,
}

/// Filters for [`SchoolStore::list_attendance`]. Results are ordered by date.
#[derive(Debug, Clone, Default)]
pub struct AttendanceQuery {
  pub student_id:  Option<Uuid>,
  pub subject_id:  Option<Uuid>,
  pub date:        Option<NaiveDate>,
  /// Restrict to these subjects (membership filter). Ignored when empty.
  pub subject_ids: Vec<Uuid>,
}

/// Row counts shown on the teacher dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
  pub subjects:           u64,
  pub students:           u64,
  pub attendance_records: u64,
  pub grade_records:      u64,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Broad classification of a backend failure, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// A uniqueness rule rejected the write (duplicate email, student number).
  Conflict,
  /// The write referenced a student or subject that does not exist.
  MissingReference,
  /// The input failed domain validation before reaching storage.
  Invalid,
  /// The addressed row does not exist.
  NotFound,
  Internal,
}

/// Implemented by every backend's error type so callers can react to the kind
/// of failure without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Classbook storage backend.
///
/// Grade and attendance rows are written with upserts keyed on their natural
/// composite key; concurrent writers are last-write-wins. Deleting a subject
/// or student removes the rows that hang off it.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SchoolStore: Send + Sync {
  type Error: StoreError;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn add_subject(
    &self,
    input: SubjectInput,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects, newest first.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Replace a subject's fields. Returns `None` if not found.
  fn update_subject(
    &self,
    id: Uuid,
    input: SubjectInput,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Delete a subject together with its grades and attendance, and drop it
  /// from every student's enrollment list. Returns `false` if not found.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Students ──────────────────────────────────────────────────────────

  /// Persist a student. Fails if the email or student number is taken.
  fn add_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// All students, newest first, optionally restricted to those enrolled in
  /// `subject_id`.
  fn list_students(
    &self,
    subject_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Replace a student's editable fields. The linked login, if any, takes the
  /// new email in the same transaction; an email already used by another
  /// login fails the whole update. Returns `None` if not found.
  fn update_student(
    &self,
    id: Uuid,
    update: StudentUpdate,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Set or clear the photo URL. Returns `None` if not found.
  fn set_student_photo(
    &self,
    id: Uuid,
    photo: Option<String>,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Delete a student, their grades and attendance, their account and any
  /// open sessions. Returns `false` if not found.
  fn delete_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Grades and attendance ─────────────────────────────────────────────

  /// Insert or replace grades keyed on (student, subject, term), atomically.
  fn upsert_grades(
    &self,
    entries: Vec<GradeEntry>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_grades<'a>(
    &'a self,
    query: &'a GradeQuery,
  ) -> impl Future<Output = Result<Vec<GradeEntry>, Self::Error>> + Send + 'a;

  /// Insert or replace attendance keyed on (student, subject, date),
  /// atomically.
  fn upsert_attendance(
    &self,
    entries: Vec<AttendanceEntry>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_attendance<'a>(
    &'a self,
    query: &'a AttendanceQuery,
  ) -> impl Future<Output = Result<Vec<AttendanceEntry>, Self::Error>> + Send + 'a;

  // ── Accounts and sessions ─────────────────────────────────────────────

  /// Persist an account. Fails if the email is taken.
  fn add_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn open_session(
    &self,
    account_id: Uuid,
    token_hash: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Look up the account owning a session opened at or after
  /// `issued_after`. Unknown and older tokens resolve to `None`.
  fn resolve_session<'a>(
    &'a self,
    token_hash: &'a str,
    issued_after: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Delete sessions opened before `cutoff`; returns how many were removed.
  fn prune_sessions(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn close_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Dashboard ─────────────────────────────────────────────────────────

  fn counts(
    &self,
  ) -> impl Future<Output = Result<Counts, Self::Error>> + Send + '_;
}
