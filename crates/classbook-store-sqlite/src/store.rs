//! [`SqliteStore`]: the SQLite implementation of [`SchoolStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use classbook_core::{
  account::{Account, NewAccount, Session},
  attendance::AttendanceEntry,
  grade::GradeEntry,
  school::{NewStudent, Student, StudentUpdate, Subject, SubjectInput},
  store::{AttendanceQuery, Counts, GradeQuery, SchoolStore},
};

use crate::{
  encode::{
    ACCOUNT_COLUMNS, RawAccount, RawAttendance, RawGrade, RawStudent,
    RawSubject, STUDENT_COLUMNS, SUBJECT_COLUMNS, encode_date, encode_dt, encode_subject_ids, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Dynamic filters ─────────────────────────────────────────────────────────

/// Accumulates `WHERE` conditions with positional text parameters.
#[derive(Default)]
struct Filter {
  conds:  Vec<String>,
  params: Vec<String>,
}

impl Filter {
  fn eq(&mut self, column: &str, value: Option<String>) {
    if let Some(v) = value {
      self.conds.push(format!("{column} = ?"));
      self.params.push(v);
    }
  }

  fn any_of(&mut self, column: &str, values: Vec<String>) {
    if values.is_empty() {
      return;
    }
    let marks = vec!["?"; values.len()].join(", ");
    self.conds.push(format!("{column} IN ({marks})"));
    self.params.extend(values);
  }

  fn where_clause(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }
}

/// True when every id in `subject_ids` names an existing subject.
fn subjects_exist(
  conn: &rusqlite::Connection,
  subject_ids: &[String],
) -> rusqlite::Result<bool> {
  let mut unique: Vec<&String> = subject_ids.iter().collect();
  unique.sort();
  unique.dedup();
  if unique.is_empty() {
    return Ok(true);
  }
  let marks = vec!["?"; unique.len()].join(", ");
  let found: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM subjects WHERE subject_id IN ({marks})"),
    rusqlite::params_from_iter(unique.iter()),
    |r| r.get(0),
  )?;
  Ok(found as usize == unique.len())
}

fn to_other(e: impl std::error::Error + Send + Sync + 'static) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Classbook store backed by a single SQLite file.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the underlying connection, flushing the WAL.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn student_by(&self, column: &'static str, value: String) -> Result<Option<Student>> {
    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {column} = ?1"),
            rusqlite::params![value],
            RawStudent::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }
}

// ─── SchoolStore impl ────────────────────────────────────────────────────────

impl SchoolStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: SubjectInput) -> Result<Subject> {
    input.validate()?;

    let subject = Subject {
      subject_id:  Uuid::new_v4(),
      code:        input.code.trim().to_owned(),
      name:        input.name.trim().to_owned(),
      semester:    input.semester,
      school_year: input.school_year,
      created_at:  Utc::now(),
    };

    let id_str   = encode_uuid(subject.subject_id);
    let at_str   = encode_dt(subject.created_at);
    let code     = subject.code.clone();
    let name     = subject.name.clone();
    let semester = subject.semester.clone();
    let year     = subject.school_year.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, code, name, semester, school_year, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, code, name, semester, year, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id_str],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn update_subject(
    &self,
    id:    Uuid,
    input: SubjectInput,
  ) -> Result<Option<Subject>> {
    input.validate()?;

    let id_str = encode_uuid(id);
    let code   = input.code.trim().to_owned();
    let name   = input.name.trim().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET code = ?2, name = ?3, semester = ?4, school_year = ?5
           WHERE subject_id = ?1",
          rusqlite::params![id_str, code, name, input.semester, input.school_year],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_subject(id).await
  }

  async fn delete_subject(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let now    = encode_dt(Utc::now());

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Drop the subject from every enrollment list that mentions it.
        let enrolled: Vec<(String, String)> = {
          let mut stmt = tx.prepare(
            "SELECT student_id, subjects FROM students WHERE subjects LIKE ?1",
          )?;
          stmt
            .query_map(rusqlite::params![format!("%{id_str}%")], |r| {
              Ok((r.get(0)?, r.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        for (student_id, subjects_json) in enrolled {
          let mut ids: Vec<Uuid> =
            serde_json::from_str(&subjects_json).map_err(to_other)?;
          ids.retain(|s| *s != id);
          let remaining = serde_json::to_string(&ids).map_err(to_other)?;
          tx.execute(
            "UPDATE students SET subjects = ?2, updated_at = ?3 WHERE student_id = ?1",
            rusqlite::params![student_id, remaining, now],
          )?;
        }

        // Grades and attendance go with it via ON DELETE CASCADE.
        let n = tx.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if deleted > 0 {
      tracing::debug!(subject_id = %id, "deleted subject");
    }
    Ok(deleted > 0)
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn add_student(&self, input: NewStudent) -> Result<Student> {
    input.validate()?;

    let now = Utc::now();
    let student = Student {
      student_id:     Uuid::new_v4(),
      student_number: input.student_number.trim().to_owned(),
      full_name:      input.full_name.trim().to_owned(),
      email:          input.email.trim().to_owned(),
      photo:          input.photo,
      subjects:       input.subjects,
      created_at:     now,
      updated_at:     now,
    };

    let id_str       = encode_uuid(student.student_id);
    let number       = student.student_number.clone();
    let name         = student.full_name.clone();
    let email        = student.email.clone();
    let photo        = student.photo.clone();
    let subjects_str = encode_subject_ids(&student.subjects)?;
    let subject_ids: Vec<String> =
      student.subjects.iter().copied().map(encode_uuid).collect();
    let at_str       = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        if !subjects_exist(conn, &subject_ids)? {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO students (
             student_id, student_number, full_name, email, photo,
             subjects, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, number, name, email, photo, subjects_str, at_str],
        )?;
        Ok(true)
      })
      .await
      .map_err(|e| Error::from_write(e, "student with this email or student number"))?;

    if !inserted {
      return Err(Error::MissingReference("enrolled subject".into()));
    }
    Ok(student)
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    self.student_by("student_id", encode_uuid(id)).await
  }

  async fn list_students(&self, subject_id: Option<Uuid>) -> Result<Vec<Student>> {
    let raws: Vec<RawStudent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut students: Vec<Student> = raws
      .into_iter()
      .map(RawStudent::into_student)
      .collect::<Result<_>>()?;

    if let Some(subject_id) = subject_id {
      students.retain(|s| s.is_enrolled(subject_id));
    }
    Ok(students)
  }

  async fn update_student(
    &self,
    id:     Uuid,
    update: StudentUpdate,
  ) -> Result<Option<Student>> {
    let id_str       = encode_uuid(id);
    let name         = update.full_name.trim().to_owned();
    let email        = update.email.trim().to_owned();
    let subjects_str = encode_subject_ids(&update.subjects)?;
    let subject_ids: Vec<String> =
      update.subjects.iter().copied().map(encode_uuid).collect();
    let at_str       = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !subjects_exist(&tx, &subject_ids)? {
          return Ok(None);
        }
        let n = tx.execute(
          "UPDATE students
           SET full_name = ?2, email = ?3, photo = ?4, subjects = ?5, updated_at = ?6
           WHERE student_id = ?1",
          rusqlite::params![id_str, name, email, update.photo, subjects_str, at_str],
        )?;
        // The login moves with the student; a taken email rolls back both.
        tx.execute(
          "UPDATE accounts SET email = ?2 WHERE student_id = ?1",
          rusqlite::params![id_str, email],
        )?;
        tx.commit()?;
        Ok(Some(n))
      })
      .await
      .map_err(|e| Error::from_write(e, "student or login with this email"))?;

    match changed {
      None => Err(Error::MissingReference("enrolled subject".into())),
      Some(0) => Ok(None),
      Some(_) => self.get_student(id).await,
    }
  }

  async fn set_student_photo(
    &self,
    id:    Uuid,
    photo: Option<String>,
  ) -> Result<Option<Student>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE students SET photo = ?2, updated_at = ?3 WHERE student_id = ?1",
          rusqlite::params![id_str, photo, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_student(id).await
  }

  async fn delete_student(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    // Grades, attendance, the account and its sessions cascade.
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM students WHERE student_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted > 0 {
      tracing::debug!(student_id = %id, "deleted student");
    }
    Ok(deleted > 0)
  }

  // ── Grades and attendance ─────────────────────────────────────────────────

  async fn upsert_grades(&self, entries: Vec<GradeEntry>) -> Result<()> {
    let rows: Vec<(String, String, String, f64)> = entries
      .iter()
      .map(|e| {
        (
          encode_uuid(e.student_id),
          encode_uuid(e.subject_id),
          e.term.as_ref().to_owned(),
          e.grade,
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO grades (student_id, subject_id, term, grade)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (student_id, subject_id, term)
             DO UPDATE SET grade = excluded.grade",
          )?;
          for (student_id, subject_id, term, grade) in &rows {
            stmt.execute(rusqlite::params![student_id, subject_id, term, grade])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|e| Error::from_write(e, "student or subject"))?;

    Ok(())
  }

  async fn list_grades(&self, query: &GradeQuery) -> Result<Vec<GradeEntry>> {
    let mut filter = Filter::default();
    filter.eq("student_id", query.student_id.map(encode_uuid));
    filter.eq("subject_id", query.subject_id.map(encode_uuid));
    filter.any_of(
      "subject_id",
      query.subject_ids.iter().copied().map(encode_uuid).collect(),
    );

    let raws: Vec<RawGrade> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT student_id, subject_id, term, grade FROM grades {}",
          filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(filter.params.iter()),
            RawGrade::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGrade::into_entry).collect()
  }

  async fn upsert_attendance(&self, entries: Vec<AttendanceEntry>) -> Result<()> {
    let rows: Vec<(String, String, String, String)> = entries
      .iter()
      .map(|e| {
        (
          encode_uuid(e.student_id),
          encode_uuid(e.subject_id),
          encode_date(e.date),
          e.status.as_ref().to_owned(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO attendance (student_id, subject_id, date, status)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (student_id, subject_id, date)
             DO UPDATE SET status = excluded.status",
          )?;
          for (student_id, subject_id, date, status) in &rows {
            stmt.execute(rusqlite::params![student_id, subject_id, date, status])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|e| Error::from_write(e, "student or subject"))?;

    Ok(())
  }

  async fn list_attendance(
    &self,
    query: &AttendanceQuery,
  ) -> Result<Vec<AttendanceEntry>> {
    let mut filter = Filter::default();
    filter.eq("student_id", query.student_id.map(encode_uuid));
    filter.eq("subject_id", query.subject_id.map(encode_uuid));
    filter.eq("date", query.date.map(encode_date));
    filter.any_of(
      "subject_id",
      query.subject_ids.iter().copied().map(encode_uuid).collect(),
    );

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT student_id, subject_id, date, status FROM attendance {}
           ORDER BY date, student_id",
          filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(filter.params.iter()),
            RawAttendance::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_entry).collect()
  }

  // ── Accounts and sessions ─────────────────────────────────────────────────

  async fn add_account(&self, input: NewAccount) -> Result<Account> {
    let account = Account {
      account_id:    Uuid::new_v4(),
      email:         input.email.trim().to_owned(),
      password_hash: input.password_hash,
      role:          input.role,
      student_id:    input.student_id,
      created_at:    Utc::now(),
    };

    let id_str      = encode_uuid(account.account_id);
    let email       = account.email.clone();
    let hash        = account.password_hash.clone();
    let role        = account.role.as_ref().to_owned();
    let student_str = account.student_id.map(encode_uuid);
    let at_str      = encode_dt(account.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (account_id, email, password_hash, role, student_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, email, hash, role, student_str, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| Error::from_write(e, "account with this email"))?;

    Ok(account)
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let email = email.trim().to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            rusqlite::params![email],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn open_session(&self, account_id: Uuid, token_hash: String) -> Result<Session> {
    let session = Session {
      token_hash,
      account_id,
      created_at: Utc::now(),
    };

    let hash    = session.token_hash.clone();
    let acct_id = encode_uuid(account_id);
    let at_str  = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, account_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![hash, acct_id, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| Error::from_write(e, "account"))?;

    Ok(session)
  }

  async fn resolve_session(
    &self,
    token_hash:   &str,
    issued_after: DateTime<Utc>,
  ) -> Result<Option<Account>> {
    let hash   = token_hash.to_owned();
    let cutoff = encode_dt(issued_after);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT a.account_id, a.email, a.password_hash, a.role, a.student_id, a.created_at
             FROM sessions s
             JOIN accounts a ON a.account_id = s.account_id
             WHERE s.token_hash = ?1 AND s.created_at >= ?2",
            rusqlite::params![hash, cutoff],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn prune_sessions(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    let cutoff = encode_dt(cutoff);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE created_at < ?1",
          rusqlite::params![cutoff],
        )?)
      })
      .await?;

    if removed > 0 {
      tracing::debug!(removed, "pruned expired sessions");
    }
    Ok(removed)
  }

  async fn close_session(&self, token_hash: &str) -> Result<()> {
    let hash = token_hash.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  async fn counts(&self) -> Result<Counts> {
    let counts = self
      .conn
      .call(|conn| {
        let count = |table: &str| -> rusqlite::Result<u64> {
          let n: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          Ok(n as u64)
        };
        Ok(Counts {
          subjects:           count("subjects")?,
          students:           count("students")?,
          attendance_records: count("attendance")?,
          grade_records:      count("grades")?,
        })
      })
      .await?;
    Ok(counts)
  }
}
