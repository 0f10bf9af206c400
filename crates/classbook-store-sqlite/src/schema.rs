//! SQL schema for the Classbook SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id   TEXT PRIMARY KEY,
    code         TEXT NOT NULL,
    name         TEXT NOT NULL,
    semester     TEXT NOT NULL DEFAULT '1st',
    school_year  TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    student_id      TEXT PRIMARY KEY,
    student_number  TEXT NOT NULL UNIQUE,
    full_name       TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    photo           TEXT,
    subjects        TEXT NOT NULL DEFAULT '[]',   -- JSON array of subject ids
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

-- One raw grade per (student, subject, term); written by upsert only.
CREATE TABLE IF NOT EXISTS grades (
    student_id  TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    term        TEXT NOT NULL,   -- 'prelim' | 'midterm' | 'semifinal' | 'final'
    grade       REAL NOT NULL,
    PRIMARY KEY (student_id, subject_id, term)
);

-- One status per (student, subject, date); written by upsert only.
CREATE TABLE IF NOT EXISTS attendance (
    student_id  TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    date        TEXT NOT NULL,   -- YYYY-MM-DD
    status      TEXT NOT NULL,   -- 'present' | 'absent' | 'late' | 'excused'
    PRIMARY KEY (student_id, subject_id, date)
);

CREATE TABLE IF NOT EXISTS accounts (
    account_id     TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    role           TEXT NOT NULL,   -- 'teacher' | 'student'
    student_id     TEXT REFERENCES students(student_id) ON DELETE CASCADE,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,   -- hex SHA-256 of the bearer token
    account_id  TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS grades_subject_idx     ON grades(subject_id);
CREATE INDEX IF NOT EXISTS attendance_subject_idx ON attendance(subject_id, date);
CREATE INDEX IF NOT EXISTS sessions_account_idx   ON sessions(account_id);

PRAGMA user_version = 1;
";
